use std::{env, error::Error, fs, path::Path};

use dyna_grid::{
    algo::{DynaAgent, DynaConfig},
    exploration::ExplorationMethod,
    gym::{gridworld::Init, Gridworld},
};

const NUM_EPISODES: u32 = 100;
const PLANNING_BUDGET: usize = 10;
const GREEDY_STEP_LIMIT: u32 = 1000;

/// Usage: `dyna_maze [method] [episodes] [planning budget]`
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let exploration = match args.first() {
        Some(name) => ExplorationMethod::from_name(name)?,
        None => ExplorationMethod::default(),
    };
    let episodes = match args.get(1) {
        Some(n) => n.parse()?,
        None => NUM_EPISODES,
    };
    let planning = match args.get(2) {
        Some(n) => n.parse()?,
        None => PLANNING_BUDGET,
    };

    let path = Path::new("demos/dyna_maze");
    let env = Gridworld::from_files(
        path.join("input_grid.txt"),
        path.join("grid_rules.config"),
    )?;

    let config = DynaConfig {
        exploration,
        epsilon: 0.1,
        decay_episodes: episodes.max(1),
        alfa: 0.5,
        end_alfa: 0.1,
        decay_alfa_episodes: episodes.max(1),
        ..Default::default()
    };
    let mut agent = DynaAgent::new(env, config)?;

    log::info!("training for {episodes} episodes with {exploration} and {planning} planning updates per step");
    let reports = agent.train(episodes, Init::Default, planning)?;

    fs::create_dir_all(path.join("out"))?;
    let mut wtr = csv::Writer::from_path(path.join("out/data.csv"))?;
    wtr.write_record(["episode", "steps", "reward"])?;
    for (i, report) in reports.iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            report.steps.to_string(),
            report.reward.to_string(),
        ])?;
    }
    wtr.flush()?;

    let greedy = agent.greedy_rollout(Init::Default, GREEDY_STEP_LIMIT)?;
    log::info!(
        "greedy policy reaches the goal in {} steps (reward {})",
        greedy.steps,
        greedy.reward
    );

    Ok(())
}
