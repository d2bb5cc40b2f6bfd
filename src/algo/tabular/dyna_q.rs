use std::str::FromStr;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    decay::{self, Decay},
    ensure_interval,
    env::Environment,
    exploration::{EpsilonGreedy, ExplorationMethod, Explorer, UCB},
    memory::{Exp, Outcome, SeenSet, WorldModel},
    Error, Result,
};

use super::q_table::QTable;

/// Configuration for the [`DynaAgent`]
#[derive(Debug, Clone, PartialEq)]
pub struct DynaConfig {
    /// Action selection strategy
    ///
    /// **Default**: [`ExplorationMethod::EpsilonGreedy`]
    pub exploration: ExplorationMethod,
    /// Exploration threshold, the starting value when decaying
    ///
    /// **Default**: `0.1`
    pub epsilon: f32,
    /// Completed episodes until a decaying epsilon reaches 0
    ///
    /// **Default**: `100`
    pub decay_episodes: u32,
    /// Exploration parameter of the UCB policy
    ///
    /// **Default**: `1.0`
    pub ucb_c: f32,
    /// Initial learning rate
    ///
    /// **Default**: `0.1`
    pub alfa: f32,
    /// Learning rate reached after `decay_alfa_episodes` completed episodes
    ///
    /// **Default**: `0.1`
    pub end_alfa: f32,
    /// Completed episodes until alfa reaches `end_alfa`
    ///
    /// **Default**: `100`
    pub decay_alfa_episodes: u32,
    /// Discount factor
    ///
    /// **Default**: `1.0`
    pub gamma: f32,
    /// Seed for every random draw the agent makes
    ///
    /// **Default**: `0`
    pub seed: u64,
}

impl Default for DynaConfig {
    fn default() -> Self {
        Self {
            exploration: ExplorationMethod::EpsilonGreedy,
            epsilon: 0.1,
            decay_episodes: 100,
            ucb_c: 1.0,
            alfa: 0.1,
            end_alfa: 0.1,
            decay_alfa_episodes: 100,
            gamma: 1.0,
            seed: 0,
        }
    }
}

/// Where the agent is in its round lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No round is running
    #[default]
    Idle,
    /// A round has been initialized and the goal is not reached yet
    RoundActive,
    /// The last round reached the goal
    RoundComplete,
}

/// Summary of a played episode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeReport {
    pub steps: u32,
    pub reward: f32,
}

/// A tabular Dyna-Q agent
///
/// Every real step updates the [`QTable`] directly, records the outcome in a learned
/// [`WorldModel`], and then replays a number of previously seen state-action pairs
/// against that model, applying the same update to each.
///
/// ### Generics
/// - `E` - The [`Environment`] the agent owns and learns in
pub struct DynaAgent<E: Environment> {
    env: E,
    config: DynaConfig,
    q_table: QTable<E>,
    model: WorldModel<E>,
    seen: SeenSet<E>,
    explorer: Explorer<E>,
    alfa_decay: decay::Linear,
    alfa: f32,
    rng: StdRng,
    state: Option<E::State>,
    phase: Phase,
    episode: u32,
    episodes_completed: u32,
    steps: u32,
    reward: f32,
}

impl<E: Environment> DynaAgent<E> {
    /// Initialize a new `DynaAgent` in a given environment
    ///
    /// Fails with [`Error::Config`] if
    /// - `epsilon`, `alfa`, or `gamma` is not in the interval `[0,1]`
    /// - `alfa >= end_alfa >= 0` does not hold
    /// - `ucb_c` is negative
    /// - a decay horizon is zero
    pub fn new(env: E, config: DynaConfig) -> Result<Self> {
        ensure_interval!(config.epsilon, 0.0, 1.0);
        ensure_interval!(config.alfa, 0.0, 1.0);
        ensure_interval!(config.gamma, 0.0, 1.0);
        if !(config.alfa >= config.end_alfa && config.end_alfa >= 0.0) {
            return Err(Error::Config(format!(
                "learning rate must satisfy `alfa >= end_alfa >= 0`, got alfa = {}, end_alfa = {}",
                config.alfa, config.end_alfa
            )));
        }
        if !(config.ucb_c >= 0.0) {
            return Err(Error::Config(format!(
                "`ucb_c` must not be negative, got {}",
                config.ucb_c
            )));
        }

        let alfa_decay = decay::Linear::new(
            config.alfa,
            config.end_alfa,
            config.decay_alfa_episodes as f32,
        )?;
        let explorer = match config.exploration {
            ExplorationMethod::EpsilonGreedy => {
                Explorer::EpsilonGreedy(EpsilonGreedy::new(decay::Constant::new(config.epsilon)))
            }
            ExplorationMethod::DecayingEpsilon => Explorer::DecayingEpsilon(EpsilonGreedy::new(
                decay::Linear::new(config.epsilon, 0.0, config.decay_episodes as f32)?,
            )),
            ExplorationMethod::Ucb => Explorer::Ucb(UCB::new(config.ucb_c)),
        };

        Ok(Self {
            q_table: QTable::new(&env),
            model: WorldModel::new(),
            seen: SeenSet::new(),
            explorer,
            alfa_decay,
            alfa: config.alfa,
            rng: StdRng::seed_from_u64(config.seed),
            state: None,
            phase: Phase::Idle,
            episode: 0,
            episodes_completed: 0,
            steps: 0,
            reward: 0.0,
            env,
            config,
        })
    }

    /// Rebuild the agent from its configuration, discarding everything it has learned
    pub fn reset(self) -> Result<Self> {
        Self::new(self.env, self.config)
    }

    /// Start a new round from the given initial condition
    ///
    /// **Returns** the initial state
    pub fn init_round(&mut self, init: E::Init) -> Result<E::State> {
        let state = self.env.initialize(init, &mut self.rng)?;

        self.episode += 1;
        self.steps = 0;
        self.reward = 0.0;
        self.state = Some(state);
        self.phase = if self.env.is_terminal(state) {
            Phase::RoundComplete
        } else {
            Phase::RoundActive
        };
        Ok(state)
    }

    /// Start a new round from a textual initial condition such as `"default"`
    pub fn init_round_str(&mut self, init: &str) -> Result<E::State>
    where
        E::Init: FromStr<Err = Error>,
    {
        self.init_round(init.parse()?)
    }

    /// Play one real step followed by `planning_budget` simulated updates
    ///
    /// Fails with [`Error::State`] if no round is active.
    ///
    /// **Returns** the real experience
    pub fn play_step(&mut self, planning_budget: usize) -> Result<Exp<E>> {
        self.advance(planning_budget, false)
    }

    /// A real step, choosing the action either through the explorer or purely greedily
    fn advance(&mut self, planning_budget: usize, greedy: bool) -> Result<Exp<E>> {
        let state = match (self.phase, self.state) {
            (Phase::RoundActive, Some(state)) => state,
            _ => {
                return Err(Error::State(format!(
                    "no active round (phase {:?})",
                    self.phase
                )))
            }
        };

        let action = if greedy {
            *self
                .q_table
                .greedy_actions(state)
                .choose(&mut self.rng)
                .ok_or_else(|| Error::Action(format!("no actions available in state {state:?}")))?
        } else {
            self.explorer
                .select(state, &self.q_table, self.episodes_completed, &mut self.rng)?
        };
        let (reward, next_state) = self.env.step(action)?;
        self.seen.insert(state, action);
        log::trace!("{state:?} --{action:?}--> {next_state:?} ({reward})");

        let exp = Exp {
            state,
            action,
            next_state,
            reward,
        };
        self.q_table.update(&exp, self.alfa, self.config.gamma)?;
        self.model.update(&exp);
        self.state = self.env.state();

        self.plan(planning_budget)?;

        self.steps += 1;
        self.reward += reward;
        if self.env.is_terminal(next_state) {
            self.complete_round();
        }

        Ok(exp)
    }

    /// Apply `n` updates to experienced state-action pairs drawn from the world model
    ///
    /// Does nothing until at least one real step has been taken.
    pub fn plan(&mut self, n: usize) -> Result<()> {
        if self.seen.is_empty() {
            if n > 0 {
                log::trace!("skipping {n} planning updates, nothing experienced yet");
            }
            return Ok(());
        }

        for _ in 0..n {
            let Some((state, action)) = self.seen.sample(&mut self.rng) else {
                break;
            };
            let Outcome { reward, next_state } =
                self.model.get(state, action).ok_or_else(|| {
                    Error::Action(format!("no model of {action:?} in state {state:?}"))
                })?;
            let exp = Exp {
                state,
                action,
                next_state,
                reward,
            };
            self.q_table.update(&exp, self.alfa, self.config.gamma)?;
        }

        Ok(())
    }

    fn complete_round(&mut self) {
        self.episodes_completed += 1;
        self.phase = Phase::RoundComplete;
        self.alfa = self.alfa_decay.evaluate(self.episodes_completed as f32);

        log::info!(
            "episode {} finished in {} steps (reward {})",
            self.episode,
            self.steps,
            self.reward
        );
        log::debug!("alfa = {}, epsilon = {:?}", self.alfa, self.epsilon());
    }

    /// Whether the current state is terminal
    pub fn finished(&self) -> bool {
        self.state.is_some_and(|state| self.env.is_terminal(state))
    }

    /// Play a full round from `init`
    pub fn run_episode(&mut self, init: E::Init, planning_budget: usize) -> Result<EpisodeReport> {
        self.init_round(init)?;
        while !self.finished() {
            self.play_step(planning_budget)?;
        }
        Ok(EpisodeReport {
            steps: self.steps,
            reward: self.reward,
        })
    }

    /// Play `episodes` full rounds, each starting from `init`
    pub fn train(
        &mut self,
        episodes: u32,
        init: E::Init,
        planning_budget: usize,
    ) -> Result<Vec<EpisodeReport>> {
        (0..episodes)
            .map(|_| self.run_episode(init.clone(), planning_budget))
            .collect()
    }

    /// Play a round from `init` that always exploits, with planning disabled
    ///
    /// Real steps still update the values and the model, so an action that bumps into a
    /// wall loses value and the walk cannot stay stuck on it. Ties are broken at random.
    /// Fails with [`Error::State`] if the goal is not reached within `step_limit` steps.
    pub fn greedy_rollout(&mut self, init: E::Init, step_limit: u32) -> Result<EpisodeReport> {
        self.init_round(init)?;
        while !self.finished() {
            if self.steps >= step_limit {
                return Err(Error::State(format!(
                    "goal not reached within {step_limit} greedy steps, last at {:?}",
                    self.state
                )));
            }
            self.advance(0, true)?;
        }
        Ok(EpisodeReport {
            steps: self.steps,
            reward: self.reward,
        })
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn config(&self) -> &DynaConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable<E> {
        &self.q_table
    }

    pub fn model(&self) -> &WorldModel<E> {
        &self.model
    }

    pub fn seen(&self) -> &SeenSet<E> {
        &self.seen
    }

    /// The current exploration threshold, `None` under UCB
    pub fn epsilon(&self) -> Option<f32> {
        self.explorer.epsilon(self.episodes_completed)
    }

    /// The current learning rate
    pub fn alfa(&self) -> f32 {
        self.alfa
    }

    /// Rounds started
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Rounds that reached the goal
    pub fn episodes_completed(&self) -> u32 {
        self.episodes_completed
    }

    /// Steps taken in the current round
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The agent's view of the current state
    pub fn state(&self) -> Option<E::State> {
        self.state
    }
}
