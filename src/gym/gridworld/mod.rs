use std::{fs, path::Path, str::FromStr};

use rand::Rng;

use crate::{env::Environment, Error, Result};

mod grid;
mod rules;
mod transitions;

pub use grid::{Cell, Grid, Pos};
pub use rules::{Action, Rules};
pub use transitions::{Transition, TransitionTable};

/// How to pick the first state of an episode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Init {
    /// The grid's `S` cell
    Default,
    /// A uniformly random empty or start cell
    Random,
    /// An explicit empty or start cell
    State(Pos),
}

impl FromStr for Init {
    type Err = Error;

    /// Parses `default`, `random`, or `<row>,<col>`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "default" => Ok(Init::Default),
            "random" => Ok(Init::Random),
            coords if coords.contains(',') => {
                let malformed = || Error::State(format!("malformed state {coords:?}"));
                let (row, col) = coords.split_once(',').ok_or_else(malformed)?;
                let row = row.trim().parse().map_err(|_| malformed())?;
                let col = col.trim().parse().map_err(|_| malformed())?;
                Ok(Init::State((row, col)))
            }
            "" => Err(Error::Config(String::from(
                "no initialization mode or state given",
            ))),
            other => Err(Error::Config(format!(
                "unrecognized initialization mode {other:?}"
            ))),
        }
    }
}

/// A deterministic gridworld with four-directional movement
///
/// Dynamics are precomputed into a [`TransitionTable`] on construction. The current
/// position can only change through [`initialize`](Environment::initialize) and
/// [`step`](Environment::step).
#[derive(Clone, Debug)]
pub struct Gridworld {
    grid: Grid,
    rules: Rules,
    transitions: TransitionTable,
    pos: Option<Pos>,
}

impl Gridworld {
    pub fn new(grid: Grid, rules: Rules) -> Self {
        let transitions = TransitionTable::build(&grid, &rules);
        Self {
            grid,
            rules,
            transitions,
            pos: None,
        }
    }

    /// Load a grid file and a rules file
    pub fn from_files(grid_path: impl AsRef<Path>, rules_path: impl AsRef<Path>) -> Result<Self> {
        let grid = fs::read_to_string(grid_path)?.parse::<Grid>()?;
        let rules = Rules::parse(&fs::read_to_string(rules_path)?, &grid)?;
        Ok(Self::new(grid, rules))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// The current position, if initialized
    pub fn current_state(&self) -> Option<Pos> {
        self.pos
    }

    /// The cell under the current position, if initialized
    pub fn current_cell(&self) -> Option<Cell> {
        self.pos.map(|pos| self.grid[pos])
    }

    fn validate_start(&self, pos: Pos) -> Result<Pos> {
        match self.grid.get(pos) {
            Some(cell) if cell.is_walkable() => Ok(pos),
            Some(cell) => Err(Error::State(format!(
                "cannot start on {cell:?} cell at {pos:?}"
            ))),
            None => Err(Error::State(format!("{pos:?} is not within the grid"))),
        }
    }
}

impl Environment for Gridworld {
    type State = Pos;
    type Action = Action;
    type Init = Init;

    fn initialize<R: Rng + ?Sized>(&mut self, init: Init, rng: &mut R) -> Result<Pos> {
        let pos = match init {
            Init::Default => self.grid.start(),
            // terminates because a validated grid always has its start cell
            Init::Random => loop {
                let pos = (
                    rng.gen_range(0..self.grid.rows()),
                    rng.gen_range(0..self.grid.cols()),
                );
                if self.grid[pos].is_walkable() {
                    break pos;
                }
            },
            Init::State(pos) => self.validate_start(pos).inspect_err(|e| log::warn!("{e}"))?,
        };

        log::debug!("initialized at {pos:?} ({init:?})");
        self.pos = Some(pos);
        Ok(pos)
    }

    fn states(&self) -> Vec<Pos> {
        self.grid.positions().collect()
    }

    fn actions(&self, state: Pos) -> Vec<Action> {
        self.transitions.actions(state)
    }

    fn state(&self) -> Option<Pos> {
        self.pos
    }

    fn is_terminal(&self, state: Pos) -> bool {
        self.grid.get(state) == Some(Cell::Goal)
    }

    fn step(&mut self, action: Action) -> Result<(f32, Pos)> {
        let pos = self
            .pos
            .ok_or_else(|| Error::State(String::from("environment has not been initialized")))?;

        let Some(Transition { next_state, reward }) = self.transitions.get(pos, action) else {
            let err = Error::Action(format!("{action} is not valid for state {pos:?}"));
            log::warn!("{err}");
            return Err(err);
        };

        self.pos = Some(next_state);
        Ok((reward, next_state))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const GRID: &str = "\
-----------
|.|.|.|.|.|
|.|.|.|X|.|
|.|.|X|.|G|
|S|.|X|.|.|
|.|.|.|.|.|
-----------
";

    pub const RULES: &str = "\
# Movement
[ACTIONS]
L
R
U
D

[REWARDS]
DEFAULT = -1   # every move costs
1,4-D = 0
2,3-R = 0
3,4-U = 0

[TRANSITIONS]
";

    pub fn gridworld() -> Gridworld {
        let grid: Grid = GRID.parse().unwrap();
        let rules = Rules::parse(RULES, &grid).unwrap();
        Gridworld::new(grid, rules)
    }
}
