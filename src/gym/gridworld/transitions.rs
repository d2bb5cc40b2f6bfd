use strum::VariantArray;

use super::{Action, Cell, Grid, Pos, Rules};

/// The deterministic outcome of taking an action in a state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub next_state: Pos,
    pub reward: f32,
}

/// Precomputed dynamics for every walkable cell and configured action
///
/// Entries are stored densely, one slot per `(cell, action)`, indexed by the row-major
/// cell index and the action discriminant. Goal and obstacle cells have no entries.
#[derive(Clone, Debug)]
pub struct TransitionTable {
    slots: Vec<[Option<Transition>; Action::COUNT]>,
    cols: usize,
}

impl TransitionTable {
    pub fn build(grid: &Grid, rules: &Rules) -> Self {
        let mut slots = vec![[None; Action::COUNT]; grid.rows() * grid.cols()];

        for pos in grid.positions().filter(|&pos| grid[pos].is_walkable()) {
            let cell_slots = &mut slots[grid.index_of(pos)];
            for &action in rules.actions() {
                let reward = rules.reward(pos, action) as f32;
                let neighbour = action.apply(pos).and_then(|next| Some((next, grid.get(next)?)));
                let next_state = match neighbour {
                    Some((next, Cell::Empty | Cell::Start | Cell::Goal)) => next,
                    // blocked or off-grid: stay put
                    Some((_, Cell::Obstacle)) | None => pos,
                };
                cell_slots[action as usize] = Some(Transition { next_state, reward });
            }
        }

        Self {
            slots,
            cols: grid.cols(),
        }
    }

    /// The precomputed transition for `(pos, action)`, if the pair is legal
    pub fn get(&self, (row, col): Pos, action: Action) -> Option<Transition> {
        if col >= self.cols {
            return None;
        }
        let index = row.checked_mul(self.cols)?.checked_add(col)?;
        self.slots.get(index)?[action as usize]
    }

    /// Legal actions from `pos`, in canonical order
    pub fn actions(&self, pos: Pos) -> Vec<Action> {
        Action::VARIANTS
            .iter()
            .copied()
            .filter(|&action| self.get(pos, action).is_some())
            .collect()
    }

    /// Number of `(state, action)` entries
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().filter(|t| t.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
