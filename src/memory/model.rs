use std::collections::HashMap;

use crate::env::Environment;

use super::Exp;

/// The most recent outcome observed for a state-action pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outcome<S> {
    pub reward: f32,
    pub next_state: S,
}

/// A learned, deterministic model of the environment
///
/// Each experienced `(state, action)` pair maps to the last outcome observed for it.
// TODO: keep a bounded history of outcomes per pair and sample from it, so planning
// works against stochastic environments
pub struct WorldModel<E: Environment> {
    outcomes: HashMap<(E::State, E::Action), Outcome<E::State>>,
}

impl<E: Environment> WorldModel<E> {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
        }
    }

    /// Record an experience, overwriting any earlier outcome for the same pair
    pub fn update(&mut self, exp: &Exp<E>) {
        self.outcomes.insert(
            (exp.state, exp.action),
            Outcome {
                reward: exp.reward,
                next_state: exp.next_state,
            },
        );
    }

    /// Replay the recorded outcome of `(state, action)`
    pub fn get(&self, state: E::State, action: E::Action) -> Option<Outcome<E::State>> {
        self.outcomes.get(&(state, action)).copied()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl<E: Environment> Default for WorldModel<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        env::tests::MockEnv,
        memory::{Exp, WorldModel},
    };

    use super::Outcome;

    #[test]
    fn last_write_wins() {
        let mut model = WorldModel::<MockEnv>::new();
        assert!(model.is_empty());
        assert_eq!(model.get(0, 1), None, "Unseen pair");

        model.update(&Exp {
            state: 0,
            action: 1,
            next_state: 1,
            reward: -1.0,
        });
        model.update(&Exp {
            state: 0,
            action: 1,
            next_state: 3,
            reward: 5.0,
        });

        assert_eq!(model.len(), 1, "One entry per pair");
        assert_eq!(
            model.get(0, 1),
            Some(Outcome {
                reward: 5.0,
                next_state: 3
            })
        );
    }
}
