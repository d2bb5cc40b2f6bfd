use std::collections::HashMap;

use crate::{env::Environment, memory::Exp, Error, Result};

/// A table of action values, defined exactly for the states that have actions
///
/// Each state holds its actions in the order the environment reports them, so
/// iteration (and therefore seeded tie-breaking) is deterministic.
pub struct QTable<E: Environment> {
    table: HashMap<E::State, Vec<(E::Action, f32)>>,
}

impl<E: Environment> QTable<E> {
    /// Build a zero-initialized table covering every state-action pair of `env`
    pub fn new(env: &E) -> Self {
        let table = env
            .states()
            .into_iter()
            .filter_map(|state| {
                let actions = env.actions(state);
                (!actions.is_empty())
                    .then(|| (state, actions.into_iter().map(|a| (a, 0.0)).collect()))
            })
            .collect();
        Self { table }
    }

    /// The value of `(state, action)`, if the pair exists
    pub fn value(&self, state: E::State, action: E::Action) -> Option<f32> {
        self.values(state)
            .iter()
            .find(|(a, _)| *a == action)
            .map(|&(_, q)| q)
    }

    /// All `(action, value)` pairs of `state`, empty for states without actions
    pub fn values(&self, state: E::State) -> &[(E::Action, f32)] {
        self.table
            .get(&state)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The largest action value of `state`, or `None` if it has no actions
    pub fn max_value(&self, state: E::State) -> Option<f32> {
        self.values(state)
            .iter()
            .map(|&(_, q)| q)
            .reduce(f32::max)
    }

    /// Every action of `state` whose value ties for the maximum
    pub fn greedy_actions(&self, state: E::State) -> Vec<E::Action> {
        let Some(max) = self.max_value(state) else {
            return Vec::new();
        };
        self.values(state)
            .iter()
            .filter(|&&(_, q)| q == max)
            .map(|&(a, _)| a)
            .collect()
    }

    /// Apply the one-step Q-learning update for an experience
    ///
    /// Q(s,a) ← Q(s,a) + α(r + γ max<sub>a'</sub> Q(s',a') - Q(s,a))
    ///
    /// The bootstrap term is 0 when `s'` has no actions.
    ///
    /// **Returns** the TD error
    pub fn update(&mut self, exp: &Exp<E>, alfa: f32, gamma: f32) -> Result<f32> {
        let bootstrap = self.max_value(exp.next_state).unwrap_or(0.0);
        let q = self
            .table
            .get_mut(&exp.state)
            .and_then(|values| values.iter_mut().find(|(a, _)| *a == exp.action))
            .map(|(_, q)| q)
            .ok_or_else(|| {
                Error::Action(format!(
                    "no value for {:?} in state {:?}",
                    exp.action, exp.state
                ))
            })?;

        let td_error = exp.reward + gamma * bootstrap - *q;
        *q += alfa * td_error;
        Ok(td_error)
    }

    /// Number of states with values
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate over every `(state, action, value)` triple
    pub fn iter(&self) -> impl Iterator<Item = (E::State, E::Action, f32)> + '_ {
        self.table
            .iter()
            .flat_map(|(&s, values)| values.iter().map(move |&(a, q)| (s, a, q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::tests::MockEnv,
        gym::gridworld::{fixtures::gridworld, Action},
    };

    fn exp(state: i32, action: i32, next_state: i32, reward: f32) -> Exp<MockEnv> {
        Exp {
            state,
            action,
            next_state,
            reward,
        }
    }

    #[test]
    fn initialized_for_states_with_actions() {
        let env = gridworld();
        let table = QTable::new(&env);
        assert_eq!(table.len(), 21, "Walkable states only");
        assert_eq!(table.iter().count(), 84, "Four actions each");
        assert!(table.iter().all(|(_, _, q)| q == 0.0), "Zero-initialized");
        assert!(table.values((2, 4)).is_empty(), "No values for the goal");
        assert!(table.values((1, 3)).is_empty(), "No values for obstacles");
        assert_eq!(table.value((3, 0), Action::Up), Some(0.0));
    }

    #[test]
    fn update_no_op_when_alfa_zero() {
        let mut table = QTable::new(&MockEnv::new());
        let td = table.update(&exp(1, 1, 2, -1.0), 0.0, 0.9).unwrap();
        assert_eq!(td, -1.0, "TD error is still reported");
        assert_eq!(table.value(1, 1), Some(0.0), "Value unchanged");
    }

    #[test]
    fn update_rule() {
        let mut table = QTable::new(&MockEnv::new());
        table.update(&exp(2, 1, 3, 4.0), 1.0, 1.0).unwrap();
        assert_eq!(table.value(2, 1), Some(4.0));

        // bootstraps from the best action of the next state
        table.update(&exp(1, 1, 2, -1.0), 0.5, 0.5).unwrap();
        assert_eq!(table.value(1, 1), Some(0.5 * (-1.0 + 0.5 * 4.0)));

        // terminal next state contributes nothing
        table.update(&exp(3, 1, MockEnv::GOAL, 2.0), 0.5, 0.9).unwrap();
        assert_eq!(table.value(3, 1), Some(1.0));
    }

    #[test]
    fn update_unknown_pair() {
        let mut table = QTable::new(&MockEnv::new());
        assert!(matches!(
            table.update(&exp(MockEnv::GOAL, 1, 0, 0.0), 0.1, 0.9),
            Err(Error::Action(_))
        ));
        assert!(matches!(
            table.update(&exp(0, 7, 0, 0.0), 0.1, 0.9),
            Err(Error::Action(_))
        ));
    }

    #[test]
    fn converges_with_fixed_bootstrap() {
        let mut table = QTable::new(&MockEnv::new());
        // the other actions of the next state stay at 0, so the bootstrap is fixed
        for _ in 0..500 {
            table.update(&exp(1, -1, 0, -2.0), 0.5, 0.9).unwrap();
        }
        assert!((table.value(1, -1).unwrap() + 2.0).abs() < 1e-4);
    }

    #[test]
    fn converges_on_self_loop() {
        let mut table = QTable::new(&MockEnv::new());
        // bootstrapping from itself every time: r / (1 - γ)
        for _ in 0..500 {
            table.update(&exp(0, -1, 0, 1.0), 0.5, 0.9).unwrap();
        }
        assert!((table.value(0, -1).unwrap() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn greedy_actions_ties() {
        let mut table = QTable::new(&MockEnv::new());
        assert_eq!(table.greedy_actions(0), [-1, 1], "All tied at start");
        table.update(&exp(0, 1, 1, 1.0), 1.0, 0.0).unwrap();
        assert_eq!(table.greedy_actions(0), [1]);
        assert_eq!(table.max_value(0), Some(1.0));
        assert!(table.greedy_actions(MockEnv::GOAL).is_empty());
    }
}
