use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};

use crate::env::Environment;

/// The set of state-action pairs the agent has actually experienced
///
/// States and their actions are kept in first-seen order so that sampling from a
/// seeded RNG is reproducible.
pub struct SeenSet<E: Environment> {
    entries: Vec<(E::State, Vec<E::Action>)>,
    index: HashMap<E::State, usize>,
}

impl<E: Environment> SeenSet<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Mark `(state, action)` as experienced
    ///
    /// **Returns** `true` if the pair was not seen before
    pub fn insert(&mut self, state: E::State, action: E::Action) -> bool {
        let i = *self.index.entry(state).or_insert_with(|| {
            self.entries.push((state, Vec::new()));
            self.entries.len() - 1
        });
        let actions = &mut self.entries[i].1;
        if actions.contains(&action) {
            return false;
        }
        actions.push(action);
        true
    }

    pub fn contains(&self, state: E::State, action: E::Action) -> bool {
        self.actions(state).contains(&action)
    }

    /// Actions already taken in `state`
    pub fn actions(&self, state: E::State) -> &[E::Action] {
        self.index
            .get(&state)
            .map(|&i| self.entries[i].1.as_slice())
            .unwrap_or_default()
    }

    /// Draw a state uniformly from the distinct seen states, then one of its taken actions uniformly
    ///
    /// **Returns** `None` if nothing has been seen yet
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(E::State, E::Action)> {
        let (state, actions) = self.entries.choose(rng)?;
        let action = actions.choose(rng)?;
        Some((*state, *action))
    }

    /// Number of distinct states
    pub fn states(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct state-action pairs
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, actions)| actions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Environment> Default for SeenSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{rngs::StdRng, SeedableRng};

    use crate::env::tests::MockEnv;

    use super::*;

    #[test]
    fn seen_set_functional() {
        let mut seen = SeenSet::<MockEnv>::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(seen.sample(&mut rng).is_none(), "Nothing to sample when empty");

        assert!(seen.insert(0, 1));
        assert!(seen.insert(0, 2));
        assert!(!seen.insert(0, 1), "Duplicate pair");
        assert!(seen.insert(4, 1));

        assert_eq!(seen.states(), 2);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.actions(0), [1, 2]);
        assert!(seen.actions(9).is_empty());
        assert!(seen.contains(4, 1));
        assert!(!seen.contains(4, 2));
    }

    #[test]
    fn samples_only_seen_pairs_with_uniform_states() {
        let mut seen = SeenSet::<MockEnv>::new();
        let mut rng = StdRng::seed_from_u64(42);
        for action in 0..9 {
            seen.insert(0, action);
        }
        seen.insert(1, 0);

        let mut counts = HashMap::new();
        for _ in 0..2000 {
            let (state, action) = seen.sample(&mut rng).unwrap();
            assert!(seen.contains(state, action), "Sampled an unseen pair");
            *counts.entry(state).or_insert(0) += 1;
        }

        // states are drawn uniformly regardless of how many actions they hold
        let ones = counts[&1];
        assert!((800..1200).contains(&ones), "State 1 drawn {ones} times");
    }
}
