use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};

use crate::{algo::tabular::q_table::QTable, env::Environment};

/// Upper confidence bound exploration policy
///
/// Scores each action as Q(s,a) + c * sqrt(2 ln(t) / n(s,a)), where `t` is the number of
/// completed episodes and `n(s,a)` counts how often the pair was chosen, starting at 1.
pub struct UCB<E: Environment> {
    c: f32,
    counter: HashMap<(E::State, E::Action), u32>,
}

impl<E: Environment> UCB<E> {
    /// Initialize UCB policy with exploration parameter `c`
    ///
    /// A higher `c` value equates to more exploration. If unsure where to start, 1 is a good default value.
    pub fn new(c: f32) -> Self {
        Self {
            c,
            counter: HashMap::new(),
        }
    }

    /// How many times `action` has been chosen in `state`, plus one
    pub fn count(&self, state: E::State, action: E::Action) -> u32 {
        self.counter.get(&(state, action)).copied().unwrap_or(1)
    }

    /// Adjusted scores of every action in `state` after `t` completed episodes
    ///
    /// Before the first episode completes `ln(t)` is taken at `t = 1`, i.e. no bonus.
    pub fn scores(&self, state: E::State, q_table: &QTable<E>, t: u32) -> Vec<(E::Action, f32)> {
        let k = 2.0 * (t.max(1) as f32).ln();
        q_table
            .values(state)
            .iter()
            .map(|&(a, q)| {
                let n = self.count(state, a) as f32;
                (a, q + self.c * (k / n).sqrt())
            })
            .collect()
    }

    /// Invoke UCB policy at time `t`, breaking ties uniformly at random
    ///
    /// **Returns** `None` if `state` has no actions
    pub fn choose<R: Rng + ?Sized>(
        &mut self,
        state: E::State,
        q_table: &QTable<E>,
        t: u32,
        rng: &mut R,
    ) -> Option<E::Action> {
        let scores = self.scores(state, q_table, t);
        let max = scores.iter().map(|&(_, s)| s).reduce(f32::max)?;
        let best = scores
            .iter()
            .filter(|&&(_, s)| s == max)
            .map(|&(a, _)| a)
            .collect::<Vec<_>>();
        let choice = *best.choose(rng)?;

        *self.counter.entry((state, choice)).or_insert(1) += 1;
        Some(choice)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{env::tests::MockEnv, memory::Exp};

    #[test]
    fn no_bonus_before_first_episode() {
        let mut ucb = UCB::<MockEnv>::new(2.0);
        let mut q_table = QTable::new(&MockEnv::new());
        let mut rng = StdRng::seed_from_u64(1);
        q_table
            .update(
                &Exp {
                    state: 0,
                    action: 1,
                    next_state: 1,
                    reward: 1.0,
                },
                1.0,
                0.0,
            )
            .unwrap();

        for _ in 0..20 {
            assert_eq!(ucb.choose(0, &q_table, 0, &mut rng), Some(1), "Greedy at t = 0");
        }
        assert_eq!(ucb.count(0, 1), 21);
        assert_eq!(ucb.count(0, -1), 1);
    }

    #[test]
    fn bonus_favours_rarely_chosen_actions() {
        let mut ucb = UCB::<MockEnv>::new(1.0);
        let q_table = QTable::new(&MockEnv::new());
        let mut rng = StdRng::seed_from_u64(5);

        // values are equal, so choices must alternate as counts grow
        let mut picks = Vec::new();
        for _ in 0..10 {
            picks.push(ucb.choose(2, &q_table, 10, &mut rng).unwrap());
        }
        assert_eq!(picks.iter().filter(|&&a| a == 1).count(), 5);
        assert_eq!(ucb.count(2, 1), ucb.count(2, -1));
    }

    #[test]
    fn always_picks_a_maximal_score() {
        let mut ucb = UCB::<MockEnv>::new(0.7);
        let mut q_table = QTable::new(&MockEnv::new());
        let mut rng = StdRng::seed_from_u64(9);

        for t in 1..200u32 {
            let state = (t % 4) as i32;
            let scores = ucb.scores(state, &q_table, t);
            let max = scores.iter().map(|&(_, s)| s).fold(f32::MIN, f32::max);
            let action = ucb.choose(state, &q_table, t, &mut rng).unwrap();
            let chosen = scores.iter().find(|&&(a, _)| a == action).unwrap().1;
            assert_eq!(chosen, max, "Chose a non-maximal action at t = {t}");

            let next_state = (state + action).clamp(0, MockEnv::GOAL);
            let exp = Exp {
                state,
                action,
                next_state,
                reward: if next_state == MockEnv::GOAL { 1.0 } else { -0.1 },
            };
            q_table.update(&exp, 0.3, 0.9).unwrap();
        }
    }

    #[test]
    fn terminal_state_has_no_choice() {
        let mut ucb = UCB::<MockEnv>::new(1.0);
        let q_table = QTable::new(&MockEnv::new());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(ucb.choose(MockEnv::GOAL, &q_table, 3, &mut rng), None);
    }
}
