use rand::Rng;

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// The exploration threshold after `episode` completed episodes
    pub fn epsilon(&self, episode: u32) -> f32 {
        self.epsilon.evaluate(episode as f32)
    }

    /// Invoke epsilon greedy policy for current episode
    pub fn choose<R: Rng + ?Sized>(&self, episode: u32, rng: &mut R) -> Choice {
        if rng.gen::<f32>() < self.epsilon(episode) {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}
