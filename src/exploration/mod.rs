use rand::{seq::SliceRandom, Rng};
use strum::{Display, EnumString, VariantNames};

use crate::{
    algo::tabular::q_table::QTable,
    decay::{self, Decay},
    env::Environment,
    Error, Result,
};

/// Exploration policy result
pub enum Choice {
    Explore,
    Exploit,
}

mod epsilon_greedy;
mod ucb;

pub use epsilon_greedy::EpsilonGreedy;
pub use ucb::UCB;

/// The configurable exploration strategies
#[derive(EnumString, Display, VariantNames, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExplorationMethod {
    /// Epsilon greedy with a constant epsilon
    #[default]
    #[strum(serialize = "e-greedy")]
    EpsilonGreedy,
    /// Epsilon greedy with epsilon decaying linearly to 0
    #[strum(serialize = "decaying-e-greedy")]
    DecayingEpsilon,
    /// Upper confidence bound
    #[strum(serialize = "ucb")]
    Ucb,
}

impl ExplorationMethod {
    /// Look up a method by name, failing with [`Error::Config`] for unknown names
    pub fn from_name(name: &str) -> Result<Self> {
        name.trim().parse().map_err(|_| {
            Error::Config(format!(
                "unrecognized exploration method {name:?}, expected one of {:?}",
                Self::VARIANTS
            ))
        })
    }
}

/// An exploration policy bound to an environment's state and action types
pub enum Explorer<E: Environment> {
    EpsilonGreedy(EpsilonGreedy<decay::Constant>),
    DecayingEpsilon(EpsilonGreedy<decay::Linear>),
    Ucb(UCB<E>),
}

impl<E: Environment> Explorer<E> {
    /// The exploration threshold after `episode` completed episodes, if the policy has one
    pub fn epsilon(&self, episode: u32) -> Option<f32> {
        match self {
            Explorer::EpsilonGreedy(policy) => Some(policy.epsilon(episode)),
            Explorer::DecayingEpsilon(policy) => Some(policy.epsilon(episode)),
            Explorer::Ucb(_) => None,
        }
    }

    pub fn method(&self) -> ExplorationMethod {
        match self {
            Explorer::EpsilonGreedy(_) => ExplorationMethod::EpsilonGreedy,
            Explorer::DecayingEpsilon(_) => ExplorationMethod::DecayingEpsilon,
            Explorer::Ucb(_) => ExplorationMethod::Ucb,
        }
    }

    /// Select an action for `state` after `episode` completed episodes
    ///
    /// Fails with [`Error::Action`] if `state` has no actions.
    pub fn select<R: Rng + ?Sized>(
        &mut self,
        state: E::State,
        q_table: &QTable<E>,
        episode: u32,
        rng: &mut R,
    ) -> Result<E::Action> {
        let choice = match self {
            Explorer::EpsilonGreedy(policy) => epsilon_greedy(policy, state, q_table, episode, rng),
            Explorer::DecayingEpsilon(policy) => {
                epsilon_greedy(policy, state, q_table, episode, rng)
            }
            Explorer::Ucb(policy) => policy.choose(state, q_table, episode, rng),
        };
        choice.ok_or_else(|| Error::Action(format!("no actions available in state {state:?}")))
    }
}

/// Random legal action on explore, otherwise a random action among those tied for the best value
fn epsilon_greedy<E, D, R>(
    policy: &EpsilonGreedy<D>,
    state: E::State,
    q_table: &QTable<E>,
    episode: u32,
    rng: &mut R,
) -> Option<E::Action>
where
    E: Environment,
    D: Decay,
    R: Rng + ?Sized,
{
    match policy.choose(episode, rng) {
        Choice::Explore => q_table.values(state).choose(rng).map(|&(a, _)| a),
        Choice::Exploit => q_table.greedy_actions(state).choose(rng).copied(),
    }
}
