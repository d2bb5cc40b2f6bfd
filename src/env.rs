use std::{fmt::Debug, hash::Hash};

use rand::Rng;

use crate::Result;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent,
/// a finite state space, a finite action space, and deterministic dynamics.
///
/// The current state is owned by the environment and can only change through
/// [`initialize`](Environment::initialize) and [`step`](Environment::step).
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Copy + Eq + Hash + Debug;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Copy + Eq + Hash + Debug;

    /// Describes how an episode should be started
    type Init: Clone + Debug;

    /// Place the environment in an initial state
    ///
    /// Any randomness involved in picking the state is drawn from `rng`.
    ///
    /// **Returns** the new current state
    fn initialize<R: Rng + ?Sized>(&mut self, init: Self::Init, rng: &mut R)
        -> Result<Self::State>;

    /// Get every state of the environment, including terminal and unreachable ones
    fn states(&self) -> Vec<Self::State>;

    /// Get the available actions for a given state
    ///
    /// The returned vector is empty for terminal states.
    fn actions(&self, state: Self::State) -> Vec<Self::Action>;

    /// The current state, or `None` if the environment was never initialized
    fn state(&self) -> Option<Self::State>;

    /// Determine if a state ends the episode
    fn is_terminal(&self, state: Self::State) -> bool;

    /// Update the environment in response to an action taken by an agent, producing a reward and a new state
    ///
    /// **Returns** `(reward, next_state)`
    fn step(&mut self, action: Self::Action) -> Result<(f32, Self::State)>;

    /// Get the available actions for the current state
    fn current_actions(&self) -> Vec<Self::Action> {
        self.state()
            .map(|state| self.actions(state))
            .unwrap_or_default()
    }

    /// Determine if the current state is active, i.e. initialized and not terminal
    fn is_active(&self) -> bool {
        self.state().is_some_and(|state| !self.is_terminal(state))
    }
}
