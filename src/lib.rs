/// Implemented RL algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment
pub mod env;

mod error;

/// Exploration policies
pub mod exploration;

/// Testing environments
pub mod gym;

/// Experience and learned models of the environment
pub mod memory;

mod util;

pub use error::{Error, Result};
