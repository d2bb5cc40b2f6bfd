use thiserror::Error;

/// Errors raised while loading a gridworld or driving an agent through it
#[derive(Debug, Error)]
pub enum Error {
    #[error("Grid format error: {0}")]
    GridFormat(String),

    #[error("Rule format error: {0}")]
    RuleFormat(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid action: {0}")]
    Action(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
