pub mod gridworld;

pub use gridworld::Gridworld;
