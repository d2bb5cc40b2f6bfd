pub mod tabular;

pub use tabular::{DynaAgent, DynaConfig};
