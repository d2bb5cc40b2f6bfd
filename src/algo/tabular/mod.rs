pub mod dyna_q;
pub mod q_table;

pub use dyna_q::{DynaAgent, DynaConfig, EpisodeReport, Phase};
pub use q_table::QTable;
