mod exp;
mod model;
mod seen;

pub use exp::*;
pub use model::{Outcome, WorldModel};
pub use seen::SeenSet;
