mod optimizer;
mod sgd;

pub use optimizer::Optimizer;
pub use sgd::{Penalty, Sgd};
