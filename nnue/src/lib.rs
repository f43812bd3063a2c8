pub mod accumulator;
pub mod eval;
pub mod features;
pub mod network;

pub use accumulator::{Accumulator, Accumulators};
pub use eval::evaluate;
pub use network::{LoadError, Network};
