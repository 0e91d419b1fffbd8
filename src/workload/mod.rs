//! Seeded key sequences for benchmarks and tests

mod random;
mod sequential;

pub use random::*;
pub use sequential::*;
