pub mod indicators;
pub mod indicator_set;
pub mod signals;
pub mod analyzer;

#[cfg(test)]
mod indicators_tests;

pub use indicators::*;
pub use indicator_set::*;
pub use signals::*;
pub use analyzer::*;
