//! Analysis modules.
//!
//! Rating validation and per-category aggregation.

pub mod aggregator;

pub use aggregator::*;
