//! Analysis modules.
//!
//! The aggregator turns the immutable event collection into summary
//! statistics, distributions and time series.

pub mod aggregator;

pub use aggregator::*;
