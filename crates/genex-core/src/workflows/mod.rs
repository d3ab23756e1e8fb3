//! High-level entry points that wire configuration, the simulation model,
//! and progress reporting together into complete runs.

pub mod express;
