//! Stateful simulation orchestration.
//!
//! The engine owns the arenas of molecules and strands, drives the
//! per-tick negotiation/motion/processing loop, and reports progress to
//! callers. It builds exclusively on the stateless models in
//! [`crate::core`].

pub mod config;
pub mod error;
pub mod model;
pub mod motion;
pub mod progress;
pub mod state_machine;
