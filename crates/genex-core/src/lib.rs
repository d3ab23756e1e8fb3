//! # GenExpr Core Library
//!
//! An educational simulation library for gene expression: messenger-RNA strands
//! grow during transcription, ribosomes translate them into protein, and
//! destroyers consume them, all on a single-threaded discrete-time clock.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the data models (`MessengerRna`,
//!   `MobileBiomolecule`, `AttachmentSite`, `ShapeSegment`) and the exact-invariant
//!   chain algebra that keeps a growing/shrinking strand length-conserving and
//!   geometrically contiguous after every mutation.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the simulation.
//!   It includes the motion strategies for unattached molecules, the per-molecule
//!   attachment state machine, and the `GeneExpressionModel` container whose tick
//!   function drives the attachment-negotiation protocol.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute the complete
//!   transcription/translation/destruction lifecycle and report progress along the way.

pub mod core;
pub mod engine;
pub mod workflows;
