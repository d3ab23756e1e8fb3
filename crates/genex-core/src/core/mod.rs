//! # Core Module
//!
//! This module provides the fundamental building blocks of the gene-expression
//! simulation: the biomolecule and strand data models and the geometric chain
//! algebra that everything downstream depends on.
//!
//! ## Overview
//!
//! The core module is deliberately free of orchestration logic. It defines the
//! entities that the engine moves around and negotiates between, together with
//! the invariant-preserving operations on them:
//!
//! - **Entity Representation** ([`models`]) - Mobile biomolecules, attachment sites,
//!   shape segments, shape-defining points, and the messenger-RNA strand that owns them
//! - **Geometry Utilities** ([`utils`]) - Axis-aligned bounds and small vector helpers
//!
//! ## Key Invariants
//!
//! - **Length conservation** - the chain algebra never creates or loses strand
//!   length except where an operation is documented to remove it
//! - **Single occupancy** - an attachment site holds at most one occupant
//! - **Geometric contiguity** - segments abut with no gaps or overlaps after
//!   every mutation, and shape points are re-wound through the new geometry

pub mod models;
pub mod utils;
