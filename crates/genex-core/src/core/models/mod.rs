//! # Core Models Module
//!
//! This module defines the entities of the simulated gene-expression world and
//! the operations that preserve their invariants.
//!
//! ## Key Components
//!
//! - [`ids`] - Stable slotmap handles for biomolecules and strands
//! - [`molecule`] - Mobile biomolecules (ribosomes, messenger-RNA destroyers)
//! - [`attachment_site`] - Single-slot rendezvous points for attachment negotiation
//! - [`point`] - Shape-defining points strung along a strand
//! - [`segment`] - Capacity-bounded shape segments and the conserving chain algebra
//! - [`strand`] - The messenger-RNA strand: segment list, point list, negotiation API
//!
//! ## Usage
//!
//! Strands and molecules are usually owned by the engine's model container and
//! addressed through their [`ids`] handles, but every operation here is usable
//! standalone, which is how the inline tests exercise them.
//!
//! ```ignore
//! use genexpr::core::models::strand::MessengerRna;
//! use nalgebra::Point2;
//!
//! let mut strand = MessengerRna::new(Point2::origin());
//! strand.add_length(300.0);
//! assert!(strand.attachment_allowed());
//! ```

pub mod attachment_site;
pub mod ids;
pub mod molecule;
pub mod point;
pub mod segment;
pub mod strand;
