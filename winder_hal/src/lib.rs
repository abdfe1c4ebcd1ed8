//! # Winder HAL Library
//!
//! Pluggable output-line backends for the winding controller.
//!
//! The controller drives five digital lines through the `StepBus` trait
//! defined in `winder_common::hal`. This crate provides the backend
//! registry and the in-tree `simulation` backend; hardware backends
//! (GPIO character device, parallel port, …) plug in through the same
//! trait from out of tree.
//!
//! # Module Structure
//!
//! - [`registry`] - Backend factory registration
//! - [`sim`] - Recording simulation backend

#![deny(warnings)]
#![deny(missing_docs)]

pub mod registry;
pub mod sim;

// Re-export key types for convenience
pub use crate::registry::BusRegistry;
pub use crate::sim::SimulationBus;
