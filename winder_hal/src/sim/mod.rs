//! Simulation backend.
//!
//! Software-emulated output lines for development and testing without
//! physical stepper drivers. Records every write so tests can assert
//! exact pulse counts and ordering.

mod bus;

pub use bus::{SimulationBus, Transition};
