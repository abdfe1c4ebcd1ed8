//! # Winder Control Library
//!
//! Step-synchronized control loop for a two-motor coil-winding machine.
//! A "big" stepper rotates the winding core; a "small" stepper advances
//! the wire-feed carriage. The controller derives a feed-to-rotation step
//! ratio from the wire diameter and drives both pulse trains in lockstep
//! across a multi-layer schedule, reversing the feed direction at every
//! layer boundary.
//!
//! ## Architecture
//!
//! 1. **WindingPlan** — all derived quantities (layer count, step ratio),
//!    computed once from validated configuration
//! 2. **WindingController** — the Active/Halted sequencing state machine
//! 3. **StepClock** — pulse-phase pacing seam (monotonic absolute-time
//!    clock in production, no-op clock in tests)
//!
//! ## Single-Threaded by Design
//!
//! This is an open-loop system: once a pulse is issued it cannot be
//! verified or corrected. Correctness depends on strict single-threaded
//! ordering — a small-motor pulse is only ever emitted synchronously
//! inside the big-motor step loop, never concurrently.

#![deny(clippy::disallowed_types)]

pub mod controller;
pub mod pace;
pub mod plan;
pub mod rt;
