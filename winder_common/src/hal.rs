//! Output-line vocabulary and the backend trait.
//!
//! This module defines:
//! - `Line` / `LineLevel` - the five digital output lines and their levels
//! - `LineMask` - bit-packed snapshot of which lines are HIGH
//! - `StepBus` trait - interface for pluggable output-line backends
//! - `HalError` enum - error types for backend operations
//! - `BusFactory` type alias - factory function type

use crate::state::FeedDirection;
use bitflags::bitflags;
use thiserror::Error;

/// Error types for output-line backends.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Backend initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// A line write was rejected by the backend.
    #[error("Line write failed: {0}")]
    WriteFailed(String),

    /// Backend not found in the registry.
    #[error("Backend not found: {0}")]
    BackendNotFound(String),
}

/// Logical output line driven by the winding controller.
///
/// These are the system's entire external boundary: five two-state signals
/// into the stepper drivers, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Line {
    /// Small (wire-feed) motor direction.
    SmallStepDir = 0,
    /// Small motor step line — one HIGH/LOW transition per step.
    SmallStepPulse = 1,
    /// Big (core) motor driver enable, held HIGH throughout active winding.
    BigStepEnable = 2,
    /// Big motor direction (constant during a winding job).
    BigStepDir = 3,
    /// Big motor step line — one timed HIGH/LOW transition per step.
    BigStepPulse = 4,
}

impl Line {
    /// All lines, in declaration order.
    pub const ALL: [Line; crate::consts::LINE_COUNT] = [
        Line::SmallStepDir,
        Line::SmallStepPulse,
        Line::BigStepEnable,
        Line::BigStepDir,
        Line::BigStepPulse,
    ];

    /// Bit index of this line within a [`LineMask`].
    #[inline]
    pub const fn bit(&self) -> u8 {
        *self as u8
    }
}

/// Digital level of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineLevel {
    /// Logical LOW.
    Low = 0,
    /// Logical HIGH.
    High = 1,
}

impl From<FeedDirection> for LineLevel {
    /// Level written to `SmallStepDir` for a given feed direction.
    /// Forward drives the line HIGH, matching the reference wiring.
    fn from(dir: FeedDirection) -> Self {
        match dir {
            FeedDirection::Forward => LineLevel::High,
            FeedDirection::Reverse => LineLevel::Low,
        }
    }
}

bitflags! {
    /// Bit-packed snapshot of which output lines are currently HIGH.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LineMask: u8 {
        /// `Line::SmallStepDir` is HIGH.
        const SMALL_STEP_DIR   = 1 << 0;
        /// `Line::SmallStepPulse` is HIGH.
        const SMALL_STEP_PULSE = 1 << 1;
        /// `Line::BigStepEnable` is HIGH.
        const BIG_STEP_ENABLE  = 1 << 2;
        /// `Line::BigStepDir` is HIGH.
        const BIG_STEP_DIR     = 1 << 3;
        /// `Line::BigStepPulse` is HIGH.
        const BIG_STEP_PULSE   = 1 << 4;
    }
}

impl LineMask {
    /// Mask bit for a single line.
    #[inline]
    pub const fn for_line(line: Line) -> Self {
        Self::from_bits_truncate(1 << line.bit())
    }
}

/// Factory function type for creating backend instances.
pub type BusFactory = fn() -> Box<dyn StepBus>;

/// Trait defining the interface for output-line backends.
///
/// The controller owns exactly one `StepBus` and is the only writer; no
/// other control flow may touch the lines concurrently. Backends are
/// pluggable through the bus registry (simulation in-tree; GPIO drivers
/// out of tree).
pub trait StepBus: Send {
    /// Returns the backend's unique identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    /// Drive one output line to the given level.
    ///
    /// Every call is an observable signal transition at the system
    /// boundary; pulse timing is the caller's responsibility.
    ///
    /// # Errors
    /// Returns `HalError::WriteFailed` if the backend rejects the write.
    fn write(&mut self, line: Line, level: LineLevel) -> Result<(), HalError>;

    /// Graceful shutdown of the backend.
    ///
    /// Default implementation does nothing (for backends without
    /// hardware resources to release).
    fn shutdown(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

impl<T: StepBus + ?Sized> StepBus for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn write(&mut self, line: Line, level: LineLevel) -> Result<(), HalError> {
        (**self).write(line, level)
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        (**self).shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBus;

    impl StepBus for NullBus {
        fn name(&self) -> &'static str {
            "null"
        }

        fn write(&mut self, _line: Line, _level: LineLevel) -> Result<(), HalError> {
            Ok(())
        }
    }

    #[test]
    fn hal_error_display() {
        let err = HalError::BackendNotFound("simulation".to_string());
        assert!(err.to_string().contains("simulation"));
    }

    #[test]
    fn line_bits_are_unique() {
        let mut seen = LineMask::empty();
        for line in Line::ALL {
            let mask = LineMask::for_line(line);
            assert!(!seen.intersects(mask), "duplicate bit for {line:?}");
            seen |= mask;
        }
        assert_eq!(seen, LineMask::all());
    }

    #[test]
    fn feed_direction_maps_to_levels() {
        assert_eq!(LineLevel::from(FeedDirection::Forward), LineLevel::High);
        assert_eq!(LineLevel::from(FeedDirection::Reverse), LineLevel::Low);
    }

    #[test]
    fn boxed_bus_delegates() {
        let mut bus: Box<dyn StepBus> = Box::new(NullBus);
        assert_eq!(bus.name(), "null");
        assert!(bus.write(Line::BigStepPulse, LineLevel::High).is_ok());
        assert!(bus.shutdown().is_ok());
    }
}
