//! Controller lifecycle and feed-direction enums.
//!
//! Both enums use `#[repr(u8)]` for compact layout. `ControllerState` is a
//! two-state machine: `Halted` is terminal and all pulse-emitting
//! operations become no-ops once it is reached.

use serde::{Deserialize, Serialize};

/// Winding controller lifecycle state.
///
/// `Active → Halted` is the only transition; nothing leaves `Halted`.
/// A controller whose schedule derives zero layers starts directly in
/// `Halted` and never emits a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerState {
    /// Winding in progress — pulse emission permitted.
    Active = 0,
    /// Schedule complete (or empty). Terminal; no further motor output.
    Halted = 1,
}

impl ControllerState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Active),
            1 => Some(Self::Halted),
            _ => None,
        }
    }

    /// Returns true for the terminal state.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Halted)
    }
}

/// Wire-feed carriage direction for one layer.
///
/// Alternates every layer to produce the back-and-forth traversing wind:
/// even-indexed layers (0, 2, …) feed `Forward`, odd-indexed `Reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeedDirection {
    /// Carriage advances away from the spool flange.
    Forward = 0,
    /// Carriage returns toward the spool flange.
    Reverse = 1,
}

impl FeedDirection {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Forward),
            1 => Some(Self::Reverse),
            _ => None,
        }
    }

    /// Direction for a given zero-based layer index.
    #[inline]
    pub const fn for_layer(layer: u32) -> Self {
        if layer % 2 == 0 {
            Self::Forward
        } else {
            Self::Reverse
        }
    }

    /// The opposite direction.
    #[inline]
    pub const fn toggled(&self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}
