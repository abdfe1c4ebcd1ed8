//! System-wide constants for the winder workspace.
//!
//! Single source of truth for default motion parameters and paths.
//! Imported by all crates — no duplication permitted.

/// Default big-motor full-rotation step count (1/16 microstepping on a
/// 200-step motor).
pub const DEFAULT_STEPS_PER_REV: u32 = 3200;

/// Default big-motor pulse phase hold in microseconds (HIGH and LOW each).
pub const DEFAULT_BIG_STEP_DELAY_US: u32 = 1000;

/// Default small-motor pulse width in microseconds.
///
/// The wire-feed driver datasheet requires >= 1 µs; the default leaves
/// margin. This width is explicit configuration, never incidental
/// instruction timing.
pub const DEFAULT_SMALL_PULSE_WIDTH_US: u32 = 2;

/// Default feed advance constant in millimetres.
///
/// Numerator of the step-ratio derivation: the big motor completes
/// `feed_advance_mm / wire_diameter_mm` steps per small-motor step.
pub const DEFAULT_FEED_ADVANCE_MM: f64 = 4.0;

/// Number of physical output lines driven by the controller.
pub const LINE_COUNT: usize = 5;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/winder.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(DEFAULT_STEPS_PER_REV > 0);
        assert!(DEFAULT_BIG_STEP_DELAY_US > 0);
        assert!(DEFAULT_SMALL_PULSE_WIDTH_US > 0);
        assert!(DEFAULT_FEED_ADVANCE_MM > 0.0);
    }

    #[test]
    fn line_mask_fits_in_u8() {
        // LineMask bit-packs one bit per output line.
        assert!(LINE_COUNT <= 8);
    }
}
