//! Derived winding schedule.
//!
//! The reference firmware re-derived the layer count and step ratio on
//! every pass through its main loop. Here every derived quantity is
//! computed exactly once, from an already-validated configuration, and
//! carried as plain data for the controller.

use std::time::Duration;
use winder_common::config::{ConfigError, WinderConfig};

/// Big-motor steps per one small-motor step.
///
/// The big motor must complete `feed_advance_mm / wire_diameter_mm` steps
/// before the feed carriage advances by one wire diameter, truncated to an
/// integer pulse count.
#[inline]
pub fn derive_step_ratio(feed_advance_mm: f64, wire_diameter_mm: f64) -> u32 {
    (feed_advance_mm / wire_diameter_mm).floor() as u32
}

/// Number of complete layers in the schedule (integer division; a trailing
/// partial layer is not wound).
#[inline]
pub fn derive_layer_count(total_turns: u32, turns_per_layer: u32) -> u32 {
    total_turns / turns_per_layer
}

/// All quantities the controller needs, derived once at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindingPlan {
    /// Complete layers to wind. Zero means the controller starts Halted.
    pub number_of_layers: u32,
    /// Big-motor pulses per small-motor pulse.
    pub step_ratio: u32,
    /// Core revolutions per layer.
    pub turns_per_layer: u32,
    /// Big-motor pulses per core revolution.
    pub steps_per_rev: u32,
    /// Hold time for each big-motor pulse phase (HIGH and LOW each).
    pub big_step_delay: Duration,
    /// Small-motor pulse width.
    pub small_pulse_width: Duration,
}

impl WindingPlan {
    /// Derive a plan from a configuration.
    ///
    /// Validates the configuration first: no plan — and therefore no
    /// motion — can exist for invalid geometry or counts.
    pub fn from_config(config: &WinderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let step_ratio = derive_step_ratio(
            config.winding.feed_advance_mm,
            config.winding.wire_diameter_mm,
        );
        // validate() already rejects wire thicker than the feed advance.
        debug_assert!(step_ratio > 0);

        Ok(Self {
            number_of_layers: derive_layer_count(
                config.winding.total_turns,
                config.winding.turns_per_layer,
            ),
            step_ratio,
            turns_per_layer: config.winding.turns_per_layer,
            steps_per_rev: config.motion.steps_per_rev,
            big_step_delay: Duration::from_micros(config.motion.big_step_delay_us as u64),
            small_pulse_width: Duration::from_micros(config.motion.small_pulse_width_us as u64),
        })
    }

    /// Small-motor pulses emitted during one core revolution.
    #[inline]
    pub fn small_pulses_per_rev(&self) -> u32 {
        self.steps_per_rev / self.step_ratio
    }

    /// Big-motor pulses emitted during one layer.
    #[inline]
    pub fn big_pulses_per_layer(&self) -> u64 {
        self.turns_per_layer as u64 * self.steps_per_rev as u64
    }

    /// Small-motor pulses emitted during one layer.
    #[inline]
    pub fn small_pulses_per_layer(&self) -> u64 {
        self.turns_per_layer as u64 * self.small_pulses_per_rev() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use winder_common::config::{HalConfig, MotionConfig, SharedConfig, WindingConfig};

    fn reference_config() -> WinderConfig {
        WinderConfig {
            shared: SharedConfig {
                log_level: Default::default(),
                service_name: "winder-test".to_string(),
            },
            winding: WindingConfig {
                wire_diameter_mm: 0.15,
                core_diameter_mm: 0.790,
                wiring_distance_mm: 45.0,
                turns_per_layer: 172,
                total_turns: 4040,
                max_layers: Some(23),
                feed_advance_mm: 4.0,
            },
            motion: MotionConfig::default(),
            hal: HalConfig::default(),
        }
    }

    #[test]
    fn reference_geometry_plan() {
        let plan = WindingPlan::from_config(&reference_config()).unwrap();
        assert_eq!(plan.number_of_layers, 23);
        assert_eq!(plan.step_ratio, 26);
        assert_eq!(plan.steps_per_rev, 3200);
        assert_eq!(plan.small_pulses_per_rev(), 123);
    }

    #[test]
    fn layer_count_truncates() {
        // 4040 / 172 = 23.49… — the partial 24th layer is not wound.
        assert_eq!(derive_layer_count(4040, 172), 23);
        assert_eq!(derive_layer_count(172, 172), 1);
        assert_eq!(derive_layer_count(171, 172), 0);
    }

    #[test]
    fn empty_schedule_yields_zero_layers() {
        let mut config = reference_config();
        config.winding.total_turns = 100;
        config.winding.turns_per_layer = 172;
        let plan = WindingPlan::from_config(&config).unwrap();
        assert_eq!(plan.number_of_layers, 0);
    }

    #[test]
    fn step_ratio_decreases_with_wire_diameter() {
        let r1 = derive_step_ratio(4.0, 0.1);
        let r2 = derive_step_ratio(4.0, 0.2);
        let r3 = derive_step_ratio(4.0, 0.4);
        assert_eq!(r1, 40);
        assert_eq!(r2, 20);
        assert_eq!(r3, 10);
        assert!(r1 > r2 && r2 > r3);
    }

    #[test]
    fn invalid_config_yields_no_plan() {
        let mut config = reference_config();
        config.winding.wire_diameter_mm = 0.0;
        assert!(WindingPlan::from_config(&config).is_err());
    }

    #[test]
    fn timing_comes_from_motion_config() {
        let mut config = reference_config();
        config.motion.big_step_delay_us = 500;
        config.motion.small_pulse_width_us = 3;
        let plan = WindingPlan::from_config(&config).unwrap();
        assert_eq!(plan.big_step_delay, Duration::from_micros(500));
        assert_eq!(plan.small_pulse_width, Duration::from_micros(3));
    }

    proptest! {
        #[test]
        fn step_ratio_is_positive_and_monotone(
            d1 in 0.01f64..4.0,
            d2 in 0.01f64..4.0,
        ) {
            let (thin, thick) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let r_thin = derive_step_ratio(4.0, thin);
            let r_thick = derive_step_ratio(4.0, thick);
            prop_assert!(r_thin >= 1);
            prop_assert!(r_thick >= 1);
            // Thinner wire never yields a smaller ratio.
            prop_assert!(r_thin >= r_thick);
        }

        #[test]
        fn layer_count_is_integer_division(
            total in 1u32..100_000,
            per_layer in 1u32..1_000,
        ) {
            prop_assert_eq!(derive_layer_count(total, per_layer), total / per_layer);
        }
    }
}
