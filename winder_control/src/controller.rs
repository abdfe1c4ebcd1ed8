//! The winding controller state machine.
//!
//! Drives the two pulse trains in lockstep: every big-motor pulse
//! increments a counter, and each time the counter reaches the step ratio
//! it resets and exactly one small-motor pulse is emitted. The counter is
//! reset at the start of every revolution, so each revolution emits
//! exactly `steps_per_rev / step_ratio` small-motor pulses.
//!
//! Lifecycle: `Active → Halted`, nothing leaves `Halted`. On the halt
//! transition the big-motor enable line is driven LOW so the driver is
//! never left energized — the reference firmware instead parked in a
//! `while(true);` spin with the driver enabled.
//!
//! Known limitation: there is no partial-layer checkpointing. `run_layer`
//! emits a layer's full pulse sequence before any halt or stop check is
//! reconsidered, and an interruption mid-layer loses synchronization
//! state.

use crate::pace::StepClock;
use crate::plan::WindingPlan;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};
use winder_common::config::ConfigError;
use winder_common::hal::{HalError, Line, LineLevel, StepBus};
use winder_common::state::{ControllerState, FeedDirection};

/// Errors during controller setup or pulse emission.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Invalid configuration — rejected before any motion.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An output-line write was rejected by the backend.
    #[error("output line error: {0}")]
    Hal(#[from] HalError),

    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
}

/// Two-motor winding controller.
///
/// Owns the output bus exclusively; no other control flow may write the
/// lines while the controller exists. All counters live here — there is
/// no process-global state.
pub struct WindingController<B: StepBus, C: StepClock> {
    plan: WindingPlan,
    bus: B,
    clock: C,
    state: ControllerState,
    current_layer: u32,
}

impl<B: StepBus, C: StepClock> WindingController<B, C> {
    /// Create a controller for the given plan.
    ///
    /// Starts `Active`, or directly `Halted` when the plan contains zero
    /// layers (total turns below one layer) — such a controller never
    /// emits a pulse.
    pub fn new(plan: WindingPlan, bus: B, clock: C) -> Self {
        let state = if plan.number_of_layers == 0 {
            warn!("schedule derives zero layers; controller starts halted");
            ControllerState::Halted
        } else {
            ControllerState::Active
        };

        Self {
            plan,
            bus,
            clock,
            state,
            current_layer: 0,
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Layers completed so far.
    #[inline]
    pub fn current_layer(&self) -> u32 {
        self.current_layer
    }

    /// The derived plan this controller executes.
    #[inline]
    pub fn plan(&self) -> &WindingPlan {
        &self.plan
    }

    /// Shared access to the output bus (for inspection in tests and for
    /// shutdown).
    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Exclusive access to the output bus.
    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Wind one layer: `turns_per_layer` full revolutions of the core,
    /// feeding wire in `direction`.
    ///
    /// Emits exactly `steps_per_rev` big-motor pulses per revolution
    /// regardless of the step ratio. No-op once halted.
    pub fn run_layer(&mut self, direction: FeedDirection) -> Result<(), ControlError> {
        if self.state.is_terminal() {
            return Ok(());
        }

        debug!(
            layer = self.current_layer,
            ?direction,
            turns = self.plan.turns_per_layer,
            "winding layer"
        );

        // Core rotation direction is fixed for the whole job.
        self.bus.write(Line::BigStepDir, LineLevel::High)?;

        for _turn in 0..self.plan.turns_per_layer {
            self.bus.write(Line::BigStepEnable, LineLevel::High)?;

            // Steps accumulated since the last small-motor pulse. Reset
            // per revolution so every revolution emits the same number of
            // feed pulses.
            let mut big_step_counter: u32 = 0;

            for _ in 0..self.plan.steps_per_rev {
                self.big_pulse()?;
                big_step_counter += 1;

                if big_step_counter >= self.plan.step_ratio {
                    big_step_counter = 0;
                    self.small_pulse(direction)?;
                }
            }
        }

        Ok(())
    }

    /// Record a completed layer; transition to `Halted` once the schedule
    /// is done.
    pub fn advance_layer(&mut self) -> Result<(), ControlError> {
        if self.state.is_terminal() {
            return Ok(());
        }

        self.current_layer += 1;
        info!(
            "layer {}/{} complete",
            self.current_layer, self.plan.number_of_layers
        );

        if self.current_layer >= self.plan.number_of_layers {
            self.halt()?;
        }
        Ok(())
    }

    /// Wind at most one layer pair: one pass in the current layer's
    /// parity direction, then — if the schedule is not yet complete — one
    /// pass in the opposite direction. Each pass advances the layer
    /// counter by one.
    ///
    /// Returns without motion once halted; callers invoking `run`
    /// repeatedly alternate further layer pairs until the schedule is
    /// done.
    pub fn run(&mut self) -> Result<(), ControlError> {
        if self.state.is_terminal() {
            return Ok(());
        }

        let direction = FeedDirection::for_layer(self.current_layer);
        self.run_layer(direction)?;
        self.advance_layer()?;

        if self.state.is_terminal() {
            return Ok(());
        }

        self.run_layer(direction.toggled())?;
        self.advance_layer()?;
        Ok(())
    }

    /// Run layer pairs until the schedule completes or `running` is
    /// cleared.
    ///
    /// A layer in flight always completes before the stop flag is
    /// consulted; on an early stop the big-motor enable line is dropped
    /// and the controller stays `Active` so a supervisor may resume.
    pub fn run_to_completion(&mut self, running: &AtomicBool) -> Result<(), ControlError> {
        while self.state == ControllerState::Active {
            if !running.load(Ordering::SeqCst) {
                warn!(
                    "stop requested with {}/{} layers wound; disabling drive",
                    self.current_layer, self.plan.number_of_layers
                );
                self.bus.write(Line::BigStepEnable, LineLevel::Low)?;
                return Ok(());
            }
            self.run()?;
        }
        Ok(())
    }

    /// One big-motor step: timed HIGH then LOW on the pulse line.
    fn big_pulse(&mut self) -> Result<(), ControlError> {
        self.bus.write(Line::BigStepPulse, LineLevel::High)?;
        self.clock.hold(self.plan.big_step_delay);
        self.bus.write(Line::BigStepPulse, LineLevel::Low)?;
        self.clock.hold(self.plan.big_step_delay);
        Ok(())
    }

    /// One small-motor step: direction line first, then the pulse with
    /// its explicit width.
    fn small_pulse(&mut self, direction: FeedDirection) -> Result<(), ControlError> {
        self.bus.write(Line::SmallStepDir, LineLevel::from(direction))?;
        self.bus.write(Line::SmallStepPulse, LineLevel::High)?;
        self.clock.hold(self.plan.small_pulse_width);
        self.bus.write(Line::SmallStepPulse, LineLevel::Low)?;
        Ok(())
    }

    /// Terminal transition: de-energize the big-motor driver and stop.
    fn halt(&mut self) -> Result<(), ControlError> {
        self.state = ControllerState::Halted;
        self.bus.write(Line::BigStepEnable, LineLevel::Low)?;
        info!(
            "winding complete: {} layers, {} big pulses/layer, {} feed pulses/layer",
            self.current_layer,
            self.plan.big_pulses_per_layer(),
            self.plan.small_pulses_per_layer()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pace::NullClock;
    use std::time::Duration;
    use winder_hal::SimulationBus;

    fn small_plan(layers: u32, step_ratio: u32, steps_per_rev: u32) -> WindingPlan {
        WindingPlan {
            number_of_layers: layers,
            step_ratio,
            turns_per_layer: 2,
            steps_per_rev,
            big_step_delay: Duration::from_micros(1000),
            small_pulse_width: Duration::from_micros(2),
        }
    }

    fn controller(plan: WindingPlan) -> WindingController<SimulationBus, NullClock> {
        WindingController::new(plan, SimulationBus::new(), NullClock::new())
    }

    #[test]
    fn layer_emits_exact_pulse_counts() {
        let mut ctl = controller(small_plan(1, 4, 10));
        ctl.run_layer(FeedDirection::Forward).unwrap();

        // 2 turns × 10 steps.
        assert_eq!(ctl.bus().pulses(Line::BigStepPulse), 20);
        // 2 turns × floor(10 / 4) = 2 feed pulses per revolution.
        assert_eq!(ctl.bus().pulses(Line::SmallStepPulse), 4);
    }

    #[test]
    fn counter_resets_each_revolution() {
        // With ratio 7 over 10 steps, the 3 leftover steps of each
        // revolution must not carry into the next one.
        let mut ctl = controller(small_plan(1, 7, 10));
        ctl.run_layer(FeedDirection::Forward).unwrap();
        assert_eq!(ctl.bus().pulses(Line::SmallStepPulse), 2);
    }

    #[test]
    fn ratio_larger_than_revolution_feeds_nothing() {
        let mut ctl = controller(small_plan(1, 11, 10));
        ctl.run_layer(FeedDirection::Forward).unwrap();
        assert_eq!(ctl.bus().pulses(Line::BigStepPulse), 20);
        assert_eq!(ctl.bus().pulses(Line::SmallStepPulse), 0);
    }

    #[test]
    fn big_pulses_hold_both_phases() {
        let mut ctl = controller(small_plan(1, 4, 10));
        ctl.run_layer(FeedDirection::Forward).unwrap();
        // 20 big pulses × 2 phases + 4 small pulses × 1 width hold.
        assert_eq!(ctl.clock.holds, 44);
    }

    #[test]
    fn advance_layer_halts_at_schedule_end() {
        let mut ctl = controller(small_plan(2, 4, 10));
        assert_eq!(ctl.state(), ControllerState::Active);

        ctl.advance_layer().unwrap();
        assert_eq!(ctl.state(), ControllerState::Active);
        assert_eq!(ctl.current_layer(), 1);

        ctl.advance_layer().unwrap();
        assert_eq!(ctl.state(), ControllerState::Halted);
        assert_eq!(ctl.current_layer(), 2);
    }

    #[test]
    fn halt_drops_enable_line() {
        let mut ctl = controller(small_plan(1, 4, 10));
        ctl.run_layer(FeedDirection::Forward).unwrap();
        assert_eq!(ctl.bus().level(Line::BigStepEnable), LineLevel::High);

        ctl.advance_layer().unwrap();
        assert_eq!(ctl.state(), ControllerState::Halted);
        assert_eq!(ctl.bus().level(Line::BigStepEnable), LineLevel::Low);
    }

    #[test]
    fn halted_controller_emits_nothing() {
        let mut ctl = controller(small_plan(1, 4, 10));
        ctl.run().unwrap();
        assert_eq!(ctl.state(), ControllerState::Halted);

        ctl.bus_mut().clear();
        ctl.run_layer(FeedDirection::Forward).unwrap();
        ctl.run().unwrap();
        ctl.advance_layer().unwrap();
        assert!(ctl.bus().transitions().is_empty());
        assert_eq!(ctl.current_layer(), 1);
    }

    #[test]
    fn zero_layer_plan_starts_halted() {
        let mut ctl = controller(small_plan(0, 4, 10));
        assert_eq!(ctl.state(), ControllerState::Halted);

        ctl.run().unwrap();
        assert!(ctl.bus().transitions().is_empty());
    }

    #[test]
    fn run_winds_a_layer_pair() {
        let mut ctl = controller(small_plan(4, 4, 10));
        ctl.run().unwrap();
        assert_eq!(ctl.current_layer(), 2);
        assert_eq!(ctl.state(), ControllerState::Active);

        // Forward layer then reverse layer, 4 feed pulses each.
        let dirs = ctl.bus().feed_levels_at_small_pulses();
        assert_eq!(dirs.len(), 8);
        assert!(dirs[..4].iter().all(|&l| l == LineLevel::High));
        assert!(dirs[4..].iter().all(|&l| l == LineLevel::Low));
    }

    #[test]
    fn odd_schedule_ends_on_forward_layer() {
        let mut ctl = controller(small_plan(3, 4, 10));
        ctl.run().unwrap();
        assert_eq!(ctl.current_layer(), 2);
        ctl.run().unwrap();
        assert_eq!(ctl.current_layer(), 3);
        assert_eq!(ctl.state(), ControllerState::Halted);

        // Layers 0, 1, 2 → forward, reverse, forward.
        let dirs = ctl.bus().feed_levels_at_small_pulses();
        assert_eq!(dirs.len(), 12);
        assert!(dirs[..4].iter().all(|&l| l == LineLevel::High));
        assert!(dirs[4..8].iter().all(|&l| l == LineLevel::Low));
        assert!(dirs[8..].iter().all(|&l| l == LineLevel::High));
    }

    #[test]
    fn stop_flag_prevents_motion_and_disables_drive() {
        let mut ctl = controller(small_plan(2, 4, 10));
        let running = AtomicBool::new(false);
        ctl.run_to_completion(&running).unwrap();

        assert_eq!(ctl.state(), ControllerState::Active);
        assert_eq!(ctl.bus().pulses(Line::BigStepPulse), 0);
        assert_eq!(ctl.bus().pulses(Line::SmallStepPulse), 0);
        assert_eq!(ctl.bus().level(Line::BigStepEnable), LineLevel::Low);
    }

    #[test]
    fn run_to_completion_winds_whole_schedule() {
        let mut ctl = controller(small_plan(4, 4, 10));
        let running = AtomicBool::new(true);
        ctl.run_to_completion(&running).unwrap();

        assert_eq!(ctl.state(), ControllerState::Halted);
        assert_eq!(ctl.current_layer(), 4);
        // 4 layers × 2 turns × 10 steps.
        assert_eq!(ctl.bus().pulses(Line::BigStepPulse), 80);
        assert_eq!(ctl.bus().pulses(Line::SmallStepPulse), 16);
    }
}
