//! Recording simulation bus.
//!
//! The `SimulationBus` implements the `StepBus` trait with no hardware
//! behind it: every write is recorded in an ordered log, per-line rising
//! edges are counted, and the current level of each line is tracked in a
//! `LineMask` snapshot. This is the backend behind dry runs and the
//! integration test suite.

use tracing::trace;
use winder_common::consts::LINE_COUNT;
use winder_common::hal::{HalError, Line, LineLevel, LineMask, StepBus};

/// One recorded line write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Line that was written.
    pub line: Line,
    /// Level it was driven to.
    pub level: LineLevel,
}

/// Simulation backend recording all output-line activity.
///
/// All lines start LOW, matching the de-energized state of the physical
/// drivers at power-on.
#[derive(Debug, Default)]
pub struct SimulationBus {
    /// Current level of every line.
    levels: LineMask,
    /// Ordered log of every write (including writes that do not change
    /// the level, e.g. re-asserting the enable line).
    log: Vec<Transition>,
    /// Rising-edge count per line, indexed by `Line::bit()`.
    rising_edges: [u64; LINE_COUNT],
}

impl SimulationBus {
    /// Create a new simulation bus with all lines LOW.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a line.
    #[inline]
    pub fn level(&self, line: Line) -> LineLevel {
        if self.levels.contains(LineMask::for_line(line)) {
            LineLevel::High
        } else {
            LineLevel::Low
        }
    }

    /// Snapshot of all line levels.
    #[inline]
    pub fn levels(&self) -> LineMask {
        self.levels
    }

    /// Ordered log of every recorded write.
    pub fn transitions(&self) -> &[Transition] {
        &self.log
    }

    /// Number of Low→High edges seen on a line.
    ///
    /// One pulse is one HIGH-then-LOW transition pair, so this is the
    /// pulse count for the two step lines.
    #[inline]
    pub fn pulses(&self, line: Line) -> u64 {
        self.rising_edges[line.bit() as usize]
    }

    /// Level of `SmallStepDir` captured at each `SmallStepPulse` rising
    /// edge, in emission order.
    ///
    /// Replays the log, so it reflects the direction the feed motor
    /// actually stepped in — the property the layer-alternation tests
    /// assert.
    pub fn feed_levels_at_small_pulses(&self) -> Vec<LineLevel> {
        let mut dir = LineLevel::Low;
        let mut pulse = LineLevel::Low;
        let mut captured = Vec::new();
        for t in &self.log {
            match t.line {
                Line::SmallStepDir => dir = t.level,
                Line::SmallStepPulse => {
                    if pulse == LineLevel::Low && t.level == LineLevel::High {
                        captured.push(dir);
                    }
                    pulse = t.level;
                }
                _ => {}
            }
        }
        captured
    }

    /// Clear the log and edge counters. Line levels are preserved.
    pub fn clear(&mut self) {
        self.log.clear();
        self.rising_edges = [0; LINE_COUNT];
    }
}

impl StepBus for SimulationBus {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn write(&mut self, line: Line, level: LineLevel) -> Result<(), HalError> {
        trace!("sim write: {line:?} -> {level:?}");

        let mask = LineMask::for_line(line);
        let was_high = self.levels.contains(mask);
        match level {
            LineLevel::High => {
                if !was_high {
                    self.rising_edges[line.bit() as usize] += 1;
                }
                self.levels.insert(mask);
            }
            LineLevel::Low => {
                self.levels.remove(mask);
            }
        }
        self.log.push(Transition { line, level });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_start_low() {
        let bus = SimulationBus::new();
        for line in Line::ALL {
            assert_eq!(bus.level(line), LineLevel::Low);
        }
        assert!(bus.transitions().is_empty());
    }

    #[test]
    fn pulse_counting_counts_rising_edges_only() {
        let mut bus = SimulationBus::new();
        for _ in 0..3 {
            bus.write(Line::BigStepPulse, LineLevel::High).unwrap();
            bus.write(Line::BigStepPulse, LineLevel::Low).unwrap();
        }
        // Re-asserting HIGH twice is one edge.
        bus.write(Line::BigStepEnable, LineLevel::High).unwrap();
        bus.write(Line::BigStepEnable, LineLevel::High).unwrap();

        assert_eq!(bus.pulses(Line::BigStepPulse), 3);
        assert_eq!(bus.pulses(Line::BigStepEnable), 1);
        assert_eq!(bus.pulses(Line::SmallStepPulse), 0);
    }

    #[test]
    fn level_snapshot_tracks_writes() {
        let mut bus = SimulationBus::new();
        bus.write(Line::BigStepEnable, LineLevel::High).unwrap();
        bus.write(Line::BigStepDir, LineLevel::High).unwrap();
        assert_eq!(
            bus.levels(),
            LineMask::BIG_STEP_ENABLE | LineMask::BIG_STEP_DIR
        );

        bus.write(Line::BigStepEnable, LineLevel::Low).unwrap();
        assert_eq!(bus.levels(), LineMask::BIG_STEP_DIR);
    }

    #[test]
    fn feed_levels_captured_at_small_pulse_edges() {
        let mut bus = SimulationBus::new();
        // Forward pulse.
        bus.write(Line::SmallStepDir, LineLevel::High).unwrap();
        bus.write(Line::SmallStepPulse, LineLevel::High).unwrap();
        bus.write(Line::SmallStepPulse, LineLevel::Low).unwrap();
        // Reverse pulse.
        bus.write(Line::SmallStepDir, LineLevel::Low).unwrap();
        bus.write(Line::SmallStepPulse, LineLevel::High).unwrap();
        bus.write(Line::SmallStepPulse, LineLevel::Low).unwrap();

        assert_eq!(
            bus.feed_levels_at_small_pulses(),
            vec![LineLevel::High, LineLevel::Low]
        );
    }

    #[test]
    fn clear_resets_log_but_keeps_levels() {
        let mut bus = SimulationBus::new();
        bus.write(Line::BigStepEnable, LineLevel::High).unwrap();
        bus.clear();
        assert!(bus.transitions().is_empty());
        assert_eq!(bus.pulses(Line::BigStepEnable), 0);
        assert_eq!(bus.level(Line::BigStepEnable), LineLevel::High);
    }
}
