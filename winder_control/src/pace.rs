//! Pulse-phase pacing.
//!
//! Each pulse phase (big-motor HIGH, big-motor LOW, small-motor width)
//! holds for a fixed duration; nothing else happens during the hold. The
//! `StepClock` trait is the seam between the controller and wall-clock
//! time: production uses `MonotonicClock` (absolute-deadline
//! `clock_nanosleep` on `CLOCK_MONOTONIC`, drift-free across millions of
//! pulses), tests use `NullClock`.

use nix::errno::Errno;
use nix::sys::time::TimeSpec;
use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};
use std::time::Duration;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Blocking hold between line transitions.
pub trait StepClock {
    /// Block for `duration`. The controller performs no other work during
    /// a hold.
    fn hold(&mut self, duration: Duration);
}

/// Absolute-time pacing on `CLOCK_MONOTONIC`.
///
/// Deadlines accumulate from the previous deadline rather than from "now",
/// so per-hold scheduling jitter does not drift the overall step rate. If
/// the loop falls behind (e.g. preempted without the `rt` feature), the
/// deadline base resets to the current time instead of bursting pulses to
/// catch up — a burst could out-run the motor drivers.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    deadline: Option<TimeSpec>,
}

impl MonotonicClock {
    /// Create a clock with no pending deadline.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepClock for MonotonicClock {
    fn hold(&mut self, duration: Duration) {
        let clock = ClockId::CLOCK_MONOTONIC;
        let Ok(now) = clock_gettime(clock) else {
            // Monotonic clock unavailable — degrade to relative sleep.
            std::thread::sleep(duration);
            return;
        };

        let base = match self.deadline {
            Some(deadline) if deadline > now => deadline,
            _ => now,
        };
        let deadline = timespec_add_ns(base, duration.as_nanos() as i64);

        loop {
            match clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &deadline) {
                Ok(_) => break,
                // Interrupted — resume toward the same absolute deadline.
                Err(Errno::EINTR) => continue,
                Err(_) => {
                    std::thread::sleep(duration);
                    break;
                }
            }
        }

        self.deadline = Some(deadline);
    }
}

/// No-op clock for tests and benches.
///
/// Records what would have been slept so tests can assert hold counts and
/// total pulse time without waiting for it.
#[derive(Debug, Default)]
pub struct NullClock {
    /// Number of holds requested.
    pub holds: u64,
    /// Sum of all requested hold durations.
    pub total_held: Duration,
}

impl NullClock {
    /// Create a zeroed null clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepClock for NullClock {
    fn hold(&mut self, duration: Duration) {
        self.holds += 1;
        self.total_held += duration;
    }
}

/// Add a nanosecond offset to a `TimeSpec`, normalizing the result.
fn timespec_add_ns(ts: TimeSpec, ns: i64) -> TimeSpec {
    let mut sec = ts.tv_sec() + ns / NANOS_PER_SEC;
    let mut nsec = ts.tv_nsec() + ns % NANOS_PER_SEC;
    if nsec >= NANOS_PER_SEC {
        sec += 1;
        nsec -= NANOS_PER_SEC;
    }
    TimeSpec::new(sec, nsec)
}
