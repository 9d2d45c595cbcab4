//! # Rate control
//!
//! Keeps the control loop running at a fixed period regardless of how long
//! each cycle's work takes. Time is read through the [`Clock`] trait so the
//! loop can be driven by a [`ManualClock`] in tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::{
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

// External
use log::{debug, warn};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of monotonic time which can also block the caller.
pub trait Clock: Send + 'static {
    /// Time since the clock's epoch.
    fn now(&self) -> Duration;

    /// Block for the given duration.
    fn sleep(&self, duration: Duration);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock time, measured from the clock's creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

/// A clock which only moves when slept on or advanced.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

/// Statistics about the cycles run by a [`RateController`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateStats {
    /// Number of calls to `wait_for_next_tick`
    pub num_ticks: u64,

    /// Number of cycles that took longer than the period
    pub num_overruns: u64,

    /// Current number of back to back overruns
    pub num_consec_overruns: u64,

    /// Longest overrun seen so far
    pub max_overrun: Duration,
}

/// Sleeps for whatever is left of the period since the previous tick.
///
/// Overruns are not caught up, after an overrun the next cycle starts
/// immediately and the period is measured from there.
#[derive(Debug)]
pub struct RateController<C: Clock> {
    clock: C,
    period: Duration,

    /// When the current cycle started
    previous: Duration,

    /// When the controller was created
    start: Duration,

    stats: RateStats,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward, simulating work done by the caller.
    pub fn advance(&self, duration: Duration) {
        *self.lock() += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Duration> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);

        // Give other threads a chance to run, as a real sleep would
        thread::yield_now();
    }
}

impl<C: Clock> RateController<C> {
    /// Create a new controller, the first cycle starts now.
    pub fn new(clock: C, period: Duration) -> Self {
        let start = clock.now();

        Self {
            clock,
            period,
            previous: start,
            start,
            stats: RateStats::default(),
        }
    }

    /// Sleep until the end of the current cycle and start the next one.
    ///
    /// Returns the time slept, which is zero if the cycle overran.
    pub fn wait_for_next_tick(&mut self) -> Duration {
        let current = self.clock.now();
        let cycle_dur = current.saturating_sub(self.previous);

        self.stats.num_ticks += 1;

        let sleep = match self.period.checked_sub(cycle_dur) {
            Some(d) => {
                self.stats.num_consec_overruns = 0;
                self.clock.sleep(d);
                d
            }
            None => {
                let overrun = cycle_dur - self.period;

                self.stats.num_overruns += 1;
                self.stats.num_consec_overruns += 1;
                self.stats.max_overrun = self.stats.max_overrun.max(overrun);

                if self.stats.num_consec_overruns == 1 {
                    warn!("Cycle overran by {:.06} s", overrun.as_secs_f64());
                } else {
                    debug!(
                        "Cycle overran by {:.06} s ({} consecutive overruns)",
                        overrun.as_secs_f64(),
                        self.stats.num_consec_overruns
                    );
                }

                Duration::ZERO
            }
        };

        self.previous = current + sleep;

        sleep
    }

    /// Time since the controller was created.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.start)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> &RateStats {
        &self.stats
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(10);

    #[test]
    fn test_sleeps_remainder() {
        let clock = ManualClock::new();
        let mut rate = RateController::new(clock.clone(), PERIOD);

        clock.advance(Duration::from_millis(3));
        assert_eq!(rate.wait_for_next_tick(), Duration::from_millis(7));
        assert_eq!(clock.now(), PERIOD);

        // No work, full period
        assert_eq!(rate.wait_for_next_tick(), PERIOD);
        assert_eq!(clock.now(), 2 * PERIOD);

        assert_eq!(rate.stats().num_ticks, 2);
        assert_eq!(rate.stats().num_overruns, 0);
        assert_eq!(rate.elapsed(), 2 * PERIOD);
    }

    #[test]
    fn test_overrun_not_caught_up() {
        let clock = ManualClock::new();
        let mut rate = RateController::new(clock.clone(), PERIOD);

        clock.advance(Duration::from_millis(25));
        assert_eq!(rate.wait_for_next_tick(), Duration::ZERO);
        assert_eq!(rate.stats().num_overruns, 1);
        assert_eq!(rate.stats().max_overrun, Duration::from_millis(15));

        // The next cycle is measured from the end of the overrun, not from
        // where the missed ticks would have been
        clock.advance(Duration::from_millis(4));
        assert_eq!(rate.wait_for_next_tick(), Duration::from_millis(6));
        assert_eq!(clock.now(), Duration::from_millis(35));
        assert_eq!(rate.stats().num_consec_overruns, 0);
    }

    #[test]
    fn test_consecutive_overruns() {
        let clock = ManualClock::new();
        let mut rate = RateController::new(clock.clone(), PERIOD);

        for _ in 0..3 {
            clock.advance(Duration::from_millis(12));
            rate.wait_for_next_tick();
        }

        assert_eq!(rate.stats().num_overruns, 3);
        assert_eq!(rate.stats().num_consec_overruns, 3);
        assert_eq!(rate.stats().max_overrun, Duration::from_millis(2));
    }

    #[test]
    fn test_system_clock() {
        let clock = SystemClock::new();
        let mut rate = RateController::new(clock, Duration::from_millis(2));

        let before = clock.now();
        rate.wait_for_next_tick();
        assert!(clock.now() - before >= Duration::from_millis(1));
    }
}
