//! Fixed-period crossfade scheduler
//!
//! Owns one timer deadline at a time. The first cycle fires one period after
//! [`Scheduler::run`] starts; each later deadline is armed only after the
//! previous cycle finished. Deadlines that passed while a cycle was running are
//! skipped (counted and logged), never queued, so cycles cannot overlap.
//!
//! Shutdown abandons a cycle mid-ramp; crossfade state is not persisted.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use loopfade_common::human_time::format_duration;

use super::engine::CrossfadeEngine;
use crate::control::ControlChannel;
use crate::error::{Error, Result};

/// Default period between cycle starts
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(60_000);

/// Summary of one scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Cycles that ran to completion
    pub cycles_completed: u64,
    /// Deadlines skipped because a cycle overran them
    pub ticks_skipped: u64,
    /// Commands that failed across all cycles
    pub failed_commands: usize,
    /// A cycle was in progress when shutdown arrived
    pub abandoned_cycle: bool,
}

/// Fires one crossfade cycle per period
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    /// `period` must be non-zero
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::Config("scheduler period must be non-zero".to_string()));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Next deadline not earlier than `now`, and how many deadlines were passed over.
    ///
    /// Deadlines lie on the grid `previous + k * period`; the skip count is
    /// computed directly rather than by stepping through the grid.
    pub fn next_deadline(&self, previous: Instant, now: Instant) -> (Instant, u64) {
        let first = previous + self.period;
        if first >= now {
            return (first, 0);
        }

        let period = self.period.as_nanos();
        let behind = (now - first).as_nanos();
        let remainder = behind % period;
        let skipped = behind / period + u128::from(remainder != 0);

        let deadline = if remainder == 0 {
            now
        } else {
            // remainder < period, so it fits whenever the period does
            now + (self.period - Duration::from_nanos(u64::try_from(remainder).unwrap_or(u64::MAX)))
        };
        (deadline, u64::try_from(skipped).unwrap_or(u64::MAX))
    }

    /// Run cycles until `shutdown` resolves
    pub async fn run<C, F>(&self, engine: &mut CrossfadeEngine<C>, shutdown: F) -> SchedulerReport
    where
        C: ControlChannel,
        F: Future<Output = ()>,
    {
        let mut report = SchedulerReport::default();
        let mut shutdown = std::pin::pin!(shutdown);
        let mut deadline = Instant::now() + self.period;

        info!(
            "Scheduler started: crossfade every {}",
            format_duration(self.period)
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = sleep_until(deadline) => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    report.abandoned_cycle = true;
                    break;
                }
                outcome = engine.run_cycle() => outcome,
            };

            report.cycles_completed += 1;
            report.failed_commands += outcome.report.failures.len();

            let (next, skipped) = self.next_deadline(deadline, Instant::now());
            if skipped > 0 {
                warn!(
                    "Crossfade took {} (period {}); skipping {} scheduled cycle(s)",
                    format_duration(outcome.report.elapsed),
                    format_duration(self.period),
                    skipped
                );
                report.ticks_skipped += skipped;
            }
            deadline = next;
        }

        if report.abandoned_cycle {
            warn!(
                "Scheduler stopping; crossfade {} abandoned mid-ramp (engine {:?})",
                engine.cycles_completed() + 1,
                engine.phase()
            );
        }
        report
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_without_overrun() {
        let scheduler = Scheduler::new(Duration::from_secs(60)).unwrap();
        let start = Instant::now();

        let (deadline, skipped) = scheduler.next_deadline(start, start + Duration::from_secs(10));
        assert_eq!(deadline, start + Duration::from_secs(60));
        assert_eq!(skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_skips_passed_ticks() {
        let scheduler = Scheduler::new(Duration::from_secs(60)).unwrap();
        let start = Instant::now();

        let (deadline, skipped) = scheduler.next_deadline(start, start + Duration::from_secs(150));
        assert_eq!(deadline, start + Duration::from_secs(180));
        assert_eq!(skipped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_due_now_is_kept() {
        let scheduler = Scheduler::new(Duration::from_secs(60)).unwrap();
        let start = Instant::now();

        let (deadline, skipped) = scheduler.next_deadline(start, start + Duration::from_secs(60));
        assert_eq!(deadline, start + Duration::from_secs(60));
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(Scheduler::new(Duration::ZERO), Err(Error::Config(_))));
        assert_eq!(Scheduler::default().period(), DEFAULT_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_with_tiny_period_is_direct() {
        let scheduler = Scheduler::new(Duration::from_nanos(1)).unwrap();
        let start = Instant::now();
        let now = start + Duration::from_millis(200);

        let (deadline, skipped) = scheduler.next_deadline(start, now);
        assert_eq!(deadline, now);
        assert_eq!(skipped, 199_999_999);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_deadline_partial_period_behind() {
        let scheduler = Scheduler::new(Duration::from_secs(5)).unwrap();
        let start = Instant::now();

        // Cycle ran from 5s to 17s: 10s and 15s were missed, 20s is next
        let (deadline, skipped) =
            scheduler.next_deadline(start + Duration::from_secs(5), start + Duration::from_secs(17));
        assert_eq!(deadline, start + Duration::from_secs(20));
        assert_eq!(skipped, 2);
    }
}
