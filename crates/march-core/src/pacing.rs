//! Timer pacing for automatic stepping.
//!
//! Times are passed in as [`Duration`]s since an arbitrary caller-chosen
//! origin, so the model works with `Instant`, a browser clock or a test
//! counter alike.

use std::time::Duration;

use thiserror::Error;

/// Slowest accepted automatic-stepping rate, in operations per minute.
pub const MIN_OPS_PER_MINUTE: u32 = 30;
/// Fastest accepted automatic-stepping rate, in operations per minute.
pub const MAX_OPS_PER_MINUTE: u32 = 3000;
/// Rate used when none is configured.
pub const DEFAULT_OPS_PER_MINUTE: u32 = 300;

const MILLIS_PER_MINUTE: u64 = 60_000;

/// Rejected stepping rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step rate {0} is outside 30..=3000 operations per minute")]
pub struct PacingError(pub u32);

/// A validated operations-per-minute rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepPacing {
    ops_per_minute: u32,
}

impl Default for StepPacing {
    fn default() -> Self {
        Self {
            ops_per_minute: DEFAULT_OPS_PER_MINUTE,
        }
    }
}

impl StepPacing {
    /// Validates a rate.
    ///
    /// # Errors
    ///
    /// Returns [`PacingError`] when the rate is outside
    /// [`MIN_OPS_PER_MINUTE`]`..=`[`MAX_OPS_PER_MINUTE`].
    pub const fn new(ops_per_minute: u32) -> Result<Self, PacingError> {
        if ops_per_minute < MIN_OPS_PER_MINUTE || ops_per_minute > MAX_OPS_PER_MINUTE {
            return Err(PacingError(ops_per_minute));
        }
        Ok(Self { ops_per_minute })
    }

    /// Configured rate.
    #[must_use]
    pub const fn ops_per_minute(self) -> u32 {
        self.ops_per_minute
    }

    /// Timer interval between steps, `60000 / rate` milliseconds.
    #[must_use]
    pub const fn interval(self) -> Duration {
        Duration::from_millis(MILLIS_PER_MINUTE / self.ops_per_minute as u64)
    }
}

/// Cancellable periodic step scheduler.
///
/// The caller polls; each `true` answer means exactly one step is due. A
/// step is never split, so [`AutoStepper::stop`] between polls is always
/// safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoStepper {
    pacing: StepPacing,
    next_due: Option<Duration>,
}

impl AutoStepper {
    /// Creates a stopped scheduler.
    #[must_use]
    pub const fn new(pacing: StepPacing) -> Self {
        Self {
            pacing,
            next_due: None,
        }
    }

    /// Current pacing.
    #[must_use]
    pub const fn pacing(&self) -> StepPacing {
        self.pacing
    }

    /// Changes the rate. A running scheduler keeps its pending deadline.
    pub const fn set_pacing(&mut self, pacing: StepPacing) {
        self.pacing = pacing;
    }

    /// Starts the timer; the first step falls due one interval after `now`.
    pub fn start(&mut self, now: Duration) {
        self.next_due = Some(now + self.pacing.interval());
        tracing::debug!(
            ops_per_minute = self.pacing.ops_per_minute(),
            "automatic stepping started"
        );
    }

    /// Stops the timer.
    pub fn stop(&mut self) {
        if self.next_due.take().is_some() {
            tracing::debug!("automatic stepping stopped");
        }
    }

    /// Returns `true` while the timer is armed.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next step is due, zero when one is overdue.
    #[must_use]
    pub fn time_until_due(&self, now: Duration) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_sub(now))
    }

    /// Returns `true` when a step is due at `now` and schedules the next
    /// one. A caller that fell behind gets one step, not a burst.
    pub fn poll(&mut self, now: Duration) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        let interval = self.pacing.interval();
        let mut next = due + interval;
        if next <= now {
            next = now + interval;
        }
        self.next_due = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::{
        AutoStepper, PacingError, StepPacing, DEFAULT_OPS_PER_MINUTE, MAX_OPS_PER_MINUTE,
        MIN_OPS_PER_MINUTE,
    };

    const fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[rstest]
    #[case(MIN_OPS_PER_MINUTE, 2000)]
    #[case(DEFAULT_OPS_PER_MINUTE, 200)]
    #[case(600, 100)]
    #[case(MAX_OPS_PER_MINUTE, 20)]
    fn interval_is_a_minute_divided_by_rate(#[case] rate: u32, #[case] expected_ms: u64) {
        assert_eq!(StepPacing::new(rate).unwrap().interval(), ms(expected_ms));
    }

    #[rstest]
    #[case(0)]
    #[case(MIN_OPS_PER_MINUTE - 1)]
    #[case(MAX_OPS_PER_MINUTE + 1)]
    fn out_of_range_rates_are_rejected(#[case] rate: u32) {
        assert_eq!(StepPacing::new(rate), Err(PacingError(rate)));
    }

    #[test]
    fn default_pacing_uses_default_rate() {
        assert_eq!(StepPacing::default().ops_per_minute(), DEFAULT_OPS_PER_MINUTE);
    }

    #[test]
    fn stopped_stepper_never_fires() {
        let mut stepper = AutoStepper::default();
        assert!(!stepper.is_running());
        assert!(!stepper.poll(ms(10_000)));
        assert_eq!(stepper.time_until_due(ms(0)), None);
    }

    #[test]
    fn fires_once_per_interval() {
        let mut stepper = AutoStepper::new(StepPacing::new(600).unwrap());
        stepper.start(ms(0));
        assert!(!stepper.poll(ms(99)));
        assert_eq!(stepper.time_until_due(ms(40)), Some(ms(60)));
        assert!(stepper.poll(ms(100)));
        assert!(!stepper.poll(ms(150)));
        assert!(stepper.poll(ms(205)));
        assert_eq!(stepper.time_until_due(ms(205)), Some(ms(95)));
    }

    #[test]
    fn late_poll_does_not_burst() {
        let mut stepper = AutoStepper::new(StepPacing::new(600).unwrap());
        stepper.start(ms(0));
        assert!(stepper.poll(ms(1_000)));
        assert!(!stepper.poll(ms(1_000)));
        assert!(stepper.poll(ms(1_100)));
    }

    #[test]
    fn stop_cancels_pending_step() {
        let mut stepper = AutoStepper::new(StepPacing::default());
        stepper.start(ms(0));
        stepper.stop();
        assert!(!stepper.is_running());
        assert!(!stepper.poll(ms(1_000)));
    }
}
