//! Per-client poll state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::PollSettings;
use crate::core::resource::ResourceRateLimiter;
use crate::util::clock::{tick_elapsed, Tick};

/// Mutable poll state owned by one client handle.
///
/// Only the poll coordinator mutates this, once per tick, so it carries no
/// internal synchronisation.
#[derive(Debug, Clone)]
pub struct PollMetrics {
    /// Priority partition of the owning client.
    pub priority: i32,
    /// Fraction of available slots this client may claim.
    pub capacity_percentage: f64,
    /// Slots requested during the current cycle.
    pub poll_attempted_batch: u32,
    /// Messages actually retrieved during the current cycle.
    pub poll_achieved_batch: u32,
    /// Poll ticks left to skip before polling again.
    pub skip_count: u32,
    /// Wait time handed to the fabric on each poll.
    pub fabric_poll_wait_time: Option<Duration>,
    /// Lower bound for the fabric wait and the gap between polls.
    pub min_wait: Duration,
    /// Upper bound for the fabric wait and the gap between polls.
    pub max_wait: Duration,
    /// Amount the fabric wait moves per recalculation.
    pub fabric_wait_step: Duration,
    /// Tick of the last completed poll.
    pub last_poll_tick: Option<Tick>,
    /// Tick of the last priority calculation.
    pub priority_tick: Option<Tick>,
    /// Queue backlog seen at the last priority calculation.
    pub priority_queue_length: Option<u64>,
    /// Last computed priority key.
    pub priority_calculated: i64,
    /// Multiplier applied to the priority key.
    pub priority_weighting: f64,
    /// Success rate above which the maximum wait starts shrinking.
    pub poll_time_reduce_ratio: Option<f64>,
    /// Skip count applied when no poll has ever succeeded.
    pub skip_count_fallback: u32,
    /// Completed polls.
    pub polls: u64,
    /// Completed polls that returned at least one message.
    pub poll_hits: u64,
    rate_limiter: Option<Arc<ResourceRateLimiter>>,
}

impl PollMetrics {
    /// Create metrics for a client at `priority` using the pool's poll settings.
    #[must_use]
    pub fn new(priority: i32, weighting: f64, settings: &PollSettings) -> Self {
        Self {
            priority,
            capacity_percentage: 1.0,
            poll_attempted_batch: 0,
            poll_achieved_batch: 0,
            skip_count: 0,
            fabric_poll_wait_time: None,
            min_wait: settings.min_wait(),
            max_wait: settings.max_wait(),
            fabric_wait_step: settings.fabric_wait_step(),
            last_poll_tick: None,
            priority_tick: None,
            priority_queue_length: None,
            priority_calculated: 0,
            priority_weighting: weighting,
            poll_time_reduce_ratio: settings.poll_time_reduce_ratio,
            skip_count_fallback: settings.skip_count_fallback,
            polls: 0,
            poll_hits: 0,
            rate_limiter: None,
        }
    }

    /// Attach the resource rate limiter that throttles this client.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Option<Arc<ResourceRateLimiter>>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    /// Attached rate limiter, if any.
    #[must_use]
    pub const fn rate_limiter(&self) -> Option<&Arc<ResourceRateLimiter>> {
        self.rate_limiter.as_ref()
    }

    /// Current throttle from the rate limiter; 1.0 when none is attached.
    #[must_use]
    pub fn rate_limit_percentage(&self) -> f64 {
        self.rate_limiter
            .as_ref()
            .map_or(1.0, |l| l.rate_limit_adjustment_percentage())
    }

    /// Share of completed polls that returned messages.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.polls == 0 {
            0.0
        } else {
            self.poll_hits as f64 / self.polls as f64
        }
    }

    /// Record slots claimed for a poll.
    pub fn poll_begin(&mut self, slots: usize) {
        let slots = u32::try_from(slots).unwrap_or(u32::MAX);
        self.poll_attempted_batch = self.poll_attempted_batch.saturating_add(slots);
    }

    /// Record a completed poll that retrieved `achieved` messages.
    pub fn poll_end(&mut self, achieved: usize, now: Tick) {
        let achieved = u32::try_from(achieved).unwrap_or(u32::MAX);
        self.poll_achieved_batch = self.poll_achieved_batch.saturating_add(achieved);
        self.polls += 1;
        if achieved > 0 {
            self.poll_hits += 1;
        }
        self.last_poll_tick = Some(now);
    }

    /// Time since the last completed poll, or `None` if never polled.
    #[must_use]
    pub fn since_last_poll(&self, now: Tick) -> Option<Duration> {
        self.last_poll_tick.map(|last| tick_elapsed(now, last))
    }

    /// Whether this client has waited longer than its maximum allowed gap.
    /// A client that has never been polled is past due.
    #[must_use]
    pub fn is_past_due(&self, now: Tick) -> bool {
        self.since_last_poll(now)
            .is_none_or(|elapsed| elapsed > self.max_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_tracks_hits() {
        let mut m = PollMetrics::new(1, 1.0, &PollSettings::default());
        assert!(m.success_rate().abs() < f64::EPSILON);
        m.poll_end(3, 10);
        m.poll_end(0, 20);
        assert!((m.success_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(m.poll_achieved_batch, 3);
        assert_eq!(m.last_poll_tick, Some(20));
    }

    #[test]
    fn test_past_due() {
        let mut m = PollMetrics::new(1, 1.0, &PollSettings::default());
        assert!(m.is_past_due(0));
        m.poll_end(1, 1_000);
        assert!(!m.is_past_due(5_000));
        assert!(m.is_past_due(11_001));
    }

    #[test]
    fn test_no_limiter_means_full_rate() {
        let m = PollMetrics::new(1, 1.0, &PollSettings::default());
        assert!((m.rate_limit_percentage() - 1.0).abs() < f64::EPSILON);
        assert!(m.rate_limiter().is_none());
    }
}
