//! Allocation for several prioritised clients sharing one slot budget.

use std::time::Duration;

use crate::util::clock::{tick_count, tick_delta, Tick};

use super::algorithm::{PollAlgorithm, PRIORITY_BASELINE};
use super::PollMetrics;

/// Capacity a client restarts from at the beginning of a cycle.
pub const CAPACITY_BASELINE: f64 = 0.75;
/// Lowest capacity a client can be squeezed to.
pub const CAPACITY_MIN: f64 = 0.01;
/// Highest capacity a client can grow to.
pub const CAPACITY_MAX: f64 = 0.95;
/// Growth factor applied when achieved tracks attempted.
pub const CAPACITY_GROWTH: f64 = 1.05;

/// Adaptive multi-client strategy.
///
/// Capacity follows an additive-increase style controller: a client that
/// fills the slots it asks for grows toward [`CAPACITY_MAX`], one that does
/// not shrinks toward [`CAPACITY_MIN`]. Clients that rarely have work are
/// skipped probabilistically, bounded by a maximum wait that shortens as the
/// success rate climbs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiClientPollAlgorithm;

impl MultiClientPollAlgorithm {
    /// Create the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Maximum gap between polls after adjusting for success rate.
    ///
    /// Above `poll_time_reduce_ratio` the gap shrinks linearly from
    /// `max_wait` to `min_wait` as the success rate approaches 1.
    #[must_use]
    pub fn max_wait_recalculate(&self, metrics: &PollMetrics) -> Duration {
        let Some(ratio) = metrics.poll_time_reduce_ratio else {
            return metrics.max_wait;
        };
        let rate = metrics.success_rate();
        if ratio >= 1.0 || rate <= ratio {
            return metrics.max_wait;
        }
        let fraction = ((rate - ratio) / (1.0 - ratio)).clamp(0.0, 1.0);
        let span = metrics.max_wait.saturating_sub(metrics.min_wait);
        metrics.max_wait.saturating_sub(span.mul_f64(fraction))
    }
}

impl PollAlgorithm for MultiClientPollAlgorithm {
    fn name(&self) -> &'static str {
        "multi"
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn calculate_slots(&self, available: usize, metrics: &PollMetrics) -> usize {
        if available == 0 {
            return 0;
        }
        let rate = (metrics.rate_limit_percentage() * 100.0).round() / 100.0;
        let slots = (available as f64 * metrics.capacity_percentage * rate).ceil();
        if slots.is_nan() || slots <= 0.0 {
            0
        } else {
            (slots as usize).min(available)
        }
    }

    fn should_skip_at(&self, metrics: &mut PollMetrics, now: Tick) -> bool {
        let Some(elapsed) = metrics.since_last_poll(now) else {
            return false;
        };
        if elapsed < metrics.min_wait {
            return true;
        }
        if elapsed > self.max_wait_recalculate(metrics) {
            return false;
        }
        metrics.skip_count = metrics.skip_count.saturating_sub(1);
        metrics.skip_count > 0
    }

    fn capacity_reset(&self, metrics: &mut PollMetrics) {
        metrics.poll_attempted_batch = 0;
        metrics.poll_achieved_batch = 0;
        metrics.capacity_percentage = CAPACITY_BASELINE;
    }

    fn capacity_percentage_recalculate(&self, metrics: &mut PollMetrics) {
        if metrics.poll_attempted_batch == 0 {
            return;
        }
        let achievement =
            f64::from(metrics.poll_achieved_batch) / f64::from(metrics.poll_attempted_batch);
        metrics.capacity_percentage = (metrics.capacity_percentage * achievement * CAPACITY_GROWTH)
            .clamp(CAPACITY_MIN, CAPACITY_MAX);
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn priority_recalculate(
        &self,
        queue_length: Option<u64>,
        metrics: &mut PollMetrics,
        now: Option<Tick>,
    ) -> i64 {
        let now = now.unwrap_or_else(tick_count);
        let backlog = i64::try_from(queue_length.unwrap_or(0)).unwrap_or(i64::MAX);
        // idle counts from the previous ranking, not the previous poll
        let idle = metrics
            .priority_tick
            .map_or(0, |since| i64::from(tick_delta(now, since)));

        let raw = PRIORITY_BASELINE.saturating_add(idle).saturating_add(backlog);
        // float to int casts saturate
        let key = (raw as f64 * metrics.priority_weighting) as i64;

        metrics.priority_tick = Some(now);
        metrics.priority_queue_length = queue_length;
        metrics.priority_calculated = key;
        key
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn poll_metrics_recalculate(&self, success: bool, has_errored: bool, metrics: &mut PollMetrics) {
        let current = metrics.fabric_poll_wait_time.unwrap_or(metrics.min_wait);
        let backlog = metrics.priority_queue_length.unwrap_or(0) > 0;
        let next = if success {
            current
                .saturating_sub(metrics.fabric_wait_step)
                .max(metrics.min_wait)
        } else if backlog {
            current
                .saturating_add(metrics.fabric_wait_step)
                .min(metrics.max_wait)
        } else {
            current
        };
        metrics.fabric_poll_wait_time = Some(next);

        if !has_errored {
            let rate = metrics.success_rate();
            metrics.skip_count = if rate <= 0.0 {
                metrics.skip_count_fallback
            } else {
                (1.0 / rate).round() as u32
            };
        }
    }

    fn initialise_metrics(&self, metrics: &mut PollMetrics) {
        metrics.fabric_poll_wait_time = Some(metrics.min_wait);
        self.capacity_reset(metrics);
    }
}
