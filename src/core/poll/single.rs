//! Allocation for a partition served by exactly one client.

use crate::util::clock::{tick_count, Tick};

use super::algorithm::{PollAlgorithm, PRIORITY_BASELINE};
use super::PollMetrics;

/// Strategy for a lone client: no contention, no fairness pressure.
///
/// Every slot is claimed, nothing is skipped and the fabric wait sits at the
/// maximum so the client only wakes when there is work.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleClientPollAlgorithm;

impl SingleClientPollAlgorithm {
    /// Create the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PollAlgorithm for SingleClientPollAlgorithm {
    fn name(&self) -> &'static str {
        "single"
    }

    fn calculate_slots(&self, available: usize, _metrics: &PollMetrics) -> usize {
        available
    }

    fn should_skip_at(&self, _metrics: &mut PollMetrics, _now: Tick) -> bool {
        false
    }

    fn capacity_reset(&self, metrics: &mut PollMetrics) {
        metrics.poll_attempted_batch = 0;
        metrics.poll_achieved_batch = 0;
        metrics.capacity_percentage = 1.0;
    }

    fn capacity_percentage_recalculate(&self, metrics: &mut PollMetrics) {
        metrics.capacity_percentage = 1.0;
    }

    fn priority_recalculate(
        &self,
        queue_length: Option<u64>,
        metrics: &mut PollMetrics,
        now: Option<Tick>,
    ) -> i64 {
        metrics.priority_tick = Some(now.unwrap_or_else(tick_count));
        metrics.priority_queue_length = queue_length;
        metrics.priority_calculated = PRIORITY_BASELINE;
        PRIORITY_BASELINE
    }

    fn poll_metrics_recalculate(&self, _success: bool, _has_errored: bool, metrics: &mut PollMetrics) {
        metrics.skip_count = 0;
    }

    fn initialise_metrics(&self, metrics: &mut PollMetrics) {
        metrics.fabric_poll_wait_time = Some(metrics.max_wait);
        self.capacity_reset(metrics);
    }
}
