//! Poll slot allocation strategy.

use std::fmt;

use crate::util::clock::{tick_count, Tick};

use super::PollMetrics;

/// Baseline priority key before backlog and idle time are added.
pub const PRIORITY_BASELINE: i64 = 0xFFFF_FFFF;

/// Scheduling strategy consulted by the poll coordinator on every tick.
///
/// One instance is shared by every client using the strategy; all per-client
/// state lives in the [`PollMetrics`] passed in.
pub trait PollAlgorithm: Send + Sync + fmt::Debug {
    /// Strategy name for logs and status.
    fn name(&self) -> &'static str;

    /// Number of poll slots to claim, never more than `available`.
    fn calculate_slots(&self, available: usize, metrics: &PollMetrics) -> usize;

    /// Whether the tick at `now` should be skipped for this client.
    fn should_skip_at(&self, metrics: &mut PollMetrics, now: Tick) -> bool;

    /// Whether the current tick should be skipped for this client.
    fn should_skip(&self, metrics: &mut PollMetrics) -> bool {
        self.should_skip_at(metrics, tick_count())
    }

    /// Zero the cycle counters and set a baseline capacity.
    fn capacity_reset(&self, metrics: &mut PollMetrics);

    /// Adapt capacity after a cycle completes.
    fn capacity_percentage_recalculate(&self, metrics: &mut PollMetrics);

    /// Produce the ranking key. Larger means more urgent.
    fn priority_recalculate(
        &self,
        queue_length: Option<u64>,
        metrics: &mut PollMetrics,
        now: Option<Tick>,
    ) -> i64;

    /// Adapt the fabric wait time and skip counter after a poll.
    fn poll_metrics_recalculate(&self, success: bool, has_errored: bool, metrics: &mut PollMetrics);

    /// Set the starting wait time.
    fn initialise_metrics(&self, metrics: &mut PollMetrics);

    /// Whether the client has gone unpolled longer than its maximum wait.
    fn past_due_calculate(&self, metrics: &PollMetrics, now: Option<Tick>) -> bool {
        metrics.is_past_due(now.unwrap_or_else(tick_count))
    }
}
