//! Per-dependency in-flight request tracking.
//!
//! Many independent callers start, retry and end requests against the same
//! statistics object concurrently, so the active set lives in a [`DashMap`]
//! and the cumulative counters are lock-free atomics.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a tracked request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceRequestResult {
    /// Completed normally.
    Success,
    /// Failed with an exception.
    Exception,
    /// Gave up waiting on the dependency.
    Timeout,
    /// Abandoned by the caller.
    Cancelled,
}

/// Why a tracked request had to be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceRetryReason {
    /// The dependency did not answer in time.
    Timeout,
    /// The dependency asked the caller to back off.
    Throttle,
    /// Any other transient failure.
    Other,
}

/// One in-flight request against a dependency.
#[derive(Debug, Clone)]
pub struct RequestTrack {
    /// Request identifier.
    pub id: Uuid,
    /// Caller-defined grouping (operation name, entity type).
    pub group: String,
    /// When the request started.
    pub start_time: Instant,
    /// Retries recorded so far.
    pub retry_count: u32,
}

/// Point-in-time view of a [`ResourceStatistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// Resource name.
    pub name: String,
    /// Requests currently in flight.
    pub active: i64,
    /// Retries across the in-flight requests.
    pub retry_sum: u64,
    /// Average retries per in-flight request.
    pub retry_ratio: f64,
    /// Throttle signal in `[0, 1]`; 1 means no throttling.
    pub rate_limit_adjustment_percentage: f64,
    /// Requests started since creation.
    pub started: u64,
    /// Requests ended since creation.
    pub ended: u64,
    /// Requests that ended with a non-success result.
    pub failures: u64,
    /// Retries and exceptions recorded since creation.
    pub errors: u64,
    /// Mean elapsed time of ended requests.
    pub average_elapsed_ms: f64,
}

/// Tracks in-flight operations against one named dependency and derives a
/// throttle percentage from their retry pressure.
#[derive(Debug)]
pub struct ResourceStatistics {
    name: String,
    cutout_percentage: f64,
    active: DashMap<Uuid, RequestTrack>,
    active_count: AtomicI64,
    started: AtomicU64,
    ended: AtomicU64,
    failures: AtomicU64,
    errors: AtomicU64,
    elapsed_total_ms: AtomicU64,
}

impl ResourceStatistics {
    /// Create statistics with the default cutout percentage of 1.0.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_cutout(name, 1.0)
    }

    /// Create statistics with an explicit cutout percentage: the retry ratio
    /// at which the throttle reaches zero.
    pub fn with_cutout(name: impl Into<String>, cutout_percentage: f64) -> Self {
        Self {
            name: name.into(),
            cutout_percentage,
            active: DashMap::new(),
            active_count: AtomicI64::new(0),
            started: AtomicU64::new(0),
            ended: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            elapsed_total_ms: AtomicU64::new(0),
        }
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retry ratio at which the throttle reaches zero.
    #[must_use]
    pub const fn cutout_percentage(&self) -> f64 {
        self.cutout_percentage
    }

    /// Register a new in-flight request.
    ///
    /// Starting an id that is already active keeps the existing track and
    /// its retry count.
    pub fn start(&self, group: impl Into<String>, id: Uuid) -> Uuid {
        match self.active.entry(id) {
            Entry::Occupied(_) => return id,
            Entry::Vacant(slot) => {
                slot.insert(RequestTrack {
                    id,
                    group: group.into(),
                    start_time: Instant::now(),
                    retry_count: 0,
                });
            }
        }
        self.active_count.fetch_add(1, Ordering::AcqRel);
        self.started.fetch_add(1, Ordering::Relaxed);
        id
    }

    /// Remove a request. Unknown ids are ignored.
    pub fn end(&self, id: Uuid, start_time: Instant, result: ResourceRequestResult) {
        let Some((_, track)) = self.active.remove(&id) else {
            return;
        };
        self.active_count.fetch_sub(1, Ordering::AcqRel);
        self.ended.fetch_add(1, Ordering::Relaxed);
        if result != ResourceRequestResult::Success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        let elapsed = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.elapsed_total_ms.fetch_add(elapsed, Ordering::Relaxed);
        tracing::trace!(
            resource = %self.name,
            group = %track.group,
            retries = track.retry_count,
            elapsed_ms = elapsed,
            ?result,
            "resource request ended"
        );
    }

    /// Record a retry against an in-flight request. Unknown ids are ignored.
    pub fn retry(&self, id: Uuid, start_time: Instant, reason: ResourceRetryReason) {
        if self.bump_retry(id) {
            tracing::debug!(
                resource = %self.name,
                %id,
                ?reason,
                elapsed_ms = start_time.elapsed().as_millis(),
                "resource request retry"
            );
        }
    }

    /// Record an exception against an in-flight request. Counts as a retry.
    pub fn exception(&self, id: Uuid, start_time: Instant) {
        if self.bump_retry(id) {
            tracing::debug!(
                resource = %self.name,
                %id,
                elapsed_ms = start_time.elapsed().as_millis(),
                "resource request exception"
            );
        }
    }

    fn bump_retry(&self, id: Uuid) -> bool {
        let Some(mut track) = self.active.get_mut(&id) else {
            return false;
        };
        track.retry_count = track.retry_count.saturating_add(1);
        drop(track);
        self.errors.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Requests currently in flight.
    #[must_use]
    pub fn active_count(&self) -> i64 {
        self.active_count.load(Ordering::Acquire)
    }

    /// Sum of retries across in-flight requests.
    #[must_use]
    pub fn retry_sum(&self) -> u64 {
        self.active
            .iter()
            .map(|entry| u64::from(entry.value().retry_count))
            .sum()
    }

    /// Average retries per in-flight request; 0 when idle.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn retry_ratio(&self) -> f64 {
        let (count, sum) = self
            .active
            .iter()
            .fold((0_u64, 0_u64), |(c, s), entry| {
                (c + 1, s + u64::from(entry.value().retry_count))
            });
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    /// Throttle signal `clamp(1 - retry_ratio / cutout, 0, 1)`, recomputed on
    /// every read.
    #[must_use]
    pub fn rate_limit_adjustment_percentage(&self) -> f64 {
        let ratio = self.retry_ratio();
        if ratio <= 0.0 {
            return 1.0;
        }
        if self.cutout_percentage <= 0.0 {
            return 0.0;
        }
        (1.0 - ratio / self.cutout_percentage).clamp(0.0, 1.0)
    }

    /// Snapshot the current state.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> ResourceStatus {
        let ended = self.ended.load(Ordering::Relaxed);
        let elapsed = self.elapsed_total_ms.load(Ordering::Relaxed);
        ResourceStatus {
            name: self.name.clone(),
            active: self.active_count(),
            retry_sum: self.retry_sum(),
            retry_ratio: self.retry_ratio(),
            rate_limit_adjustment_percentage: self.rate_limit_adjustment_percentage(),
            started: self.started.load(Ordering::Relaxed),
            ended,
            failures: self.failures.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            average_elapsed_ms: if ended == 0 {
                0.0
            } else {
                elapsed as f64 / ended as f64
            },
        }
    }
}
