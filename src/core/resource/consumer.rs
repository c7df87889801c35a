//! Caller-facing handle that records dependency calls against shared statistics.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::statistics::{ResourceRequestResult, ResourceRetryReason, ResourceStatistics};

/// Binds a caller-supplied name to one [`ResourceStatistics`].
///
/// Several consumers may share the same statistics object; the name only
/// identifies who is calling.
#[derive(Debug, Clone)]
pub struct ResourceConsumer {
    name: String,
    statistics: Arc<ResourceStatistics>,
}

impl ResourceConsumer {
    /// Create a consumer over shared statistics.
    pub fn new(name: impl Into<String>, statistics: Arc<ResourceStatistics>) -> Self {
        Self {
            name: name.into(),
            statistics,
        }
    }

    /// Consumer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Statistics this consumer records into.
    #[must_use]
    pub const fn statistics(&self) -> &Arc<ResourceStatistics> {
        &self.statistics
    }

    /// Start tracking a request with a caller-chosen id.
    pub fn start(&self, group: impl Into<String>, id: Uuid) -> Uuid {
        self.statistics.start(group, id)
    }

    /// Start tracking a request with a generated id.
    pub fn begin(&self, group: impl Into<String>) -> Uuid {
        self.start(group, Uuid::new_v4())
    }

    /// Finish a tracked request.
    pub fn end(&self, id: Uuid, start_time: Instant, result: ResourceRequestResult) {
        self.statistics.end(id, start_time, result);
    }

    /// Record a retry.
    pub fn retry(&self, id: Uuid, start_time: Instant, reason: ResourceRetryReason) {
        self.statistics.retry(id, start_time, reason);
    }

    /// Record an exception.
    pub fn exception(&self, id: Uuid, start_time: Instant) {
        self.statistics.exception(id, start_time);
    }
}
