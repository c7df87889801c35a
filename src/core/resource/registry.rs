//! Registry of named resource statistics, consumers and rate limiters.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::ResourceProfile;
use crate::core::collector::{CollectorEvent, DataCollector, ResourceEventKind};

use super::consumer::ResourceConsumer;
use super::rate_limiter::ResourceRateLimiter;
use super::statistics::{ResourceStatistics, ResourceStatus};

/// Creates and looks up [`ResourceStatistics`] by name.
///
/// Exactly one statistics object exists per name, even when many threads
/// reference a new name at once: creation goes through a single
/// `DashMap::entry` create-or-get under the shard lock.
pub struct ResourceRegistry {
    statistics: DashMap<String, Arc<ResourceStatistics>>,
    consumers: DashMap<String, Arc<ResourceConsumer>>,
    rate_limiters: DashMap<String, Arc<ResourceRateLimiter>>,
    collector: Option<Arc<dyn DataCollector>>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    /// Create an empty registry with no collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            statistics: DashMap::new(),
            consumers: DashMap::new(),
            rate_limiters: DashMap::new(),
            collector: None,
        }
    }

    /// Attach a collector that receives resource lifecycle events.
    #[must_use]
    pub fn with_collector(mut self, collector: Arc<dyn DataCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Create-or-get the statistics for `name`.
    pub fn statistics(&self, name: &str) -> Arc<ResourceStatistics> {
        if let Some(existing) = self.statistics.get(name) {
            return Arc::clone(existing.value());
        }
        let created = match self.statistics.entry(name.to_string()) {
            Entry::Occupied(entry) => return Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                Arc::clone(entry.insert(Arc::new(ResourceStatistics::new(name))).value())
            }
        };
        tracing::debug!(resource = %name, "resource statistics created");
        self.emit(CollectorEvent::resource(ResourceEventKind::Created, name, None));
        created
    }

    /// Register a consumer of the profile's dependency.
    pub fn register_consumer(
        &self,
        name: impl Into<String>,
        profile: &ResourceProfile,
    ) -> Arc<ResourceConsumer> {
        let name = name.into();
        let consumer = Arc::new(ResourceConsumer::new(
            name.clone(),
            self.statistics(&profile.id),
        ));
        self.consumers.insert(name, Arc::clone(&consumer));
        consumer
    }

    /// Register a rate limiter over the given profiles.
    pub fn register_request_rate_limiter(
        &self,
        name: impl Into<String>,
        profiles: &[ResourceProfile],
    ) -> Arc<ResourceRateLimiter> {
        let name = name.into();
        let stats = profiles.iter().map(|p| self.statistics(&p.id)).collect();
        let limiter = Arc::new(ResourceRateLimiter::new(name.clone(), stats));
        self.rate_limiters.insert(name, Arc::clone(&limiter));
        limiter
    }

    /// Status snapshot for a named resource, if it has been referenced.
    pub fn resource_status_get(&self, name: &str) -> Option<ResourceStatus> {
        self.statistics.get(name).map(|s| s.snapshot())
    }

    /// Names of every known resource.
    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.statistics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Registered consumer by name.
    pub fn consumer(&self, name: &str) -> Option<Arc<ResourceConsumer>> {
        self.consumers.get(name).map(|c| Arc::clone(c.value()))
    }

    /// Registered rate limiter by name.
    pub fn rate_limiter(&self, name: &str) -> Option<Arc<ResourceRateLimiter>> {
        self.rate_limiters.get(name).map(|l| Arc::clone(l.value()))
    }

    /// Emit a keep-alive event with a snapshot for every known resource.
    pub fn keep_alive(&self) {
        let statuses: Vec<_> = self.statistics.iter().map(|s| s.snapshot()).collect();
        for status in statuses {
            let name = status.name.clone();
            self.emit(CollectorEvent::resource(
                ResourceEventKind::KeepAlive,
                name,
                Some(status),
            ));
        }
    }

    fn emit(&self, event: CollectorEvent) {
        if let Some(collector) = &self.collector {
            collector.write(event);
        }
    }
}
