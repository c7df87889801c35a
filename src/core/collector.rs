//! Data collector sinks.
//!
//! Resource lifecycle events and pool log/exception messages are written to
//! an injected [`DataCollector`]. An in-memory ring buffer and a
//! tracing-forwarding sink are provided.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::resource::ResourceStatus;
use crate::util::clock::now_ms;

/// Resource lifecycle stage reported to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceEventKind {
    /// Statistics for a new resource name were created.
    Created,
    /// Periodic status report for an existing resource.
    KeepAlive,
}

/// Severity of a collector log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Something degraded but recoverable.
    Warning,
    /// An operation failed.
    Error,
}

/// Event delivered to a [`DataCollector`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CollectorEvent {
    /// Resource lifecycle event.
    Resource {
        /// Lifecycle stage.
        kind: ResourceEventKind,
        /// Resource name.
        name: String,
        /// Status snapshot, present on keep-alive.
        status: Option<ResourceStatus>,
        /// Timestamp milliseconds.
        at_ms: u128,
    },
    /// Log message.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
        /// Timestamp milliseconds.
        at_ms: u128,
    },
    /// Exception raised by a pool operation.
    Exception {
        /// What was being attempted.
        message: String,
        /// The error text.
        error: String,
        /// Timestamp milliseconds.
        at_ms: u128,
    },
}

impl CollectorEvent {
    /// Build a resource lifecycle event stamped now.
    pub fn resource(
        kind: ResourceEventKind,
        name: impl Into<String>,
        status: Option<ResourceStatus>,
    ) -> Self {
        Self::Resource {
            kind,
            name: name.into(),
            status,
            at_ms: now_ms(),
        }
    }

    /// Build a log event stamped now.
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
            at_ms: now_ms(),
        }
    }

    /// Build an exception event stamped now.
    pub fn exception(message: impl Into<String>, error: impl ToString) -> Self {
        Self::Exception {
            message: message.into(),
            error: error.to_string(),
            at_ms: now_ms(),
        }
    }
}

/// Collector sink abstraction.
pub trait DataCollector: Send + Sync {
    /// Write an event to the sink.
    fn write(&self, event: CollectorEvent);
}

/// Bounded in-memory collector for testing and dev.
pub struct InMemoryCollector {
    events: Mutex<VecDeque<CollectorEvent>>,
    max_events: usize,
}

impl InMemoryCollector {
    /// Create a new in-memory collector with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<CollectorEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Count stored resource events of the given kind.
    pub fn resource_events(&self, kind: ResourceEventKind) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, CollectorEvent::Resource { kind: k, .. } if *k == kind))
            .count()
    }
}

impl DataCollector for InMemoryCollector {
    fn write(&self, event: CollectorEvent) {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return;
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Collector that forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCollector;

impl DataCollector for TracingCollector {
    fn write(&self, event: CollectorEvent) {
        match event {
            CollectorEvent::Resource { kind, name, status, .. } => {
                tracing::debug!(resource = %name, ?kind, ?status, "resource event");
            }
            CollectorEvent::Log { level, message, .. } => match level {
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warning => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
            CollectorEvent::Exception { message, error, .. } => {
                tracing::error!(error = %error, "{message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_collector_overflow() {
        let sink = InMemoryCollector::new(2);
        sink.write(CollectorEvent::log(LogLevel::Info, "one"));
        sink.write(CollectorEvent::log(LogLevel::Info, "two"));
        sink.write(CollectorEvent::log(LogLevel::Info, "three"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], CollectorEvent::Log { message, .. } if message == "two"));
        assert!(matches!(&events[1], CollectorEvent::Log { message, .. } if message == "three"));
    }

    #[test]
    fn test_resource_event_count() {
        let sink = InMemoryCollector::new(10);
        sink.write(CollectorEvent::resource(ResourceEventKind::Created, "db", None));
        sink.write(CollectorEvent::resource(ResourceEventKind::KeepAlive, "db", None));
        sink.write(CollectorEvent::exception("start", "boom"));
        assert_eq!(sink.resource_events(ResourceEventKind::Created), 1);
        assert_eq!(sink.resource_events(ResourceEventKind::KeepAlive), 1);
        assert_eq!(sink.events().len(), 3);
    }
}
