//! Core scheduling abstractions: resource tracking, poll strategies and the
//! client pool.

pub mod client;
pub mod client_pool;
pub mod collector;
pub mod error;
pub mod poll;
pub mod resource;

pub use client::{ClientHandle, ClientStatus, FabricClient, FabricClientFactory};
pub use client_pool::{resolve_default_priority, ClientPool, PollCandidate, Spawn};
pub use collector::{
    CollectorEvent, DataCollector, InMemoryCollector, LogLevel, ResourceEventKind,
    TracingCollector,
};
pub use error::{AppResult, ClientPoolError};
pub use poll::{
    MultiClientPollAlgorithm, PollAlgorithm, PollMetrics, SingleClientPollAlgorithm,
    PRIORITY_BASELINE,
};
pub use resource::{
    CircuitBreakerState, RateLimiterStatus, RequestTrack, ResourceConsumer, ResourceRateLimiter,
    ResourceRegistry, ResourceRequestResult, ResourceRetryReason, ResourceStatistics,
    ResourceStatus,
};
