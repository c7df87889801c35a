//! # Prometheus Client Pool
//!
//! Adaptive client-poll scheduling with resource-based admission control and
//! resilient reconnect for message-fabric clients.
//!
//! A channel on the fabric is split into priority partitions, each served by
//! its own client (a listener or sender). This crate decides how those
//! clients share a bounded number of concurrent poll slots, throttles them
//! when downstream dependencies struggle, and reconnects failed clients
//! without operator intervention.
//!
//! ## Core Problem Solved
//!
//! - **Fair, adaptive polling**: several differently-prioritised clients
//!   compete for one slot budget; capacity, skip counters and wait times adapt
//!   to live success rate, queue backlog and idle time
//! - **Backpressure from dependencies**: retry pressure on datastores and
//!   other resources becomes a 0–1 throttle and a circuit breaker that feed
//!   straight into slot allocation
//! - **Self-healing clients**: a failed client is stopped and reconnected with
//!   linear backoff until it comes back, on its own task so the rest of the
//!   pool keeps polling
//!
//! ## Key Types
//!
//! - [`core::ResourceRegistry`] hands out [`core::ResourceConsumer`]s and
//!   [`core::ResourceRateLimiter`]s over shared, named statistics
//! - [`core::PollAlgorithm`] with [`core::MultiClientPollAlgorithm`] and
//!   [`core::SingleClientPollAlgorithm`]
//! - [`core::ClientHandle`] couples a [`core::FabricClient`] to its metrics,
//!   strategy and rate limiter
//! - [`core::ClientPool`] starts, stops, resolves and resets handles
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_client_pool::config::{ClientPoolConfig, PriorityPartition, ResourceProfile};
//! use prometheus_client_pool::core::{ClientPool, ResourceRegistry, TracingCollector};
//! use prometheus_client_pool::runtime::TokioSpawner;
//!
//! let cfg = ClientPoolConfig::new(
//!     "orders",
//!     vec![
//!         PriorityPartition::new(1, 1.0)
//!             .with_rate_limiting(vec![ResourceProfile::new("orders-db")]),
//!         PriorityPartition::new(2, 1.5),
//!     ],
//! );
//! let registry = Arc::new(ResourceRegistry::new());
//! let pool = ClientPool::new(cfg, my_factory, registry.clone(), Arc::new(TracingCollector), TokioSpawner::current());
//! pool.start().await?;
//!
//! // Repository code records dependency calls
//! let db = registry.register_consumer("orders-repo", &ResourceProfile::new("orders-db"));
//!
//! // Each poll tick
//! for candidate in pool.prioritised_clients(None) {
//!     if candidate.handle.should_skip(None) { continue; }
//!     let slots = candidate.handle.poll_begin(available);
//!     // ... poll the fabric for `slots` messages ...
//! }
//! ```
//!
//! For complete examples, see `tests/client_pool_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: resources, poll strategies and the pool.
pub mod core;
/// Configuration models for pools, partitions and poll tuning.
pub mod config;
/// Builders to construct client pools from configuration.
pub mod builders;
/// Runtime adapters and status API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
