//! Resource tracking, rate limiting and circuit breaking.
//!
//! # Data Flow
//! ```text
//! dependency call → ResourceConsumer → ResourceStatistics
//!     → ResourceRateLimiter (min over profiles) → poll slot allocation
//! ```

pub mod consumer;
pub mod rate_limiter;
pub mod registry;
pub mod statistics;

pub use consumer::ResourceConsumer;
pub use rate_limiter::{CircuitBreakerState, RateLimiterStatus, ResourceRateLimiter};
pub use registry::ResourceRegistry;
pub use statistics::{
    RequestTrack, ResourceRequestResult, ResourceRetryReason, ResourceStatistics, ResourceStatus,
};
