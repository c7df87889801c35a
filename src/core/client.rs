//! Fabric client adapter interface and the handle that schedules one client.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::PriorityPartition;
use crate::core::poll::{PollAlgorithm, PollMetrics};
use crate::core::resource::{CircuitBreakerState, ResourceRateLimiter};
use crate::core::{AppResult, ClientPoolError};
use crate::util::clock::{tick_count, Tick};

/// Transport-specific client attached to one priority partition of the fabric.
///
/// Implementations use interior mutability; every method takes `&self` so a
/// handle can be stopped and reconnected from a reset worker while the poll
/// coordinator keeps reading it.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_client_pool::core::{AppResult, FabricClient};
///
/// struct QueueListener { /* driver handle */ }
///
/// #[async_trait]
/// impl FabricClient for QueueListener {
///     async fn fabric_initialize(&self) -> AppResult<()> { Ok(()) }
///     async fn start(&self) -> AppResult<()> { Ok(()) }
///     async fn stop(&self) -> AppResult<()> { Ok(()) }
/// }
/// ```
#[async_trait]
pub trait FabricClient: Send + Sync {
    /// Whether the client is configured well enough to start.
    fn can_start(&self) -> bool {
        true
    }

    /// (Re)build the underlying fabric connection.
    async fn fabric_initialize(&self) -> AppResult<()>;

    /// Begin listening or sending.
    async fn start(&self) -> AppResult<()>;

    /// Stop listening or sending.
    async fn stop(&self) -> AppResult<()>;

    /// Messages waiting on the fabric, when the transport can tell.
    fn queue_length(&self) -> Option<u64> {
        None
    }
}

/// Creates the fabric client for a partition.
pub trait FabricClientFactory: Send + Sync {
    /// Build a client for `partition` of `channel_id`.
    fn create(
        &self,
        channel_id: &str,
        partition: &PriorityPartition,
    ) -> AppResult<Arc<dyn FabricClient>>;
}

impl<F> FabricClientFactory for F
where
    F: Fn(&str, &PriorityPartition) -> AppResult<Arc<dyn FabricClient>> + Send + Sync,
{
    fn create(
        &self,
        channel_id: &str,
        partition: &PriorityPartition,
    ) -> AppResult<Arc<dyn FabricClient>> {
        self(channel_id, partition)
    }
}

/// Serializable view of a client handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientStatus {
    /// Priority partition.
    pub priority: i32,
    /// Whether the client is connected and started.
    pub active: bool,
    /// Poll strategy name.
    pub algorithm: String,
    /// Current capacity percentage.
    pub capacity_percentage: f64,
    /// Last computed priority key.
    pub priority_calculated: i64,
    /// Poll success rate.
    pub success_rate: f64,
    /// Current skip counter.
    pub skip_count: u32,
    /// Current throttle from the rate limiter.
    pub rate_limit_percentage: f64,
    /// Circuit breaker state, when a rate limiter is attached.
    pub circuit_breaker_state: Option<CircuitBreakerState>,
    /// Completed resets.
    pub resets: u32,
}

/// Couples one fabric client to its poll metrics, poll strategy and optional
/// rate limiter.
pub struct ClientHandle {
    priority: i32,
    client: Arc<dyn FabricClient>,
    algorithm: Arc<dyn PollAlgorithm>,
    metrics: Mutex<PollMetrics>,
    active: AtomicBool,
    resets: AtomicU32,
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("priority", &self.priority)
            .field("algorithm", &self.algorithm.name())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl ClientHandle {
    /// Wire a client to its strategy. The strategy seeds the metrics.
    pub fn new(
        priority: i32,
        client: Arc<dyn FabricClient>,
        algorithm: Arc<dyn PollAlgorithm>,
        mut metrics: PollMetrics,
    ) -> Self {
        algorithm.initialise_metrics(&mut metrics);
        Self {
            priority,
            client,
            algorithm,
            metrics: Mutex::new(metrics),
            active: AtomicBool::new(false),
            resets: AtomicU32::new(0),
        }
    }

    /// Priority partition served by this client.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the client is connected and started.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Whether the fabric client reports it can start.
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.client.can_start()
    }

    /// Strategy scheduling this client.
    #[must_use]
    pub fn algorithm(&self) -> &Arc<dyn PollAlgorithm> {
        &self.algorithm
    }

    /// Rate limiter attached to this client's metrics.
    #[must_use]
    pub fn rate_limiter(&self) -> Option<Arc<ResourceRateLimiter>> {
        self.metrics.lock().rate_limiter().cloned()
    }

    /// Completed resets.
    #[must_use]
    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::Relaxed)
    }

    /// Copy of the current metrics.
    #[must_use]
    pub fn metrics(&self) -> PollMetrics {
        self.metrics.lock().clone()
    }

    /// Initialise the fabric connection and start the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientPoolError::ClientStart` when the fabric refuses.
    pub async fn start(&self) -> Result<(), ClientPoolError> {
        self.connect().await.map_err(|e| ClientPoolError::ClientStart {
            priority: self.priority,
            reason: format!("{e:#}"),
        })?;
        tracing::info!(priority = self.priority, "client started");
        Ok(())
    }

    /// Stop the client. It is marked inactive even if the fabric errors.
    ///
    /// # Errors
    ///
    /// Returns `ClientPoolError::ClientStop` when the fabric refuses.
    pub async fn stop(&self) -> Result<(), ClientPoolError> {
        self.active.store(false, Ordering::Release);
        self.client
            .stop()
            .await
            .map_err(|e| ClientPoolError::ClientStop {
                priority: self.priority,
                reason: format!("{e:#}"),
            })?;
        tracing::info!(priority = self.priority, "client stopped");
        Ok(())
    }

    /// One reconnect attempt: reinitialise the fabric and start again.
    /// The cycle counters restart from the strategy's baseline on success.
    ///
    /// # Errors
    ///
    /// Returns `ClientPoolError::ClientStart` when the fabric refuses.
    pub async fn reset(&self) -> Result<(), ClientPoolError> {
        self.connect().await.map_err(|e| ClientPoolError::ClientStart {
            priority: self.priority,
            reason: format!("{e:#}"),
        })?;
        self.algorithm.capacity_reset(&mut self.metrics.lock());
        self.resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn connect(&self) -> AppResult<()> {
        self.client.fabric_initialize().await?;
        self.client.start().await?;
        self.active.store(true, Ordering::Release);
        Ok(())
    }

    /// Slots this client may claim out of `available`.
    #[must_use]
    pub fn calculate_slots(&self, available: usize) -> usize {
        self.algorithm.calculate_slots(available, &self.metrics.lock())
    }

    /// Claim slots for a poll and record the attempt.
    pub fn poll_begin(&self, available: usize) -> usize {
        let mut metrics = self.metrics.lock();
        let slots = self.algorithm.calculate_slots(available, &metrics);
        metrics.poll_begin(slots);
        slots
    }

    /// Record a completed poll and adapt wait time and skip counter.
    pub fn poll_end(&self, achieved: usize, has_errored: bool, now: Option<Tick>) {
        let mut metrics = self.metrics.lock();
        metrics.poll_end(achieved, now.unwrap_or_else(tick_count));
        self.algorithm
            .poll_metrics_recalculate(achieved > 0, has_errored, &mut metrics);
    }

    /// Whether this tick should be skipped.
    pub fn should_skip(&self, now: Option<Tick>) -> bool {
        let mut metrics = self.metrics.lock();
        match now {
            Some(now) => self.algorithm.should_skip_at(&mut metrics, now),
            None => self.algorithm.should_skip(&mut metrics),
        }
    }

    /// Start a new cycle.
    pub fn capacity_reset(&self) {
        self.algorithm.capacity_reset(&mut self.metrics.lock());
    }

    /// Adapt capacity at the end of a cycle.
    pub fn capacity_percentage_recalculate(&self) {
        self.algorithm
            .capacity_percentage_recalculate(&mut self.metrics.lock());
    }

    /// Recompute the priority key using the fabric's current backlog.
    pub fn priority_recalculate(&self, now: Option<Tick>) -> i64 {
        let queue_length = self.client.queue_length();
        self.algorithm
            .priority_recalculate(queue_length, &mut self.metrics.lock(), now)
    }

    /// Whether the client has gone unpolled longer than allowed.
    #[must_use]
    pub fn past_due(&self, now: Option<Tick>) -> bool {
        self.algorithm.past_due_calculate(&self.metrics.lock(), now)
    }

    /// Serializable snapshot.
    #[must_use]
    pub fn status(&self) -> ClientStatus {
        let metrics = self.metrics.lock();
        ClientStatus {
            priority: self.priority,
            active: self.is_active(),
            algorithm: self.algorithm.name().to_string(),
            capacity_percentage: metrics.capacity_percentage,
            priority_calculated: metrics.priority_calculated,
            success_rate: metrics.success_rate(),
            skip_count: metrics.skip_count,
            rate_limit_percentage: metrics.rate_limit_percentage(),
            circuit_breaker_state: metrics.rate_limiter().map(|l| l.circuit_breaker_state()),
            resets: self.resets(),
        }
    }
}
