//! Client pool lifecycle: start, stop, resolve and resilient reset.
//!
//! # Reset
//! ```text
//! failure → stop handle (log + continue)
//!     → loop { fabric_initialize + start
//!              ok   → done (or stop again if the pool stopped meanwhile)
//!              fail → sleep attempt × step, retry }
//! ```
//! The loop has no attempt limit. The only other way out is pool shutdown,
//! which interrupts both an attempt in flight and the backoff sleep and
//! leaves the client stopped.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::config::{ClientPoolConfig, PriorityPartition, ResetSettings};
use crate::core::client::{ClientHandle, ClientStatus, FabricClientFactory};
use crate::core::collector::{CollectorEvent, DataCollector, LogLevel};
use crate::core::poll::{
    MultiClientPollAlgorithm, PollAlgorithm, PollMetrics, SingleClientPollAlgorithm,
};
use crate::core::resource::ResourceRegistry;
use crate::core::ClientPoolError;
use crate::util::clock::{tick_count, Tick};

/// Abstraction for spawning work off the pool's control path.
pub trait Spawn {
    /// Spawn a future that runs to completion on its own.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// A handle ranked for the current poll tick.
#[derive(Debug, Clone)]
pub struct PollCandidate {
    /// The client.
    pub handle: Arc<ClientHandle>,
    /// Freshly computed priority key.
    pub priority_key: i64,
    /// Whether the client has exceeded its maximum wait.
    pub past_due: bool,
}

/// Default priority for a set of levels: level 1 if present, otherwise the
/// highest configured level.
pub fn resolve_default_priority(levels: impl IntoIterator<Item = i32>) -> Option<i32> {
    let mut max = None;
    for level in levels {
        if level == 1 {
            return Some(1);
        }
        max = max.max(Some(level));
    }
    max
}

/// Owns one [`ClientHandle`] per priority partition of a channel.
///
/// `start` and `stop` are each expected once per pool lifetime.
pub struct ClientPool<S> {
    config: ClientPoolConfig,
    factory: Arc<dyn FabricClientFactory>,
    registry: Arc<ResourceRegistry>,
    collector: Arc<dyn DataCollector>,
    spawner: S,
    clients: RwLock<BTreeMap<i32, Arc<ClientHandle>>>,
    default_priority: RwLock<Option<i32>>,
    shutdown: watch::Sender<bool>,
}

impl<S> ClientPool<S> {
    /// Create a pool. Nothing connects until [`ClientPool::start`].
    pub fn new(
        config: ClientPoolConfig,
        factory: Arc<dyn FabricClientFactory>,
        registry: Arc<ResourceRegistry>,
        collector: Arc<dyn DataCollector>,
        spawner: S,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            factory,
            registry,
            collector,
            spawner,
            clients: RwLock::new(BTreeMap::new()),
            default_priority: RwLock::new(None),
            shutdown,
        }
    }

    /// Channel served by this pool.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.config.channel_id
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientPoolConfig {
        &self.config
    }

    /// Registry used for rate limiters.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Default priority resolved at start.
    #[must_use]
    pub fn default_priority(&self) -> Option<i32> {
        *self.default_priority.read()
    }

    /// Whether stop has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Construct and start a client for every partition.
    ///
    /// Individual client failures are logged and skipped; only an invalid
    /// configuration aborts.
    ///
    /// # Errors
    ///
    /// Returns `ClientPoolError::InvalidConfig` when the channel id or the
    /// partition set is empty, or the config is otherwise invalid.
    pub async fn start(&self) -> Result<(), ClientPoolError> {
        if self.config.channel_id.trim().is_empty() {
            return Err(ClientPoolError::InvalidConfig(
                "channel id must not be empty".into(),
            ));
        }
        if self.config.partitions.is_empty() {
            return Err(ClientPoolError::InvalidConfig(
                "at least one priority partition is required".into(),
            ));
        }
        self.config.validate().map_err(ClientPoolError::InvalidConfig)?;
        self.shutdown.send_replace(false);

        let algorithm: Arc<dyn PollAlgorithm> = if self.config.partitions.len() == 1 {
            Arc::new(SingleClientPollAlgorithm::new())
        } else {
            Arc::new(MultiClientPollAlgorithm::new())
        };

        for partition in &self.config.partitions {
            let priority = partition.priority_level;
            let handle = match self.build_handle(partition, &algorithm) {
                Ok(handle) => Arc::new(handle),
                Err(e) => {
                    error!(
                        channel = %self.config.channel_id,
                        priority,
                        error = %e,
                        "client construction failed"
                    );
                    self.collector.write(CollectorEvent::exception(
                        format!("client {priority} create"),
                        &e,
                    ));
                    continue;
                }
            };

            if handle.can_start() {
                if let Err(e) = handle.start().await {
                    error!(
                        channel = %self.config.channel_id,
                        priority,
                        error = %e,
                        "client start failed"
                    );
                    self.collector.write(CollectorEvent::exception(
                        format!("client {priority} start"),
                        &e,
                    ));
                }
            } else {
                warn!(
                    channel = %self.config.channel_id,
                    priority,
                    "client cannot start, left inactive"
                );
                self.collector.write(CollectorEvent::log(
                    LogLevel::Warning,
                    format!("client {priority} on {} cannot start", self.config.channel_id),
                ));
            }

            self.clients.write().insert(priority, handle);
        }

        let default =
            resolve_default_priority(self.config.partitions.iter().map(|p| p.priority_level));
        *self.default_priority.write() = default;

        info!(
            channel = %self.config.channel_id,
            clients = self.clients.read().len(),
            algorithm = algorithm.name(),
            default_priority = ?default,
            "client pool started"
        );
        Ok(())
    }

    fn build_handle(
        &self,
        partition: &PriorityPartition,
        algorithm: &Arc<dyn PollAlgorithm>,
    ) -> Result<ClientHandle, ClientPoolError> {
        let client = self
            .factory
            .create(&self.config.channel_id, partition)
            .map_err(|e| ClientPoolError::Fabric(format!("{e:#}")))?;

        let limiter = (partition.supports_rate_limiting && !partition.resource_profiles.is_empty())
            .then(|| {
                self.registry.register_request_rate_limiter(
                    format!("{}/{}", self.config.channel_id, partition.priority_level),
                    &partition.resource_profiles,
                )
            });

        let metrics =
            PollMetrics::new(partition.priority_level, partition.weighting, &self.config.poll)
                .with_rate_limiter(limiter);
        Ok(ClientHandle::new(
            partition.priority_level,
            client,
            Arc::clone(algorithm),
            metrics,
        ))
    }

    /// Stop every client and clear the pool. Interrupts in-flight resets.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let handles: Vec<_> = self.clients.read().values().cloned().collect();
        for handle in handles {
            if let Err(e) = handle.stop().await {
                warn!(
                    channel = %self.config.channel_id,
                    priority = handle.priority(),
                    error = %e,
                    "client stop failed"
                );
                self.collector.write(CollectorEvent::exception(
                    format!("client {} stop", handle.priority()),
                    &e,
                ));
            }
        }

        self.clients.write().clear();
        *self.default_priority.write() = None;
        info!(channel = %self.config.channel_id, "client pool stopped");
    }

    /// Handle for `priority`, falling back to the default priority.
    ///
    /// # Errors
    ///
    /// Returns `ClientPoolError::ClientNotFound` when neither exists.
    pub fn client_resolve(&self, priority: i32) -> Result<Arc<ClientHandle>, ClientPoolError> {
        let clients = self.clients.read();
        if let Some(handle) = clients.get(&priority) {
            return Ok(Arc::clone(handle));
        }
        self.default_priority()
            .and_then(|default| clients.get(&default))
            .cloned()
            .ok_or(ClientPoolError::ClientNotFound(priority))
    }

    /// Every handle, ordered by priority level.
    #[must_use]
    pub fn clients(&self) -> Vec<Arc<ClientHandle>> {
        self.clients.read().values().cloned().collect()
    }

    /// Status of every handle.
    #[must_use]
    pub fn status(&self) -> Vec<ClientStatus> {
        self.clients.read().values().map(|h| h.status()).collect()
    }

    /// Rank active clients for a poll tick: past-due clients first, then by
    /// descending priority key.
    #[must_use]
    pub fn prioritised_clients(&self, now: Option<Tick>) -> Vec<PollCandidate> {
        let now = now.unwrap_or_else(tick_count);
        let mut candidates: Vec<_> = self
            .clients
            .read()
            .values()
            .filter(|h| h.is_active())
            .map(|h| PollCandidate {
                priority_key: h.priority_recalculate(Some(now)),
                past_due: h.past_due(Some(now)),
                handle: Arc::clone(h),
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.past_due
                .cmp(&a.past_due)
                .then(b.priority_key.cmp(&a.priority_key))
                .then(b.handle.priority().cmp(&a.handle.priority()))
        });
        candidates
    }

    /// Stop the handle, then reconnect until it succeeds or the pool stops.
    ///
    /// Returns the number of reconnect attempts.
    ///
    /// # Errors
    ///
    /// Returns `ClientPoolError::ResetCancelled` if the pool stops first.
    pub async fn client_reset(
        &self,
        handle: &Arc<ClientHandle>,
        reason: &str,
    ) -> Result<u32, ClientPoolError> {
        reset_client(
            Arc::clone(handle),
            reason.to_string(),
            self.config.reset.clone(),
            Arc::clone(&self.collector),
            self.shutdown.subscribe(),
        )
        .await
    }
}

impl<S: Spawn> ClientPool<S> {
    /// Run [`ClientPool::client_reset`] on its own task so the remaining
    /// clients keep polling. The receiver yields the outcome.
    pub fn spawn_client_reset(
        &self,
        handle: &Arc<ClientHandle>,
        reason: impl Into<String>,
    ) -> oneshot::Receiver<Result<u32, ClientPoolError>> {
        let (tx, rx) = oneshot::channel();
        let fut = reset_client(
            Arc::clone(handle),
            reason.into(),
            self.config.reset.clone(),
            Arc::clone(&self.collector),
            self.shutdown.subscribe(),
        );
        self.spawner.spawn(async move {
            let outcome = fut.await;
            let _ = tx.send(outcome);
        });
        rx
    }
}

async fn reset_client(
    handle: Arc<ClientHandle>,
    reason: String,
    reset: ResetSettings,
    collector: Arc<dyn DataCollector>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u32, ClientPoolError> {
    let priority = handle.priority();
    warn!(priority, reason = %reason, "client reset requested");

    if let Err(e) = handle.stop().await {
        warn!(priority, error = %e, "stop before reset failed, continuing");
        collector.write(CollectorEvent::exception(
            format!("client {priority} reset stop"),
            &e,
        ));
    }

    let mut attempt: u32 = 0;
    loop {
        if *shutdown.borrow() {
            return Err(ClientPoolError::ResetCancelled {
                priority,
                attempts: attempt,
            });
        }
        attempt = attempt.saturating_add(1);

        let outcome = tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => None,
            result = handle.reset() => Some(result),
        };

        match outcome {
            None => {
                debug!(priority, attempt, "reset attempt interrupted by shutdown");
                return Err(cancel_reset(&handle, attempt, collector.as_ref()).await);
            }
            Some(Ok(())) if *shutdown.borrow() => {
                debug!(priority, attempt, "pool stopped while reconnecting");
                return Err(cancel_reset(&handle, attempt, collector.as_ref()).await);
            }
            Some(Ok(())) => {
                info!(priority, attempts = attempt, "client reset complete");
                collector.write(CollectorEvent::log(
                    LogLevel::Info,
                    format!("client {priority} reset after {attempt} attempts"),
                ));
                return Ok(attempt);
            }
            Some(Err(e)) => {
                let delay = reset.backoff(attempt);
                warn!(
                    priority,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "client reset attempt failed"
                );
                collector.write(CollectorEvent::exception(
                    format!("client {priority} reset attempt {attempt}"),
                    &e,
                ));
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = shutdown_requested(&mut shutdown) => {
                        debug!(priority, attempt, "reset interrupted by shutdown");
                        return Err(ClientPoolError::ResetCancelled {
                            priority,
                            attempts: attempt,
                        });
                    }
                }
            }
        }
    }
}

/// Leave the handle stopped after shutdown overtook a reconnect attempt.
async fn cancel_reset(
    handle: &ClientHandle,
    attempts: u32,
    collector: &dyn DataCollector,
) -> ClientPoolError {
    let priority = handle.priority();
    if let Err(e) = handle.stop().await {
        warn!(priority, error = %e, "stop after cancelled reset failed");
        collector.write(CollectorEvent::exception(
            format!("client {priority} reset cancel stop"),
            &e,
        ));
    }
    ClientPoolError::ResetCancelled { priority, attempts }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        // a dropped sender counts as shutdown
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
