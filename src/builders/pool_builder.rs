//! Builders to construct client pools from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ClientPoolConfig;
use crate::core::{ClientPool, ClientPoolError, DataCollector, FabricClientFactory, ResourceRegistry};

/// Validate `cfg` and build an unstarted pool.
///
/// # Errors
///
/// Returns `ClientPoolError::InvalidConfig` if validation fails.
pub fn build_client_pool<S>(
    cfg: ClientPoolConfig,
    factory: Arc<dyn FabricClientFactory>,
    registry: Arc<ResourceRegistry>,
    collector: Arc<dyn DataCollector>,
    spawner: S,
) -> Result<ClientPool<S>, ClientPoolError> {
    cfg.validate()
        .map_err(|e| ClientPoolError::InvalidConfig(format!("config invalid: {e}")))?;
    Ok(ClientPool::new(cfg, factory, registry, collector, spawner))
}

/// Build one pool per channel config, all sharing a registry and collector.
///
/// `factory_for` supplies the fabric client factory for each channel.
///
/// # Errors
///
/// Returns the first validation or factory error encountered.
pub fn build_client_pools<S, FF>(
    configs: Vec<ClientPoolConfig>,
    mut factory_for: FF,
    registry: &Arc<ResourceRegistry>,
    collector: &Arc<dyn DataCollector>,
    spawner: &S,
) -> Result<HashMap<String, ClientPool<S>>, ClientPoolError>
where
    S: Clone,
    FF: FnMut(&ClientPoolConfig) -> Result<Arc<dyn FabricClientFactory>, ClientPoolError>,
{
    let mut pools = HashMap::new();
    for cfg in configs {
        if pools.contains_key(&cfg.channel_id) {
            return Err(ClientPoolError::InvalidConfig(format!(
                "duplicate channel `{}`",
                cfg.channel_id
            )));
        }
        let factory = factory_for(&cfg)?;
        let channel = cfg.channel_id.clone();
        let pool = build_client_pool(
            cfg,
            factory,
            Arc::clone(registry),
            Arc::clone(collector),
            spawner.clone(),
        )?;
        pools.insert(channel, pool);
    }
    Ok(pools)
}
