//! Tests for builder modules

use async_trait::async_trait;
use prometheus_client_pool::builders::{build_client_pool, build_client_pools};
use prometheus_client_pool::config::{ClientPoolConfig, PriorityPartition};
use prometheus_client_pool::core::{
    AppResult, ClientPoolError, DataCollector, FabricClient, FabricClientFactory,
    InMemoryCollector, ResourceRegistry,
};
use prometheus_client_pool::runtime::TokioSpawner;
use std::sync::Arc;

struct IdleClient;

#[async_trait]
impl FabricClient for IdleClient {
    async fn fabric_initialize(&self) -> AppResult<()> {
        Ok(())
    }
    async fn start(&self) -> AppResult<()> {
        Ok(())
    }
    async fn stop(&self) -> AppResult<()> {
        Ok(())
    }
}

fn idle_factory() -> Arc<dyn FabricClientFactory> {
    Arc::new(|_: &str, _: &PriorityPartition| -> AppResult<Arc<dyn FabricClient>> {
        Ok(Arc::new(IdleClient))
    })
}

fn collector() -> Arc<dyn DataCollector> {
    Arc::new(InMemoryCollector::new(10))
}

#[tokio::test]
async fn test_build_client_pool_validates() {
    let bad = ClientPoolConfig::new("orders", vec![]);
    let err = build_client_pool(
        bad,
        idle_factory(),
        Arc::new(ResourceRegistry::new()),
        collector(),
        TokioSpawner::current(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ClientPoolError::InvalidConfig(msg) if msg.starts_with("config invalid")));
}

#[tokio::test]
async fn test_build_client_pool_is_unstarted() {
    let cfg = ClientPoolConfig::new("orders", vec![PriorityPartition::new(1, 1.0)]);
    let pool = build_client_pool(
        cfg,
        idle_factory(),
        Arc::new(ResourceRegistry::new()),
        collector(),
        TokioSpawner::current(),
    )
    .unwrap();
    assert_eq!(pool.channel_id(), "orders");
    assert!(pool.clients().is_empty());

    pool.start().await.unwrap();
    assert_eq!(pool.clients().len(), 1);
}

#[tokio::test]
async fn test_build_client_pools_by_channel() {
    let registry = Arc::new(ResourceRegistry::new());
    let spawner = TokioSpawner::current();
    let configs = vec![
        ClientPoolConfig::new("orders", vec![PriorityPartition::new(1, 1.0)]),
        ClientPoolConfig::new("audit", vec![PriorityPartition::new(1, 1.0)]),
    ];
    let pools = build_client_pools(configs, |_| Ok(idle_factory()), &registry, &collector(), &spawner)
        .unwrap();
    assert_eq!(pools.len(), 2);
    assert!(Arc::ptr_eq(pools["orders"].registry(), pools["audit"].registry()));
}

#[tokio::test]
async fn test_build_client_pools_rejects_duplicate_channel() {
    let registry = Arc::new(ResourceRegistry::new());
    let spawner = TokioSpawner::current();
    let configs = vec![
        ClientPoolConfig::new("orders", vec![PriorityPartition::new(1, 1.0)]),
        ClientPoolConfig::new("orders", vec![PriorityPartition::new(2, 1.0)]),
    ];
    let result = build_client_pools(configs, |_| Ok(idle_factory()), &registry, &collector(), &spawner);
    assert!(matches!(result, Err(ClientPoolError::InvalidConfig(_))));
}
