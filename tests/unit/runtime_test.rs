//! Tests for tokio spawner utilities and status reporting

use prometheus_client_pool::core::{ResourceRegistry, Spawn};
use prometheus_client_pool::runtime::api::resource_status;
use prometheus_client_pool::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_resource_status_lookup() {
    let registry = ResourceRegistry::new();
    assert!(resource_status(&registry, "db").is_none());
    registry.statistics("db");
    let status = resource_status(&registry, "db").unwrap();
    assert_eq!(status.name, "db");
    assert!((status.rate_limit_adjustment_percentage - 1.0).abs() < f64::EPSILON);

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"name\":\"db\""));
}
