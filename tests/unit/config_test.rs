//! Tests for configuration parsing and validation

use prometheus_client_pool::config::{
    ClientPoolConfig, PollSettings, PriorityPartition, ResourceProfile,
};
use std::time::Duration;

#[test]
fn test_pool_config_from_json_applies_defaults() {
    let json = r#"{
        "channel_id": "orders",
        "partitions": [
            { "priority_level": 1 },
            {
                "priority_level": 2,
                "weighting": 2.5,
                "supports_rate_limiting": true,
                "resource_profiles": [{ "id": "orders-db" }]
            }
        ]
    }"#;
    let cfg = ClientPoolConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.channel_id, "orders");
    assert!((cfg.partitions[0].weighting - 1.0).abs() < f64::EPSILON);
    assert!(!cfg.partitions[0].supports_rate_limiting);
    assert_eq!(
        cfg.partitions[1].resource_profiles,
        vec![ResourceProfile::new("orders-db")]
    );
    assert_eq!(cfg.poll.min_wait(), Duration::from_millis(100));
    assert_eq!(cfg.poll.max_wait(), Duration::from_millis(10_000));
    assert_eq!(cfg.poll.skip_count_fallback, 20);
    assert_eq!(cfg.reset.backoff_step_ms, 100);
}

#[test]
fn test_pool_config_rejects_duplicate_levels() {
    let cfg = ClientPoolConfig::new(
        "orders",
        vec![PriorityPartition::new(1, 1.0), PriorityPartition::new(1, 2.0)],
    );
    assert!(cfg.validate().unwrap_err().contains("duplicate priority level 1"));
}

#[test]
fn test_pool_config_rejects_bad_weighting() {
    let cfg = ClientPoolConfig::new("orders", vec![PriorityPartition::new(1, 0.0)]);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_poll_settings_validation() {
    let inverted = PollSettings {
        min_wait_ms: 500,
        max_wait_ms: 100,
        ..PollSettings::default()
    };
    assert!(inverted.validate().is_err());

    let bad_ratio = PollSettings {
        poll_time_reduce_ratio: Some(1.5),
        ..PollSettings::default()
    };
    assert!(bad_ratio.validate().is_err());

    let no_ratio = PollSettings {
        poll_time_reduce_ratio: None,
        ..PollSettings::default()
    };
    assert!(no_ratio.validate().is_ok());
}

#[test]
fn test_pool_config_from_file() {
    let path = std::env::temp_dir().join(format!("client-pool-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "channel_id": "audit", "partitions": [{ "priority_level": 3 }],
             "reset": { "backoff_step_ms": 250 } }"#,
    )
    .unwrap();
    let cfg = ClientPoolConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.channel_id, "audit");
    assert_eq!(cfg.reset.backoff(2), Duration::from_millis(500));
}

#[test]
fn test_pool_config_from_missing_file() {
    let err = ClientPoolConfig::from_file("/definitely/not/here.json").unwrap_err();
    assert!(err.contains("cannot read"));
}
