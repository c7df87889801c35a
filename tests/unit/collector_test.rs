//! Tests for collector sinks

use prometheus_client_pool::core::{
    CollectorEvent, DataCollector, InMemoryCollector, LogLevel, ResourceEventKind,
    TracingCollector,
};

#[test]
fn test_in_memory_collector_is_bounded() {
    let collector = InMemoryCollector::new(3);
    for i in 0..5 {
        collector.write(CollectorEvent::log(LogLevel::Info, format!("event {i}")));
    }
    let events = collector.events();
    assert_eq!(events.len(), 3);
    match &events[0] {
        CollectorEvent::Log { message, .. } => assert_eq!(message, "event 2"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_resource_events_counted_by_kind() {
    let collector = InMemoryCollector::new(10);
    collector.write(CollectorEvent::resource(ResourceEventKind::Created, "db", None));
    collector.write(CollectorEvent::resource(ResourceEventKind::KeepAlive, "db", None));
    collector.write(CollectorEvent::resource(ResourceEventKind::KeepAlive, "cache", None));
    assert_eq!(collector.resource_events(ResourceEventKind::Created), 1);
    assert_eq!(collector.resource_events(ResourceEventKind::KeepAlive), 2);
}

#[test]
fn test_exception_keeps_error_text() {
    let event = CollectorEvent::exception("client 1 start", "fabric unavailable");
    match event {
        CollectorEvent::Exception { message, error, .. } => {
            assert_eq!(message, "client 1 start");
            assert_eq!(error, "fabric unavailable");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_tracing_collector_accepts_events() {
    let collector = TracingCollector;
    collector.write(CollectorEvent::log(LogLevel::Warning, "slow poll"));
    collector.write(CollectorEvent::exception("reset", "refused"));
}
