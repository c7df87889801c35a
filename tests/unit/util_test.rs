//! Tests for clock helpers

use prometheus_client_pool::util::clock::{tick_count, tick_delta, tick_elapsed};
use std::time::Duration;

#[test]
fn test_tick_delta_across_wrap() {
    assert_eq!(tick_delta(5, u32::MAX - 4), 10);
    assert_eq!(tick_elapsed(5, u32::MAX - 4), Duration::from_millis(10));
}

#[test]
fn test_tick_count_is_monotonic() {
    let a = tick_count();
    std::thread::sleep(Duration::from_millis(5));
    let b = tick_count();
    assert!(tick_delta(b, a) >= 5);
}
