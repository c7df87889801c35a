//! Integration tests for the poll strategies
//!
//! Randomised cycles check the bounds that must hold no matter what the
//! fabric returns:
//! - Slots never exceed what is available
//! - Multi-client capacity stays within its clamp after any recalculation
//! - Fabric wait stays between min and max wait
//! - The single-client strategy never skips and always claims everything

use prometheus_client_pool::config::PollSettings;
use prometheus_client_pool::core::{
    MultiClientPollAlgorithm, PollAlgorithm, PollMetrics, SingleClientPollAlgorithm,
    PRIORITY_BASELINE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn seeded_metrics(algorithm: &dyn PollAlgorithm) -> PollMetrics {
    let mut metrics = PollMetrics::new(1, 1.0, &PollSettings::default());
    algorithm.initialise_metrics(&mut metrics);
    metrics
}

#[test]
fn test_multi_cycles_stay_in_bounds() {
    let algorithm = MultiClientPollAlgorithm::new();
    let mut rng = StdRng::seed_from_u64(42);
    let mut metrics = seeded_metrics(&algorithm);
    let mut now: u32 = 0;

    for cycle in 0..500 {
        if cycle % 10 == 0 {
            algorithm.capacity_reset(&mut metrics);
        }
        let available = rng.random_range(0..=64_usize);
        let slots = algorithm.calculate_slots(available, &metrics);
        assert!(slots <= available);

        metrics.poll_begin(slots);
        let achieved = if slots == 0 { 0 } else { rng.random_range(0..=slots) };
        now = now.wrapping_add(rng.random_range(1..=500));
        metrics.poll_end(achieved, now);
        metrics.priority_queue_length = Some(rng.random_range(0..=3));
        algorithm.poll_metrics_recalculate(achieved > 0, rng.random_bool(0.1), &mut metrics);
        algorithm.capacity_percentage_recalculate(&mut metrics);

        assert!((0.01..=0.95).contains(&metrics.capacity_percentage));
        let wait = metrics.fabric_poll_wait_time.unwrap();
        assert!(wait >= metrics.min_wait && wait <= metrics.max_wait);
    }
}

#[test]
fn test_multi_skip_is_forced_off_after_max_wait() {
    let algorithm = MultiClientPollAlgorithm::new();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let mut metrics = seeded_metrics(&algorithm);
        let last = rng.random::<u32>();
        metrics.poll_end(0, last);
        metrics.skip_count = rng.random_range(0..=50);

        // inside min wait: always skipped
        assert!(algorithm.should_skip_at(&mut metrics, last.wrapping_add(50)));
        // beyond max wait: never skipped, even across tick wraparound
        assert!(!algorithm.should_skip_at(&mut metrics, last.wrapping_add(10_001)));
    }
}

#[test]
fn test_multi_priority_keys_grow_with_idle_and_backlog() {
    let algorithm = MultiClientPollAlgorithm::new();
    let mut idle = seeded_metrics(&algorithm);
    let mut fresh = seeded_metrics(&algorithm);
    idle.priority_tick = Some(0);
    fresh.priority_tick = Some(900);

    let idle_key = algorithm.priority_recalculate(Some(0), &mut idle, Some(1_000));
    let fresh_key = algorithm.priority_recalculate(Some(0), &mut fresh, Some(1_000));
    assert_eq!(idle_key, PRIORITY_BASELINE + 1_000);
    assert_eq!(fresh_key, PRIORITY_BASELINE + 100);

    // re-ranked at the same tick: idle is zero, backlog alone wins
    let backlog_key = algorithm.priority_recalculate(Some(5_000), &mut fresh, Some(1_000));
    assert_eq!(backlog_key, PRIORITY_BASELINE + 5_000);
    assert!(backlog_key > idle_key);
}

#[test]
fn test_single_claims_all_and_never_skips() {
    let algorithm = SingleClientPollAlgorithm::new();
    let mut rng = StdRng::seed_from_u64(3);
    let mut metrics = seeded_metrics(&algorithm);
    assert_eq!(metrics.fabric_poll_wait_time, Some(Duration::from_millis(10_000)));

    for _ in 0..200 {
        let available = rng.random_range(0..=128_usize);
        assert_eq!(algorithm.calculate_slots(available, &metrics), available);

        let now = rng.random::<u32>();
        metrics.poll_end(rng.random_range(0..=available), now);
        algorithm.poll_metrics_recalculate(rng.random_bool(0.5), rng.random_bool(0.5), &mut metrics);
        assert_eq!(metrics.skip_count, 0);
        assert!(!algorithm.should_skip_at(&mut metrics, now.wrapping_add(1)));
        assert_eq!(
            algorithm.priority_recalculate(Some(rng.random_range(0..1_000)), &mut metrics, Some(now)),
            PRIORITY_BASELINE
        );
        algorithm.capacity_percentage_recalculate(&mut metrics);
        assert!((metrics.capacity_percentage - 1.0).abs() < f64::EPSILON);
    }
}
