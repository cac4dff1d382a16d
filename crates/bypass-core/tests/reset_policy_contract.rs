//! Contract Test: Periodic Reset
//!
//! Constraints verified:
//! - The reset counter starts at ceil(window / interval) and stays in range
//! - After exactly that many ticks, the next tick clears the cache first
//! - A reset re-applies the full current set and evicts stale addresses
//!
//! If this test fails, stale bypasses can outlive the reset window.

mod common;

use bypass_core::EngineEvent;
use common::*;

#[tokio::test]
async fn default_window_is_fifteen_minutes() {
    let h = Harness::with_config(&["a.com"], &engine_config(5, 900));
    assert_eq!(h.engine.reset_counter_initial(), 180);
    assert_eq!(h.engine.reset_counter(), 180);

    let h = Harness::with_config(&["a.com"], &engine_config(7, 900));
    assert_eq!(h.engine.reset_counter_initial(), 129);
}

#[tokio::test]
async fn reset_fires_on_the_tick_after_a_full_window() {
    let mut h = Harness::with_config(&["a.com"], &engine_config(10, 30));
    h.resolver.answer("a.com", &["1.1.1.1"]);
    let initial = h.engine.reset_counter_initial();
    assert_eq!(initial, 3);

    for tick in 0..initial {
        let report = h.engine.tick().await.unwrap();
        assert!(!report.reset_fired, "tick {} must not reset", tick);
    }
    assert_eq!(h.engine.reset_counter(), 0);

    // Same resolution, but the cache was cleared first, so everything is new
    let report = h.engine.tick().await.unwrap();
    assert!(report.reset_fired);
    assert!(report.changed);
    assert_eq!(report.added, ips(&["1.1.1.1"]));
    assert_eq!(h.engine.reset_counter(), initial - 1);
}

#[tokio::test]
async fn reset_reapplies_full_current_set() {
    let mut h = Harness::with_config(&["a.com"], &engine_config(10, 20));
    h.resolver.answer("a.com", &["1.1.1.1"]);

    assert!(h.engine.apply_if_changed().await.unwrap());
    assert!(!h.engine.apply_if_changed().await.unwrap());
    assert!(h.engine.apply_if_changed().await.unwrap(), "reset tick re-applies");

    assert_eq!(h.applier.call_count(), 2);
    assert_eq!(h.applier.last_call().unwrap().len(), 1);
}

#[tokio::test]
async fn reset_evicts_addresses_that_stopped_resolving() {
    let mut h = Harness::with_config(&["a.com"], &engine_config(10, 30));
    h.resolver.answer("a.com", &["1.1.1.1"]);
    h.engine.apply_if_changed().await.unwrap();

    h.resolver.answer("a.com", &["2.2.2.2"]);
    h.engine.apply_if_changed().await.unwrap();
    assert_eq!(h.engine.bypassed_ips(), ips(&["1.1.1.1", "2.2.2.2"]));

    h.engine.apply_if_changed().await.unwrap();
    assert_eq!(h.engine.reset_counter(), 0);

    let report = h.engine.tick().await.unwrap();
    assert!(report.reset_fired);
    assert_eq!(report.evicted, ips(&["1.1.1.1"]));
    assert_eq!(h.engine.bypassed_ips(), ips(&["2.2.2.2"]));
}

#[tokio::test]
async fn reset_emits_event_with_cleared_count() {
    let mut h = Harness::with_config(&["a.com"], &engine_config(10, 10));
    h.resolver.answer("a.com", &["1.1.1.1", "1.1.1.2"]);

    h.engine.tick().await.unwrap();
    h.drain_events();

    h.engine.tick().await.unwrap();
    let events = h.drain_events();
    assert!(
        events.contains(&EngineEvent::ResetFired { cleared: 2 }),
        "expected ResetFired in {:?}",
        events
    );
}

#[tokio::test]
async fn reset_on_empty_cache_is_silent() {
    let mut h = Harness::with_config(&["a.com"], &engine_config(10, 10));

    h.engine.tick().await.unwrap();
    let report = h.engine.tick().await.unwrap();

    assert!(report.reset_fired);
    assert!(!report.changed);
    assert!(
        !h.drain_events()
            .iter()
            .any(|e| matches!(e, EngineEvent::ResetFired { .. }))
    );
}

#[tokio::test]
async fn counter_stays_in_range() {
    let mut h = Harness::with_config(&["a.com"], &engine_config(15, 60));
    h.resolver.answer("a.com", &["1.1.1.1"]);
    let initial = h.engine.reset_counter_initial();

    let mut resets = 0;
    for _ in 0..(initial * 5) {
        let report = h.engine.tick().await.unwrap();
        if report.reset_fired {
            resets += 1;
        }
        assert!(h.engine.reset_counter() < initial);
    }

    // Window of 4 ticks: resets on ticks 5, 9, 13, 17
    assert_eq!(resets, 4);
}
