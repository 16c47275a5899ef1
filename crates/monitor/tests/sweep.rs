//! Integration tests for session expiry and the traffic window.

mod common;

use chrono::Duration;
use common::{progress_report, start_time, Harness};
use serde_json::json;

// ---------------------------------------------------------------------------
// Session expiry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_session_is_expired_once() {
    let mut harness = Harness::new();
    harness.report(progress_report("A", "S", 3)).await;
    harness.advance(16);

    let report = harness.sweep_scheduler.sweep().await;
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.expired[0].session_id, "S");
    assert_eq!(report.expired[0].session.step, 3);
    assert!(harness.sessions.is_empty());

    harness.advance(60);
    assert!(harness.sweep_scheduler.sweep().await.expired.is_empty());

    let events = harness.finish().await.transport.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], json!({"pc_id": "A", "delete": "X"}));
}

#[tokio::test]
async fn session_at_the_staleness_limit_survives() {
    let mut harness = Harness::new();
    harness.report(progress_report("A", "S", 3)).await;
    harness.advance(15);

    assert!(harness.sweep_scheduler.sweep().await.expired.is_empty());
    assert!(harness.sessions.get("S").is_some());
}

#[tokio::test]
async fn active_session_is_kept_while_idle_one_goes() {
    let mut harness = Harness::new();
    harness.report(progress_report("A", "idle", 1)).await;
    harness.advance(10);
    harness.report(progress_report("B", "busy", 1)).await;
    harness.advance(10);

    let report = harness.sweep_scheduler.sweep().await;
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.expired[0].session_id, "idle");
    assert!(harness.sessions.get("busy").is_some());
}

#[tokio::test]
async fn expired_session_restarts_without_step_duration() {
    let mut harness = Harness::new();
    harness.report(progress_report("A", "S", 3)).await;
    harness.advance(20);
    harness.sweep_scheduler.sweep().await;

    harness.report(progress_report("A", "S", 4)).await;

    let session = harness.sessions.get("S").expect("restarted");
    assert_eq!(session.step, 4);

    let events = harness.finish().await.transport.events();
    assert!(events.last().expect("event").get("stc").is_none());
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn traffic_window_is_flushed_and_reset() {
    let mut harness = Harness::new();
    for i in 0..100 {
        harness.report(progress_report("A", &format!("s{i}"), 1)).await;
    }
    harness.advance(60);

    let report = harness.sweep_scheduler.sweep().await;
    let sample = report.traffic.expect("traffic recorded");
    assert_eq!(sample.count, 100);
    assert_eq!(sample.window_start, start_time());
    assert_eq!(sample.window_end, start_time() + Duration::seconds(60));
    assert_eq!(harness.traffic.current(), 0);

    let recorded = harness.finish().await;
    let traffic = recorded.persistence.traffic.lock().unwrap();
    assert_eq!(traffic.len(), 1);
    assert_eq!(traffic[0].count, 100);
}

#[tokio::test]
async fn idle_window_records_nothing() {
    let mut harness = Harness::new();
    harness.advance(60);

    assert!(harness.sweep_scheduler.sweep().await.traffic.is_none());

    let recorded = harness.finish().await;
    assert!(recorded.persistence.traffic.lock().unwrap().is_empty());
}

#[tokio::test]
async fn windows_are_contiguous() {
    let mut harness = Harness::new();
    harness.report(progress_report("A", "s1", 1)).await;
    harness.advance(60);
    let first = harness.sweep_scheduler.sweep().await.traffic.expect("first");

    harness.report(progress_report("A", "s2", 1)).await;
    harness.advance(60);
    let second = harness.sweep_scheduler.sweep().await.traffic.expect("second");

    assert_eq!(second.window_start, first.window_end);
    assert_eq!(second.count, 1);
}
