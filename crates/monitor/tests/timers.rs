//! The scheduler loops on a paused tokio clock.
//!
//! Timer cadence follows tokio time; liveness and staleness follow the
//! harness `ManualClock`. The two are moved independently.

mod common;

use std::time::Duration;

use common::{heartbeat_report, progress_report, Harness, RunningHarness};
use serde_json::{json, Value};

fn heartbeat_batches(running: &RunningHarness) -> Vec<Value> {
    running
        .transport
        .events()
        .into_iter()
        .filter(Value::is_array)
        .collect()
}

fn expiry_events(running: &RunningHarness) -> Vec<Value> {
    running
        .transport
        .events()
        .into_iter()
        .filter(|event| event.get("delete").is_some())
        .collect()
}

async fn sleep_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// ---------------------------------------------------------------------------
// Heartbeat loop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn heartbeat_sweeps_once_per_interval() {
    let running = Harness::new().spawn_timers();
    running.report(heartbeat_report("A")).await;

    sleep_secs(4).await;
    assert!(heartbeat_batches(&running).is_empty());

    sleep_secs(2).await;
    let batches = heartbeat_batches(&running);
    assert_eq!(batches, vec![json!([{"pc_id": "A", "ip": "10.0.0.1", "hb": 1}])]);

    sleep_secs(5).await;
    assert_eq!(heartbeat_batches(&running).len(), 2);

    // Ticks at 15, 20, ... 60.
    sleep_secs(51).await;
    assert_eq!(heartbeat_batches(&running).len(), 12);

    let recorded = running.stop().await;
    let batches = recorded
        .transport
        .events()
        .into_iter()
        .filter(Value::is_array)
        .count();
    assert_eq!(batches, 12);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_loop_declares_death_from_the_clock() {
    let running = Harness::new().spawn_timers();
    running.report(heartbeat_report("A")).await;

    running.clock.advance_secs(301);
    sleep_secs(6).await;

    assert_eq!(
        heartbeat_batches(&running),
        vec![json!([{"pc_id": "A", "ip": "10.0.0.1", "hb": -1}])]
    );

    // The node is gone, so later ticks publish nothing.
    sleep_secs(30).await;
    assert_eq!(heartbeat_batches(&running).len(), 1);

    let recorded = running.stop().await;
    assert_eq!(recorded.persistence.deaths.lock().unwrap().len(), 1);
    assert_eq!(recorded.alerts.sent.lock().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Session sweep loop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn session_sweep_waits_for_its_own_tick() {
    let running = Harness::new().spawn_timers();
    running.report(progress_report("A", "S", 3)).await;

    // Stale by the clock, but the sweep has not run yet.
    running.clock.advance_secs(20);
    sleep_secs(59).await;
    assert!(expiry_events(&running).is_empty());
    assert!(running.sessions.get("S").is_some());

    sleep_secs(2).await;
    assert_eq!(expiry_events(&running), vec![json!({"pc_id": "A", "delete": "X"})]);
    assert!(running.sessions.is_empty());

    sleep_secs(60).await;
    assert_eq!(expiry_events(&running).len(), 1);

    let recorded = running.stop().await;
    let traffic = recorded.persistence.traffic.lock().unwrap();
    assert_eq!(traffic.len(), 1);
    assert_eq!(traffic[0].count, 1);
}

// ---------------------------------------------------------------------------
// Independence and cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn timers_keep_their_cadence_under_ingestion_load() {
    let running = Harness::new().spawn_timers();

    sleep_secs(1).await;
    for round in 0..12 {
        for node in 0..200 {
            running
                .report(heartbeat_report(&format!("n{round}-{node}")))
                .await;
        }
        sleep_secs(5).await;
    }

    // One batch per 5 s tick up to t = 61, one session sweep at t = 60.
    assert_eq!(heartbeat_batches(&running).len(), 12);
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn cancelled_loops_stop_ticking() {
    let running = Harness::new().spawn_timers();
    running.report(progress_report("A", "S", 1)).await;

    sleep_secs(6).await;
    assert_eq!(heartbeat_batches(&running).len(), 1);

    running.cancel.cancel();
    running.clock.advance_secs(120);
    sleep_secs(120).await;

    assert_eq!(heartbeat_batches(&running).len(), 1);
    assert!(expiry_events(&running).is_empty());

    let recorded = running.stop().await;
    assert!(recorded.persistence.traffic.lock().unwrap().is_empty());
    assert!(recorded.persistence.deaths.lock().unwrap().is_empty());
}
