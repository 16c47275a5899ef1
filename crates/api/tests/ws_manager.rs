//! Unit tests for `WsManager`.
//!
//! These tests exercise the subscriber connection manager directly, without
//! performing any HTTP upgrades. They verify add/remove semantics, event
//! publishing as the monitor's broadcast transport, and graceful shutdown.

use axum::extract::ws::Message;
use bytes::Bytes;
use fleetwatch_api::ws::WsManager;
use fleetwatch_core::sinks::BroadcastTransport;

// ---------------------------------------------------------------------------
// Test: new manager starts with zero connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::default();

    assert_eq!(manager.connection_count().await, 0);
    assert!(!manager.has_subscribers().await);
}

// ---------------------------------------------------------------------------
// Test: add() and remove() track the connection count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_track_count() {
    let manager = WsManager::default();

    let _rx = manager.add("conn-1".to_string()).await;
    assert_eq!(manager.connection_count().await, 1);
    assert!(manager.has_subscribers().await);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: remove() with unknown ID is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_unknown_id_is_noop() {
    let manager = WsManager::default();

    let _rx = manager.add("conn-1".to_string()).await;
    manager.remove("nonexistent").await;

    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: publish() delivers a JSON event as a text frame to every subscriber
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_sends_text_to_all_subscribers() {
    let manager = WsManager::default();

    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    manager
        .publish(Bytes::from_static(br#"{"pc_id":"A","delete":"X"}"#))
        .await;

    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await {
            Some(Message::Text(text)) => {
                assert_eq!(text.as_str(), r#"{"pc_id":"A","delete":"X"}"#);
            }
            other => panic!("Expected text frame, got {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Test: publish() skips subscribers whose channel is closed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_skips_closed_subscribers() {
    let manager = WsManager::default();

    let rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;
    drop(rx1);

    manager.publish(Bytes::from_static(b"[]")).await;

    assert!(matches!(rx2.recv().await, Some(Message::Text(_))));
}

// ---------------------------------------------------------------------------
// Test: a subscriber that stops reading loses messages, others do not
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_subscriber_queue_drops_and_counts() {
    let manager = WsManager::new(2);

    let mut stalled = manager.add("stalled".to_string()).await;
    let mut reading = manager.add("reading".to_string()).await;

    for i in 0..5 {
        manager
            .publish(Bytes::from(format!(r#"{{"n":{i}}}"#)))
            .await;
        // Keep the second subscriber's queue empty.
        assert!(matches!(reading.recv().await, Some(Message::Text(_))));
    }

    assert_eq!(manager.dropped_for("stalled").await, Some(3));
    assert_eq!(manager.dropped_for("reading").await, Some(0));

    // The stalled subscriber still holds the oldest messages.
    for expected in [r#"{"n":0}"#, r#"{"n":1}"#] {
        match stalled.try_recv() {
            Ok(Message::Text(text)) => assert_eq!(text.as_str(), expected),
            other => panic!("Expected text frame, got {other:?}"),
        }
    }
    assert!(stalled.try_recv().is_err());
    assert_eq!(manager.connection_count().await, 2);
}

// ---------------------------------------------------------------------------
// Test: broadcast() reports how many subscribers queued the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_counts_queued_subscribers() {
    let manager = WsManager::new(1);

    let _rx1 = manager.add("conn-1".to_string()).await;
    let rx2 = manager.add("conn-2".to_string()).await;
    drop(rx2);

    assert_eq!(manager.broadcast(Message::Text("a".into())).await, 1);
    // conn-1 is now full.
    assert_eq!(manager.broadcast(Message::Text("b".into())).await, 0);
}

// ---------------------------------------------------------------------------
// Test: ping_all() sends a Ping frame
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_sends_ping() {
    let manager = WsManager::default();
    let mut rx = manager.add("conn-1".to_string()).await;

    manager.ping_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::default();

    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(rx1.recv().await, Some(Message::Close(None))));
    assert!(matches!(rx2.recv().await, Some(Message::Close(None))));
}
