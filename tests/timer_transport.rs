//! Transports and the timer driver against loopback feeds.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use common::{start_programmable_backend, start_ws_feed, WAIT};
use vault_monitor::resilience::Backoff;
use vault_monitor::timer::{
    ReconciliationTimer, ResetInfo, Snapshot, TimerDriver, TimerEvent, TimerSettings,
};
use vault_monitor::transport::{PollTransport, WsTransport};
use vault_monitor::Shutdown;

async fn next_event(rx: &mut mpsc::Receiver<TimerEvent>) -> TimerEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn reset_frame() -> String {
    r#"{"type":"reset","address":"7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU","amount":1.5,"reference":"5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb"}"#
        .to_string()
}

#[tokio::test]
async fn test_ws_forwards_events_and_reports_disconnect() {
    let addr = start_ws_feed(vec![
        r#"{"type":"snapshot","remainingSeconds":3600}"#.to_string(),
        "not json at all".to_string(),
        reset_frame(),
    ])
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let shutdown = Shutdown::new();
    let transport = WsTransport::new(format!("ws://{addr}"), tx, Backoff::new(2_000, 2_000));
    let handle = tokio::spawn(transport.run(shutdown.subscribe()));

    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Snapshot(Snapshot::new(3600.0))
    );
    // The malformed frame is skipped, not forwarded.
    match next_event(&mut rx).await {
        TimerEvent::Reset(ResetInfo { amount, .. }) => assert_eq!(amount, 1.5),
        other => panic!("expected reset, got {other:?}"),
    }
    assert_eq!(next_event(&mut rx).await, TimerEvent::Disconnected);

    shutdown.trigger();
    timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_ws_reconnects_after_close() {
    let addr = start_ws_feed(vec![
        r#"{"type":"snapshot","remainingSeconds":90}"#.to_string(),
    ])
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let shutdown = Shutdown::new();
    let transport = WsTransport::new(format!("ws://{addr}"), tx, Backoff::new(10, 50));
    tokio::spawn(transport.run(shutdown.subscribe()));

    assert!(matches!(next_event(&mut rx).await, TimerEvent::Snapshot(_)));
    assert_eq!(next_event(&mut rx).await, TimerEvent::Disconnected);
    assert!(matches!(next_event(&mut rx).await, TimerEvent::Snapshot(_)));

    shutdown.trigger();
}

#[tokio::test]
async fn test_ws_stops_when_driver_is_gone() {
    let addr = start_ws_feed(vec![
        r#"{"type":"update","remainingSeconds":10}"#.to_string(),
    ])
    .await;

    let (tx, rx) = mpsc::channel(16);
    drop(rx);
    let shutdown = Shutdown::new();
    let transport = WsTransport::new(format!("ws://{addr}"), tx, Backoff::new(10, 50));

    timeout(WAIT, transport.run(shutdown.subscribe()))
        .await
        .expect("transport should stop once its receiver is dropped");
}

#[tokio::test]
async fn test_poll_snapshot_then_updates_then_single_disconnect() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let addr = start_programmable_backend(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                (200, format!(r#"{{"remainingSeconds":{}}}"#, 50 - n))
            } else {
                (503, String::new())
            }
        }
    })
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let shutdown = Shutdown::new();
    let transport = PollTransport::new(
        reqwest::Client::new(),
        format!("http://{addr}/timer"),
        Duration::from_millis(30),
        tx,
    );
    tokio::spawn(transport.run(shutdown.subscribe()));

    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Snapshot(Snapshot::new(50.0))
    );
    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Update(Snapshot::new(49.0))
    );
    assert_eq!(next_event(&mut rx).await, TimerEvent::Disconnected);

    // Further failures stay quiet.
    assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
    assert!(calls.load(Ordering::SeqCst) > 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_poll_skips_malformed_body_without_disconnecting() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let addr = start_programmable_backend(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            match n {
                0 => (200, r#"{"remainingSeconds":60}"#.to_string()),
                1 => (200, r#"{"remaining":"bad"}"#.to_string()),
                2 => (200, r#"{"type":"reset","address":"a","amount":1,"reference":"r"}"#.to_string()),
                _ => (200, r#"{"remainingSeconds":58}"#.to_string()),
            }
        }
    })
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let shutdown = Shutdown::new();
    let transport = PollTransport::new(
        reqwest::Client::new(),
        format!("http://{addr}/timer"),
        Duration::from_millis(30),
        tx,
    );
    tokio::spawn(transport.run(shutdown.subscribe()));

    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Snapshot(Snapshot::new(60.0))
    );
    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Update(Snapshot::new(58.0))
    );
    assert!(calls.load(Ordering::SeqCst) >= 4);

    shutdown.trigger();
}

#[tokio::test]
async fn test_poll_with_zero_interval_still_runs() {
    let addr = start_programmable_backend(|| async {
        (200, r#"{"remainingSeconds":5}"#.to_string())
    })
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let shutdown = Shutdown::new();
    let transport = PollTransport::new(
        reqwest::Client::new(),
        format!("http://{addr}/timer"),
        Duration::ZERO,
        tx,
    );
    let handle = tokio::spawn(transport.run(shutdown.subscribe()));

    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Snapshot(Snapshot::new(5.0))
    );
    shutdown.trigger();
    drop(rx);
    timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_driver_follows_live_feed() {
    let addr = start_ws_feed(vec![
        r#"{"type":"snapshot","remainingSeconds":120}"#.to_string(),
        reset_frame(),
    ])
    .await;

    let settings = TimerSettings {
        full_duration: Duration::from_secs(3600),
        history_capacity: 5,
        tick_interval: Duration::from_millis(20),
        poll_interval: Duration::from_secs(5),
    };
    let (tx, rx) = mpsc::channel(16);
    let shutdown = Shutdown::new();
    let (driver, mut views) =
        TimerDriver::new(ReconciliationTimer::with_system_clock(settings), rx);
    let driver_task = tokio::spawn(driver.run(shutdown.subscribe()));
    let transport = WsTransport::new(format!("ws://{addr}"), tx, Backoff::new(5_000, 5_000));
    tokio::spawn(transport.run(shutdown.subscribe()));

    let view = timeout(WAIT, views.wait_for(|v| v.last_event.is_some()))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert!(view.remaining_secs() > 3500);
    assert_eq!(view.history.len(), 1);

    // The feed closes after its frames; the countdown keeps running offline.
    let view = timeout(WAIT, views.wait_for(|v| !v.connected))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert!(view.deadline_ms.is_some());
    assert!(view.remaining_ms > 0);

    shutdown.trigger();
    let timer = timeout(WAIT, driver_task).await.unwrap().unwrap();
    assert_eq!(timer.history().count(), 1);
    assert!(!timer.connected());
}
