//! Integration tests for Store action broadcasting
//!
//! Observers receive every folded action, the directly sent ones and the ones
//! fed back by delayed effects, in the order the store folded them.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::time::Duration;
use storefront_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use storefront_runtime::{Store, StoreConfig, StoreError};
use tokio::sync::broadcast::error::TryRecvError;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum ToastAction {
    /// Show a toast that hides itself after `ttl_ms`
    Show { id: u64, ttl_ms: u64 },
    /// Hide a toast (fed back by the delay)
    Hide { id: u64 },
    /// Simple local bump
    Bump,
}

#[derive(Debug, Clone, Default)]
struct ToastState {
    visible: Vec<u64>,
    counter: u32,
}

#[derive(Clone)]
struct ToastEnvironment;

#[derive(Clone)]
struct ToastReducer;

impl Reducer for ToastReducer {
    type State = ToastState;
    type Action = ToastAction;
    type Environment = ToastEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ToastAction::Show { id, ttl_ms } => {
                state.visible.push(id);
                smallvec![Effect::Delay {
                    duration: Duration::from_millis(ttl_ms),
                    action: Box::new(ToastAction::Hide { id }),
                }]
            },
            ToastAction::Hide { id } => {
                state.visible.retain(|visible| *visible != id);
                SmallVec::new()
            },
            ToastAction::Bump => {
                state.counter += 1;
                SmallVec::new()
            },
        }
    }
}

fn store() -> Store<ToastState, ToastAction, ToastEnvironment, ToastReducer> {
    Store::new(ToastState::default(), ToastReducer, ToastEnvironment)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ToastAction>) -> Vec<ToastAction> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(action) => out.push(action),
            Err(TryRecvError::Lagged(_)) => {},
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_subscriber_sees_sent_and_fed_back_actions_in_fold_order() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(ToastAction::Show { id: 1, ttl_ms: 40 }).await.unwrap();
    store.send(ToastAction::Show { id: 2, ttl_ms: 10 }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            ToastAction::Show { id: 1, ttl_ms: 40 },
            ToastAction::Show { id: 2, ttl_ms: 10 },
            ToastAction::Hide { id: 2 },
            ToastAction::Hide { id: 1 },
        ]
    );
    assert!(store.state(|s| s.visible.is_empty()).await);
}

#[tokio::test]
async fn test_rejected_actions_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(ToastAction::Bump).await.unwrap();
    store.shutdown(Duration::from_secs(1)).await.unwrap();
    let result = store.send(ToastAction::Bump).await;

    assert_eq!(result, Err(StoreError::ShutdownInProgress));
    assert_eq!(drain(&mut rx), vec![ToastAction::Bump]);
}

#[tokio::test]
async fn test_operation_events_are_broadcast_during_shutdown() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let guard = store.begin_operation().unwrap();
    let waiting = store.clone();
    let shutdown = tokio::spawn(async move { waiting.shutdown(Duration::from_secs(1)).await });
    tokio::time::sleep(Duration::from_millis(30)).await;

    guard.send(ToastAction::Bump).await;
    drop(guard);

    shutdown.await.expect("Task panicked").unwrap();
    assert_eq!(drain(&mut rx), vec![ToastAction::Bump]);
    assert_eq!(store.state(|s| s.counter).await, 1);
}

#[tokio::test]
async fn test_lagging_subscriber() {
    let config = StoreConfig::default().with_broadcast_capacity(4);
    let store = Store::with_config(ToastState::default(), ToastReducer, ToastEnvironment, config);

    let mut rx = store.subscribe_actions();

    for _ in 0..20 {
        store.send(ToastAction::Bump).await.ok();
    }

    let mut lagged = false;
    let mut received = 0;
    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(TryRecvError::Lagged(_)) => lagged = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    assert!(lagged, "Expected subscriber to lag");
    assert_eq!(received, 4);
    assert_eq!(store.state(|s| s.counter).await, 20);
}

#[tokio::test]
async fn test_multiple_independent_subscribers() {
    let store = store();

    let mut rx1 = store.subscribe_actions();
    let mut rx2 = store.subscribe_actions();

    store.send(ToastAction::Show { id: 7, ttl_ms: 5 }).await.ok();
    store.send(ToastAction::Bump).await.ok();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Show, bump and the fed-back hide, each
    assert_eq!(drain(&mut rx1).len(), 3);
    assert_eq!(drain(&mut rx2).len(), 3);
}
