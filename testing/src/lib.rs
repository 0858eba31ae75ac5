//! # Storefront Testing
//!
//! Testing utilities and helpers for the storefront state container.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (`FixedClock`, `MockHttpClient`)
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - [`ActionRecorder`], which collects the actions a store folded
//!
//! ## Example
//!
//! ```ignore
//! use storefront_testing::{ActionRecorder, MockHttpClient};
//! use storefront_core::http::HttpMethod;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn fetch_folds_request_then_success() {
//!     let http = MockHttpClient::new()
//!         .with_ok(HttpMethod::Get, "/sra_cart_content/", json!({ "amount": 0 }));
//!     let dispatcher = dispatcher_with(http);
//!     let mut recorder = ActionRecorder::new(dispatcher.store().subscribe_actions());
//!
//!     dispatcher.cart().fetch(true).await?;
//!
//!     let kinds: Vec<_> = recorder.drain().iter().map(|a| a.kind()).collect();
//!     assert_eq!(kinds, ["CART_REQUEST", "CART_SUCCESS"]);
//! }
//! ```

use chrono::{DateTime, Utc};
use storefront_core::environment::Clock;

/// Reducer test harness
pub mod reducer_test;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::Duration;
    use storefront_core::http::{
        HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse,
    };

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_testing::mocks::FixedClock;
    /// use storefront_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }

    type Scripted = Result<Value, HttpError>;

    #[derive(Default)]
    struct MockState {
        queued: HashMap<(HttpMethod, String), VecDeque<Scripted>>,
        always: HashMap<(HttpMethod, String), Scripted>,
        requests: Vec<HttpRequest>,
        latency: Option<Duration>,
    }

    /// Scripted HTTP collaborator
    ///
    /// Responses are keyed by `(method, path)`. Queued responses are served
    /// first, in FIFO order; once a queue is empty the `always` response for
    /// that key is served. A request with nothing scripted rejects with a 404
    /// [`HttpError::Status`]. Every request is recorded, including query and body.
    ///
    /// Clones share the same script and request log.
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_testing::MockHttpClient;
    /// use storefront_core::http::{HttpError, HttpMethod};
    /// use serde_json::json;
    ///
    /// let http = MockHttpClient::new()
    ///     .with_ok(HttpMethod::Get, "/sra_cart_content/", json!({ "amount": 2 }))
    ///     .with_err(HttpMethod::Delete, "/sra_cart_content/", HttpError::Transport("timeout".into()));
    ///
    /// assert_eq!(http.request_count(), 0);
    /// ```
    #[derive(Clone, Default)]
    pub struct MockHttpClient {
        inner: Arc<Mutex<MockState>>,
    }

    impl MockHttpClient {
        /// Create a client with nothing scripted
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, MockState> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Queue one response for `(method, path)`
        pub fn enqueue(&self, method: HttpMethod, path: impl Into<String>, response: Result<Value, HttpError>) {
            self.lock()
                .queued
                .entry((method, path.into()))
                .or_default()
                .push_back(response);
        }

        /// Serve `response` for `(method, path)` whenever its queue is empty
        pub fn always(&self, method: HttpMethod, path: impl Into<String>, response: Result<Value, HttpError>) {
            self.lock().always.insert((method, path.into()), response);
        }

        /// Builder form of [`MockHttpClient::enqueue`] with a resolved body
        #[must_use]
        pub fn with_ok(self, method: HttpMethod, path: impl Into<String>, data: Value) -> Self {
            self.enqueue(method, path, Ok(data));
            self
        }

        /// Builder form of [`MockHttpClient::enqueue`] with a rejection
        #[must_use]
        pub fn with_err(self, method: HttpMethod, path: impl Into<String>, error: HttpError) -> Self {
            self.enqueue(method, path, Err(error));
            self
        }

        /// Delay every response, to let concurrent operations interleave
        #[must_use]
        pub fn with_latency(self, latency: Duration) -> Self {
            self.lock().latency = Some(latency);
            self
        }

        /// Every request issued so far, in issue order
        #[must_use]
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.lock().requests.clone()
        }

        /// Number of requests issued so far
        #[must_use]
        pub fn request_count(&self) -> usize {
            self.lock().requests.len()
        }

        fn next_response(&self, request: &HttpRequest) -> (Scripted, Option<Duration>) {
            let mut state = self.lock();
            state.requests.push(request.clone());

            let key = (request.method, request.path.clone());
            let scripted = state
                .queued
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
                .or_else(|| state.always.get(&key).cloned())
                .unwrap_or_else(|| {
                    Err(HttpError::Status {
                        status: 404,
                        body: format!("no scripted response for {} {}", request.method, request.path),
                    })
                });

            (scripted, state.latency)
        }
    }

    impl HttpClient for MockHttpClient {
        fn request(&self, request: HttpRequest) -> HttpFuture<'_> {
            let (scripted, latency) = self.next_response(&request);
            Box::pin(async move {
                if let Some(latency) = latency {
                    tokio::time::sleep(latency).await;
                }
                scripted.map(HttpResponse::new)
            })
        }
    }
}

/// Helpers for observing a running store
pub mod helpers {
    use std::time::Duration;
    use tokio::sync::broadcast::{self, error::TryRecvError};

    /// Collects the actions a store broadcasts.
    ///
    /// Subscribe before driving the store; the recorder only sees actions
    /// folded after its receiver was created.
    pub struct ActionRecorder<A> {
        rx: broadcast::Receiver<A>,
        lagged: u64,
    }

    impl<A: Clone> ActionRecorder<A> {
        /// Wrap a receiver from `Store::subscribe_actions`
        #[must_use]
        pub const fn new(rx: broadcast::Receiver<A>) -> Self {
            Self { rx, lagged: 0 }
        }

        /// Take every action received so far without waiting
        pub fn drain(&mut self) -> Vec<A> {
            let mut actions = Vec::new();
            loop {
                match self.rx.try_recv() {
                    Ok(action) => actions.push(action),
                    Err(TryRecvError::Lagged(skipped)) => self.lagged += skipped,
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
            actions
        }

        /// Wait for the next action, up to `timeout`
        pub async fn next(&mut self, timeout: Duration) -> Option<A> {
            tokio::time::timeout(timeout, async {
                loop {
                    match self.rx.recv().await {
                        Ok(action) => return Some(action),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => self.lagged += skipped,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            })
            .await
            .ok()
            .flatten()
        }

        /// Number of actions lost because the recorder fell behind
        #[must_use]
        pub const fn lagged(&self) -> u64 {
            self.lagged
        }
    }

    /// Install a test-friendly tracing subscriber once per process.
    ///
    /// Honours `RUST_LOG`; defaults to `warn`.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::{ActionRecorder, init_test_tracing};
pub use mocks::{FixedClock, MockHttpClient, test_clock};
pub use reducer_test::{ReducerTest, assertions};
