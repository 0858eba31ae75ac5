//! # Storefront Runtime
//!
//! Runtime implementation for the storefront state container.
//!
//! This crate provides the Store runtime that folds actions through a reducer
//! and executes the effects it returns.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state snapshot and serializes every transition
//! - **Effect Executor**: Runs delayed feedback actions
//! - **Action Broadcast**: Every folded action is published to observers, in fold order
//! - **Operations**: An admitted remote operation keeps shutdown waiting until its terminal event is folded
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(StorefrontState::default(), storefront_reducer(), environment);
//!
//! // Fold an event
//! store.send(StorefrontAction::CartRequest { fetching: true }).await?;
//!
//! // Read state
//! let fetching = store.state(|s| s.cart.fetching).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use storefront_core::{effect::Effect, reducer::Reducer};
use tokio::sync::RwLock;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned by `send()` and `begin_operation()` once shutdown has started.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects and operations to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use storefront_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(1024)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.broadcast_capacity, 1024);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for slow observers before they lag
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    ///
    /// A capacity of zero is bumped to one; the channel cannot be unbuffered.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 256,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, Duration, Effect, Ordering, Reducer, RwLock, StoreConfig, StoreError};
    use storefront_core::SmallVec;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; the write lock serializes transitions)
    /// 2. Reducer (transition logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Every action folded through [`Store::send`] is published on the action
    /// broadcast while the write lock is still held, so observers see actions
    /// in exactly the order they were folded.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        action_broadcast: broadcast::Sender<A>,
    }

    /// A remote operation admitted before shutdown started.
    ///
    /// While the guard lives, [`Store::shutdown`] keeps waiting, and events sent
    /// through the guard are folded even after the shutdown flag is set. Its
    /// terminal event therefore always reaches the state.
    pub struct OperationGuard<'a, S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        store: &'a Store<S, A, E, R>,
        _pending: AtomicCounterGuard,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```ignore
        /// let config = StoreConfig::default().with_broadcast_capacity(1024);
        /// let store = Store::with_config(state, reducer, environment, config);
        /// ```
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Injected dependencies shared with the reducer
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions and operations)
        /// 2. Waits for pending effects and admitted operations to complete (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending work completes.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::SeqCst);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::SeqCst);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Publishes the action to observers, still under the lock
        /// 4. Starts the returned effects; they may feed more actions back
        ///
        /// `send()` returns once the action has been folded, not when its
        /// effects complete. Concurrent `send()` calls serialize at the reducer.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError>
        where
            R: Clone,
            E: Clone,
        {
            self.send_and_read(action, |_| ()).await
        }

        /// Send an action and read the state it produced under the same lock
        ///
        /// No other action can be folded between the transition and `read`.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_and_read<F, T>(&self, action: A, read: F) -> Result<T, StoreError>
        where
            R: Clone,
            E: Clone,
            F: FnOnce(&S) -> T,
        {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.fold(action, read).await)
        }

        /// Admit a remote operation
        ///
        /// The returned guard counts as pending work until dropped, so a
        /// shutdown started meanwhile waits for the operation to finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if shutdown has already started.
        pub fn begin_operation(&self) -> Result<OperationGuard<'_, S, A, E, R>, StoreError> {
            // Count first, then check: a concurrent shutdown either sees the
            // count or this call sees the flag.
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            if self.shutdown.load(Ordering::SeqCst) {
                metrics::counter!("store.shutdown.rejected_operations").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.operations.started").increment(1);
            Ok(OperationGuard {
                store: self,
                _pending: pending,
            })
        }

        /// Subscribe to every action folded by this store
        ///
        /// If the receiver lags beyond the configured capacity it skips old
        /// actions and receives `RecvError::Lagged`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let line_count = store.state(|s| s.cart.products.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Clone the whole state snapshot
        pub async fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state(Clone::clone).await
        }

        async fn fold<F, T>(&self, action: A, read: F) -> T
        where
            R: Clone,
            E: Clone,
            F: FnOnce(&S) -> T,
        {
            metrics::counter!("store.actions.total").increment(1);

            let (effects, value): (SmallVec<[Effect<A>; 4]>, T) = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let observed = action.clone();
                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                // No receivers is fine; nobody is observing yet.
                let _ = self.action_broadcast.send(observed);

                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!("store.effects.count").record(effects.len() as f64);

                (effects, read(&*state))
            };

            // Feedback would be rejected by the shutdown flag anyway.
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::debug!(dropped = effects.len(), "Not starting effects during shutdown");
                return value;
            }

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect);
            }

            value
        }

        /// Execute an effect with shutdown tracking
        ///
        /// - `None`: No-op
        /// - `Delay`: Waits for duration, then sends action
        ///
        /// Effects are fire-and-forget: a panicking effect task is isolated in
        /// its spawned task and the counter guard still updates the counter.
        #[tracing::instrument(skip(self, effect), name = "execute_effect")]
        fn execute_effect(&self, effect: Effect<A>)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!(?duration, "Executing Effect::Delay");
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let pending_guard = self.track();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _pending_guard = pending_guard;

                        tokio::time::sleep(duration).await;
                        if let Err(error) = store.send(*action).await {
                            tracing::debug!(%error, "Delayed action dropped");
                        }
                    });
                },
            }
        }

        fn track(&self) -> AtomicCounterGuard {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            AtomicCounterGuard(Arc::clone(&self.pending_effects))
        }
    }

    impl<S, A, E, R> OperationGuard<'_, S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Fold one event of this operation, even if shutdown has started
        pub async fn send(&self, action: A) {
            self.store.fold(action, |_| ()).await;
        }

        /// Fold one event of this operation and read the state it produced
        pub async fn send_and_read<F, T>(&self, action: A, read: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            self.store.fold(action, read).await
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::{OperationGuard, Store};

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]

    use super::*;
    use storefront_core::{SmallVec, smallvec};

    #[derive(Debug, Clone)]
    struct BadgeState {
        count: i32,
        flashing: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum BadgeAction {
        Increment,
        Decrement,
        NoOp,
        Flash,
        Unflash,
        FlashLong,
    }

    #[derive(Debug, Clone)]
    struct BadgeEnv;

    #[derive(Debug, Clone)]
    struct BadgeReducer;

    impl Reducer for BadgeReducer {
        type State = BadgeState;
        type Action = BadgeAction;
        type Environment = BadgeEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                BadgeAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                BadgeAction::Decrement => {
                    state.count -= 1;
                    smallvec![Effect::None]
                },
                BadgeAction::NoOp => SmallVec::new(),
                BadgeAction::Flash => {
                    state.flashing = true;
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(BadgeAction::Unflash),
                    }]
                },
                BadgeAction::FlashLong => {
                    state.flashing = true;
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(80),
                        action: Box::new(BadgeAction::Unflash),
                    }]
                },
                BadgeAction::Unflash => {
                    state.flashing = false;
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> Store<BadgeState, BadgeAction, BadgeEnv, BadgeReducer> {
        Store::new(
            BadgeState {
                count: 0,
                flashing: false,
            },
            BadgeReducer,
            BadgeEnv,
        )
    }

    #[tokio::test]
    async fn test_send_action() -> Result<(), StoreError> {
        let store = store();

        store.send(BadgeAction::Increment).await?;
        store.send(BadgeAction::Increment).await?;
        store.send(BadgeAction::Decrement).await?;
        store.send(BadgeAction::NoOp).await?;

        assert_eq!(store.state(|s| s.count).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_effect_delay_feeds_action_back() -> Result<(), StoreError> {
        let store = store();

        store.send(BadgeAction::Flash).await?;
        assert!(store.state(|s| s.flashing).await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!store.state(|s| s.flashing).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_and_read_sees_own_transition() -> Result<(), StoreError> {
        let store = store();

        let count = store.send_and_read(BadgeAction::Increment, |s| s.count).await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_sends() {
        let store = store();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let _ = store.send(BadgeAction::Increment).await;
                })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                panic!("concurrent send task panicked: {e}");
            }
        }

        assert_eq!(store.state(|s| s.count).await, 10);
    }

    #[tokio::test]
    async fn test_store_clone_shares_state() -> Result<(), StoreError> {
        let first = store();
        let second = first.clone();

        first.send(BadgeAction::Increment).await?;
        assert_eq!(second.state(|s| s.count).await, 1);

        second.send(BadgeAction::Increment).await?;
        assert_eq!(first.snapshot().await.count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_every_folded_action_is_broadcast_in_order() -> Result<(), StoreError> {
        let store = store();
        let mut rx = store.subscribe_actions();

        store.send(BadgeAction::Increment).await?;
        store.send(BadgeAction::NoOp).await?;
        store.send(BadgeAction::Decrement).await?;

        let mut seen = Vec::new();
        while let Ok(action) = rx.try_recv() {
            seen.push(action);
        }

        assert_eq!(
            seen,
            vec![BadgeAction::Increment, BadgeAction::NoOp, BadgeAction::Decrement]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delayed_action_is_broadcast_after_its_trigger() -> Result<(), StoreError> {
        let store = store();
        let mut rx = store.subscribe_actions();

        store.send(BadgeAction::Flash).await?;
        let fed_back = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if let Ok(BadgeAction::Unflash) = rx.recv().await {
                    return;
                }
            }
        })
        .await;

        assert!(fed_back.is_ok(), "Unflash was never folded");
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() -> Result<(), StoreError> {
        let store = store();

        store.shutdown(Duration::from_secs(1)).await?;

        let result = store.send(BadgeAction::Increment).await;
        assert_eq!(result, Err(StoreError::ShutdownInProgress));
        assert!(matches!(store.begin_operation(), Err(StoreError::ShutdownInProgress)));
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_delayed_effects() -> Result<(), StoreError> {
        let store = store();

        store.send(BadgeAction::Flash).await?;
        store.shutdown(Duration::from_secs(1)).await?;

        // The delayed action was rejected by the shutdown flag
        assert!(store.state(|s| s.flashing).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_times_out_on_long_delay() -> Result<(), StoreError> {
        let store = store();

        store.send(BadgeAction::FlashLong).await?;
        let result = store.shutdown(Duration::from_millis(10)).await;

        assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_operation_keeps_shutdown_waiting_and_still_folds() -> Result<(), StoreError> {
        let store = store();

        let operation = store.clone();
        let running = tokio::spawn(async move {
            let Ok(guard) = operation.begin_operation() else {
                panic!("operation rejected before shutdown");
            };
            guard.send(BadgeAction::Increment).await;
            tokio::time::sleep(Duration::from_millis(60)).await;
            guard.send_and_read(BadgeAction::Decrement, |s| s.count).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.shutdown(Duration::from_secs(1)).await?;

        // Shutdown returned only after the terminal event was folded
        assert_eq!(store.state(|s| s.count).await, 0);
        match running.await {
            Ok(count) => assert_eq!(count, 0),
            Err(e) => panic!("operation task panicked: {e}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_operation_folds_do_not_start_effects_during_shutdown() -> Result<(), StoreError> {
        let store = store();
        let guard = store.begin_operation()?;

        let waiting = store.clone();
        let shutdown = tokio::spawn(async move { waiting.shutdown(Duration::from_secs(1)).await });
        tokio::time::sleep(Duration::from_millis(30)).await;

        guard.send(BadgeAction::FlashLong).await;
        drop(guard);

        match shutdown.await {
            Ok(result) => result?,
            Err(e) => panic!("shutdown task panicked: {e}"),
        }
        assert!(store.state(|s| s.flashing).await);
        Ok(())
    }

    #[test]
    fn test_config_builder_clamps_capacity() {
        let config = StoreConfig::default()
            .with_broadcast_capacity(0)
            .with_shutdown_timeout(Duration::from_secs(2));

        assert_eq!(config.broadcast_capacity, 1);
        assert_eq!(config.default_shutdown_timeout, Duration::from_secs(2));
        assert_eq!(StoreConfig::new(8, Duration::ZERO).broadcast_capacity, 8);
    }
}
