//! Async action dispatcher.
//!
//! Every remote operation follows the same protocol: fold the `*_REQUEST`
//! event, call the collaborator once, then fold either `*_SUCCESS` or an
//! error notification followed by `*_FAIL`. Catalogue reads fail without
//! the notification. Both terminal events are folded before the operation
//! returns, so a caller that sees `Err` can rely on the store already
//! showing the failure.
//!
//! An operation admitted before shutdown holds the store open until its
//! terminal event is folded; one started after shutdown is refused before
//! any event is emitted.

use crate::environment::StorefrontEnvironment;
use crate::reducer::{StorefrontReducer, storefront_reducer};
use crate::types::{StorefrontAction, StorefrontState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use storefront_core::http::{HttpError, HttpRequest};
use storefront_runtime::{Store, StoreConfig, StoreError};
use thiserror::Error;

/// Cart and checkout-profile operations
pub mod cart;
/// Payment settlements
pub mod payments;
/// Product catalogue reads
pub mod products;
/// Session lifecycle (logout, restore)
pub mod session;

pub use cart::CartActions;
pub use payments::PaymentActions;
pub use products::ProductActions;
pub use session::SessionActions;

/// Store type the dispatcher drives
pub type StorefrontStore = Store<StorefrontState, StorefrontAction, StorefrontEnvironment, StorefrontReducer>;

/// Title of the generic failure notification
pub const ERROR_TITLE: &str = "Error";
/// Body of the generic failure notification
pub const ERROR_TEXT: &str = "Something went wrong. Please try again later.";

/// Errors returned by dispatcher operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The collaborator rejected the request or answered with an unexpected payload
    #[error("{operation} failed: {source}")]
    Request {
        /// Operation name, e.g. `cart.fetch`
        operation: &'static str,
        /// Raw collaborator error, as carried by the `*_FAIL` event
        #[source]
        source: HttpError,
    },

    /// A quantity change named a line that is not in the cart
    #[error("Cart item {cid} is not in the cart")]
    UnknownCartItem {
        /// Cart id that was not found
        cid: String,
    },

    /// The store refused the event
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Drives a [`StorefrontStore`] through remote operations.
///
/// Cloning is cheap; clones share the store.
#[derive(Clone)]
pub struct Dispatcher {
    store: StorefrontStore,
}

impl Dispatcher {
    /// Wrap an existing store
    #[must_use]
    pub const fn new(store: StorefrontStore) -> Self {
        Self { store }
    }

    /// Build a store with the initial state and the root reducer
    #[must_use]
    pub fn with_environment(environment: StorefrontEnvironment, config: StoreConfig) -> Self {
        Self::new(Store::with_config(
            StorefrontState::default(),
            storefront_reducer(),
            environment,
            config,
        ))
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &StorefrontStore {
        &self.store
    }

    /// The injected environment
    #[must_use]
    pub fn environment(&self) -> &StorefrontEnvironment {
        self.store.environment()
    }

    /// Cart and checkout-profile operations
    #[must_use]
    pub const fn cart(&self) -> CartActions<'_> {
        CartActions::new(self)
    }

    /// Payment operations
    #[must_use]
    pub const fn payments(&self) -> PaymentActions<'_> {
        PaymentActions::new(self)
    }

    /// Product catalogue operations
    #[must_use]
    pub const fn products(&self) -> ProductActions<'_> {
        ProductActions::new(self)
    }

    /// Session operations
    #[must_use]
    pub const fn session(&self) -> SessionActions<'_> {
        SessionActions::new(self)
    }

    /// Read the current state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&StorefrontState) -> T,
    {
        self.store.state(f).await
    }

    /// Fold one event
    pub(crate) async fn emit(&self, action: StorefrontAction) -> Result<(), DispatchError> {
        self.store.send(action).await?;
        Ok(())
    }

    /// Fold one event and read the state it produced, with no other event in between
    pub(crate) async fn emit_and_read<F, T>(&self, action: StorefrontAction, read: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&StorefrontState) -> T,
    {
        Ok(self.store.send_and_read(action, read).await?)
    }

    /// Run one remote operation through the request protocol.
    ///
    /// `decode` turns the response body into the operation's result; a
    /// decode error takes the failure path like any other rejection.
    pub(crate) async fn perform<T, D, S, F>(
        &self,
        operation: &'static str,
        started: StorefrontAction,
        request: HttpRequest,
        decode: D,
        succeeded: S,
        failed: F,
    ) -> Result<T, DispatchError>
    where
        D: FnOnce(Value) -> Result<T, HttpError>,
        S: FnOnce(&T) -> StorefrontAction,
        F: FnOnce(HttpError) -> StorefrontAction,
    {
        self.run(operation, Failure::Notify, started, request, decode, succeeded, failed)
            .await
    }

    /// Like [`Dispatcher::perform`], but a failure folds only `*_FAIL`
    pub(crate) async fn perform_quietly<T, D, S, F>(
        &self,
        operation: &'static str,
        started: StorefrontAction,
        request: HttpRequest,
        decode: D,
        succeeded: S,
        failed: F,
    ) -> Result<T, DispatchError>
    where
        D: FnOnce(Value) -> Result<T, HttpError>,
        S: FnOnce(&T) -> StorefrontAction,
        F: FnOnce(HttpError) -> StorefrontAction,
    {
        self.run(operation, Failure::Quiet, started, request, decode, succeeded, failed)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn run<T, D, S, F>(
        &self,
        operation: &'static str,
        on_failure: Failure,
        started: StorefrontAction,
        request: HttpRequest,
        decode: D,
        succeeded: S,
        failed: F,
    ) -> Result<T, DispatchError>
    where
        D: FnOnce(Value) -> Result<T, HttpError>,
        S: FnOnce(&T) -> StorefrontAction,
        F: FnOnce(HttpError) -> StorefrontAction,
    {
        let guard = self.store.begin_operation()?;
        metrics::counter!("storefront.requests.total", "operation" => operation).increment(1);
        guard.send(started).await;

        let start = Instant::now();
        let outcome = self
            .environment()
            .http
            .request(request)
            .await
            .and_then(|response| decode(response.data));
        metrics::histogram!("storefront.requests.duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(value) => {
                tracing::debug!(operation, "Remote operation succeeded");
                guard.send(succeeded(&value)).await;
                Ok(value)
            },
            Err(error) => {
                tracing::warn!(operation, %error, "Remote operation failed");
                metrics::counter!("storefront.requests.failed", "operation" => operation).increment(1);

                if on_failure == Failure::Notify {
                    let env = self.environment();
                    guard
                        .send(StorefrontAction::error_notification(
                            env.gettext(ERROR_TITLE),
                            env.gettext(ERROR_TEXT),
                        ))
                        .await;
                }
                guard.send(failed(error.clone())).await;

                Err(DispatchError::Request {
                    operation,
                    source: error,
                })
            },
        }
    }
}

/// What a failed operation folds before `*_FAIL`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Failure {
    /// The generic error notification
    Notify,
    /// Nothing
    Quiet,
}

/// Decode a response body into `T`, rejecting with [`HttpError::InvalidPayload`]
pub(crate) fn decode<T: DeserializeOwned>(data: Value) -> Result<T, HttpError> {
    serde_json::from_value(data).map_err(|e| HttpError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CartSnapshot;
    use serde_json::json;

    #[test]
    fn decode_reports_shape_errors_as_invalid_payload() {
        let result: Result<CartSnapshot, _> = decode(json!({ "amount": "many" }));
        assert!(matches!(result, Err(HttpError::InvalidPayload(_))));

        let ok: Result<CartSnapshot, _> = decode(json!({ "amount": 2 }));
        assert_eq!(ok.ok().and_then(|s| s.amount), Some(2));
    }

    #[test]
    fn request_errors_name_the_operation() {
        let error = DispatchError::Request {
            operation: "cart.fetch",
            source: HttpError::Transport("timeout".to_string()),
        };
        assert_eq!(error.to_string(), "cart.fetch failed: Transport error: timeout");

        let error: DispatchError = StoreError::ShutdownInProgress.into();
        assert_eq!(error.to_string(), "Store unavailable: Store is shutting down");
    }
}
