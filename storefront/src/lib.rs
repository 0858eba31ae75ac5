//! # Storefront
//!
//! Client-side cart state for a mobile storefront: the cart reducer, a
//! notifications slice, and an async dispatcher that turns each cart
//! operation into a `*_REQUEST` event followed by `*_SUCCESS` or `*_FAIL`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront::{Dispatcher, ReqwestHttpClient, StorefrontEnvironment};
//! use storefront_runtime::StoreConfig;
//!
//! # async fn run() -> Result<(), storefront::DispatchError> {
//! let http = ReqwestHttpClient::new("https://shop.example/api/4.0");
//! let env = StorefrontEnvironment::new(Arc::new(http));
//! let dispatcher = Dispatcher::with_environment(env, StoreConfig::default());
//!
//! dispatcher.cart().fetch(true).await?;
//! dispatcher.cart().add_coupon("SAVE10").await?;
//!
//! let coupons = dispatcher.state(|s| s.cart.coupons.clone()).await;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod environment;
pub mod notifications;
pub mod reducer;
pub mod types;

pub use actions::{CartActions, DispatchError, Dispatcher, PaymentActions, ProductActions, SessionActions, StorefrontStore};
pub use api::ReqwestHttpClient;
pub use config::{Config, ConfigError};
pub use environment::{Endpoints, Localizer, StorefrontEnvironment, Untranslated};
pub use notifications::{Notification, NotificationKind, NotificationsReducer, NotificationsState};
pub use reducer::{CartReducer, StorefrontReducer, reduce, storefront_reducer};
pub use types::{
    CartLineRequest, CartProduct, CartSnapshot, CartState, CartStatePatch, CartTotals, JsonMap, Payment,
    PersistedState, StorefrontAction, StorefrontState,
};

/// Describe the metrics the dispatcher emits.
///
/// Call after installing a recorder so the descriptions reach it.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "storefront.requests.total",
        "Remote operations started, labelled by operation"
    );
    metrics::describe_counter!(
        "storefront.requests.failed",
        "Remote operations that took the failure path, labelled by operation"
    );
    metrics::describe_histogram!(
        "storefront.requests.duration_seconds",
        metrics::Unit::Seconds,
        "Time waiting on the collaborator, labelled by operation"
    );
}
