//! Storefront cart client demo.
//!
//! Loads configuration from the environment, optionally restores a persisted
//! cart, fetches the live cart and checkout profile, and logs a summary.
//!
//! ```bash
//! STOREFRONT_API_URL=https://shop.example/api/4.0 \
//! STOREFRONT_STATE_FILE=./cart-state.json \
//!   cargo run --bin storefront
//! ```

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use storefront::{Config, Dispatcher, PersistedState, ReqwestHttpClient, StorefrontEnvironment};
use storefront_runtime::metrics::MetricsRecorder;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_level);

    let mut recorder = MetricsRecorder::new();
    recorder.install().context("installing metrics recorder")?;
    storefront::describe_metrics();

    config.validate().context("invalid configuration")?;
    info!(api = %config.api.url, "Starting storefront client");

    let http = ReqwestHttpClient::new(config.api.url.clone()).with_token(config.api.token.clone());
    let env = StorefrontEnvironment::new(Arc::new(http))
        .with_endpoints(config.endpoints())
        .with_notification_ttl(config.notification_ttl());
    let dispatcher = Dispatcher::with_environment(env, config.store_config());

    if let Some(path) = &config.state_file {
        match read_persisted(path).await {
            Ok(persisted) => {
                dispatcher.session().restore(persisted).await?;
                info!(path = %path.display(), "Restored persisted state");
            },
            Err(error) => warn!(path = %path.display(), error = %format!("{error:#}"), "Ignoring persisted state"),
        }
    }

    let cart = dispatcher.cart();
    let (fetched, profile) = futures::future::join(cart.fetch(true), cart.fetch_user_data()).await;
    if let Err(error) = &fetched {
        warn!(%error, "Cart fetch failed");
    }
    if let Err(error) = &profile {
        warn!(%error, "Checkout profile fetch failed");
    }

    let state = dispatcher.store().snapshot().await;
    let cart = &state.cart;
    info!(
        items = cart.amount,
        lines = cart.products.len(),
        total = ?cart.total,
        subtotal = ?cart.subtotal,
        coupons = ?cart.coupons,
        vendors = ?cart.vendor_ids().collect::<Vec<_>>(),
        separate = cart.is_separate_cart,
        profile_fields = cart.user_data.len(),
        "Cart summary"
    );
    for notification in &state.notifications.items {
        info!(kind = ?notification.kind, title = %notification.title, text = %notification.text, "Notification");
    }

    if let Some(rendered) = recorder.render() {
        tracing::debug!(metrics = %rendered, "Metrics snapshot");
    }

    dispatcher
        .store()
        .shutdown_default()
        .await
        .context("shutting down store")?;
    info!("Storefront client stopped");

    Ok(())
}

async fn read_persisted(path: &Path) -> anyhow::Result<PersistedState> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
