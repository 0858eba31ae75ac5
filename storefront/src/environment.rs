//! Injected dependencies for the storefront reducers and dispatcher.

use std::sync::Arc;
use std::time::Duration;
use storefront_core::environment::{Clock, HttpClient, SystemClock};

/// Message catalogue lookup for user-visible strings.
///
/// Loading catalogues is the host application's concern; the store only asks
/// for translations of the English message ids it emits.
pub trait Localizer: Send + Sync {
    /// Translate `msgid`, falling back to `msgid` itself
    fn gettext(&self, msgid: &str) -> String;
}

/// Identity localizer: every message is shown as written
#[derive(Clone, Copy, Debug, Default)]
pub struct Untranslated;

impl Localizer for Untranslated {
    fn gettext(&self, msgid: &str) -> String {
        msgid.to_string()
    }
}

/// Backend paths, relative to the collaborator's base URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    /// Cart content resource; line updates append the cart id
    pub cart: String,
    /// Payment settlements resource
    pub settlements: String,
    /// Product catalogue; one product appends its id
    pub products: String,
    /// Product options, filtered by `product_id`
    pub product_options: String,
    /// Reviews and comments
    pub discussion: String,
    /// Category tree; a category's products live under `{categories}{id}/sra_products`
    pub categories: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            cart: "/sra_cart_content/".to_string(),
            settlements: "/sra_settlements".to_string(),
            products: "/sra_products".to_string(),
            product_options: "/options/".to_string(),
            discussion: "/sra_discussion/".to_string(),
            categories: "/categories/".to_string(),
        }
    }
}

impl Endpoints {
    /// Path of one cart line
    #[must_use]
    pub fn cart_line(&self, cid: &str) -> String {
        format!("{}{cid}", self.cart)
    }

    /// Path of one product
    #[must_use]
    pub fn product(&self, pid: &str) -> String {
        format!("{}/{pid}", self.products.trim_end_matches('/'))
    }

    /// Path of a category's product listing
    #[must_use]
    pub fn category_products(&self, category_id: &str) -> String {
        format!("{}{category_id}/sra_products", self.categories)
    }
}

/// Everything the storefront reducers and dispatcher need from the outside
#[derive(Clone)]
pub struct StorefrontEnvironment {
    /// Remote collaborator
    pub http: Arc<dyn HttpClient>,
    /// Time source for notification timestamps
    pub clock: Arc<dyn Clock>,
    /// User-visible string lookup
    pub localizer: Arc<dyn Localizer>,
    /// How long a notification stays visible; `None` keeps it until hidden
    pub notification_ttl: Option<Duration>,
    /// Backend paths
    pub endpoints: Endpoints,
}

impl StorefrontEnvironment {
    /// Default notification lifetime
    pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(4);

    /// Environment with the system clock, no translation, and default paths
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            clock: Arc::new(SystemClock),
            localizer: Arc::new(Untranslated),
            notification_ttl: Some(Self::DEFAULT_NOTIFICATION_TTL),
            endpoints: Endpoints::default(),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the localizer
    #[must_use]
    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    /// Set the notification lifetime; `None` disables auto-hide
    #[must_use]
    pub const fn with_notification_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.notification_ttl = ttl;
        self
    }

    /// Replace the backend paths
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Shorthand for `self.localizer.gettext`
    #[must_use]
    pub fn gettext(&self, msgid: &str) -> String {
        self.localizer.gettext(msgid)
    }
}
