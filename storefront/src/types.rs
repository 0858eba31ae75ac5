//! Domain types for the storefront cart.
//!
//! The backend speaks loosely-typed JSON: empty objects arrive as `[]`,
//! amounts arrive as strings, and unknown fields are common. Known fields are
//! typed here; everything else is kept as opaque JSON so it survives a round
//! trip through the state snapshot.

use crate::notifications::{NotificationKind, NotificationsState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use storefront_core::http::HttpError;
use storefront_macros::Action;

/// Opaque JSON object
pub type JsonMap = serde_json::Map<String, Value>;

/// Vendor key the backend uses for the combined cart in `carts`
pub const GENERAL_CART: &str = "general";

/// Keys owned by [`CartState`]; payload extras never overwrite them.
const RESERVED_KEYS: &[&str] = &[
    "amount",
    "products",
    "ids",
    "fetching",
    "user_data",
    "coupons",
    "vendorCarts",
    "payments",
    "total",
    "total_formatted",
    "subtotal",
    "subtotal_formatted",
    "isSeparateCart",
    "carts",
    "last_error",
];

// ============================================================================
// State
// ============================================================================

/// One line of the cart, keyed by cart id in [`CartState::products`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    /// Quantity of this line
    #[serde(default, deserialize_with = "lenient::count")]
    pub amount: u32,
    /// Everything else the backend sends for the line (name, price, images...)
    #[serde(flatten)]
    pub details: JsonMap,
}

impl CartProduct {
    /// A line with only a quantity
    #[must_use]
    pub fn with_amount(amount: u32) -> Self {
        Self {
            amount,
            details: JsonMap::new(),
        }
    }
}

/// A payment method offered for the cart, keyed by its id
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Copy of the key this payment is stored under
    #[serde(default, deserialize_with = "lenient::string")]
    pub payment_id: String,
    /// Remaining payment fields
    #[serde(flatten)]
    pub details: JsonMap,
}

/// Client-side cart slice.
///
/// Serializes to the same shape the mobile client persists, so a serialized
/// `CartState` can be restored with [`StorefrontAction::RestoreState`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartState {
    /// Number of items in the cart, as reported by the backend
    #[serde(deserialize_with = "lenient::count")]
    pub amount: u32,
    /// Cart lines keyed by cart id
    #[serde(deserialize_with = "lenient::map")]
    pub products: BTreeMap<String, CartProduct>,
    /// Reserved by the client; never written by any transition
    pub ids: Vec<String>,
    /// True while a request affecting the cart is in flight
    pub fetching: bool,
    /// Checkout profile fields (billing, shipping, contact)
    #[serde(deserialize_with = "lenient::map")]
    pub user_data: JsonMap,
    /// Applied coupon codes, in application order; duplicates allowed
    pub coupons: Vec<String>,
    /// Accumulated cart snapshots, one per vendor fetch
    #[serde(rename = "vendorCarts")]
    pub vendor_carts: Vec<CartSnapshot>,
    /// Payment methods keyed by id; each entry's `payment_id` equals its key
    #[serde(deserialize_with = "lenient::map")]
    pub payments: BTreeMap<String, Payment>,
    /// Grand total
    #[serde(deserialize_with = "lenient::opt_decimal", skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    /// Display form of the total, as the backend formats it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_formatted: Option<Value>,
    /// Total before shipping and taxes
    #[serde(deserialize_with = "lenient::opt_decimal", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    /// Display form of the subtotal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal_formatted: Option<Value>,
    /// True when the backend splits the cart per vendor
    #[serde(rename = "isSeparateCart", deserialize_with = "lenient::flag")]
    pub is_separate_cart: bool,
    /// Per-vendor carts; [`GENERAL_CART`] holds the combined one
    #[serde(deserialize_with = "lenient::map")]
    pub carts: JsonMap,
    /// Unrecognized top-level fields from cart payloads
    #[serde(flatten)]
    pub extra: JsonMap,
    /// Last locally rejected operation, cleared by the next successful cart change
    #[serde(skip)]
    pub last_error: Option<String>,
}

impl CartState {
    /// Spread a fetched snapshot over the state: fields present in the
    /// snapshot replace the current ones, absent fields are kept.
    pub fn merge_snapshot(&mut self, snapshot: CartSnapshot) {
        let CartSnapshot {
            amount,
            products,
            payments,
            total,
            total_formatted,
            subtotal,
            subtotal_formatted,
            user_data,
            is_separate_cart,
            carts,
            extra,
        } = snapshot;

        replace(&mut self.amount, amount);
        replace(&mut self.products, products);
        replace(&mut self.payments, payments);
        replace_opt(&mut self.total, total);
        replace_opt(&mut self.total_formatted, total_formatted);
        replace_opt(&mut self.subtotal, subtotal);
        replace_opt(&mut self.subtotal_formatted, subtotal_formatted);
        replace(&mut self.user_data, user_data);
        replace(&mut self.is_separate_cart, is_separate_cart);
        replace(&mut self.carts, carts);
        merge_extra(&mut self.extra, extra);
    }

    /// Overlay a persisted snapshot. Only the fields it contains change.
    ///
    /// `fetching` is never restored: no request survives a restart.
    pub fn restore(&mut self, patch: CartStatePatch) {
        let CartStatePatch {
            amount,
            products,
            ids,
            fetching: _,
            user_data,
            coupons,
            vendor_carts,
            payments,
            total,
            total_formatted,
            subtotal,
            subtotal_formatted,
            is_separate_cart,
            carts,
            extra,
        } = patch;

        replace(&mut self.amount, amount);
        replace(&mut self.products, products);
        replace(&mut self.ids, ids);
        replace(&mut self.user_data, user_data);
        replace(&mut self.coupons, coupons);
        replace(&mut self.vendor_carts, vendor_carts);
        replace(&mut self.payments, payments);
        replace_opt(&mut self.total, total);
        replace_opt(&mut self.total_formatted, total_formatted);
        replace_opt(&mut self.subtotal, subtotal);
        replace_opt(&mut self.subtotal_formatted, subtotal_formatted);
        replace(&mut self.is_separate_cart, is_separate_cart);
        replace(&mut self.carts, carts);
        merge_extra(&mut self.extra, extra);
    }

    /// The combined cart the backend reports under [`GENERAL_CART`]
    #[must_use]
    pub fn general_cart(&self) -> Option<&Value> {
        self.carts.get(GENERAL_CART)
    }

    /// Vendor ids with a cart of their own
    pub fn vendor_ids(&self) -> impl Iterator<Item = &str> {
        self.carts
            .keys()
            .map(String::as_str)
            .filter(|key| *key != GENERAL_CART)
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn replace_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn merge_extra(target: &mut JsonMap, extra: JsonMap) {
    for (key, value) in extra {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            target.insert(key, value);
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Body of a cart fetch (`CART_SUCCESS`).
///
/// Every field is optional: only the ones the backend sent are spread over
/// the state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Item count
    #[serde(default, deserialize_with = "lenient::opt_count", skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    /// Cart lines keyed by cart id
    #[serde(default, deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub products: Option<BTreeMap<String, CartProduct>>,
    /// Payment methods keyed by id
    #[serde(default, deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub payments: Option<BTreeMap<String, Payment>>,
    /// Grand total
    #[serde(default, deserialize_with = "lenient::opt_decimal", skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    /// Display form of the total
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_formatted: Option<Value>,
    /// Subtotal
    #[serde(default, deserialize_with = "lenient::opt_decimal", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    /// Display form of the subtotal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal_formatted: Option<Value>,
    /// Checkout profile, when the backend includes it
    #[serde(default, deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub user_data: Option<JsonMap>,
    /// Whether the cart is split per vendor
    #[serde(
        rename = "isSeparateCart",
        default,
        deserialize_with = "lenient::opt_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_separate_cart: Option<bool>,
    /// Per-vendor carts
    #[serde(default, deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub carts: Option<JsonMap>,
    /// Any other top-level field
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl CartSnapshot {
    /// Set every payment's `payment_id` to the key it is stored under
    pub fn denormalize_payment_ids(&mut self) {
        for (key, payment) in self.payments.iter_mut().flatten() {
            payment.payment_id.clone_from(key);
        }
    }
}

/// Body of a totals recalculation (`CART_RECALCULATE_SUCCESS`)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Grand total
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub total: Option<Decimal>,
    /// Display form of the total
    #[serde(default)]
    pub total_formatted: Option<Value>,
    /// Subtotal
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub subtotal: Option<Decimal>,
    /// Display form of the subtotal
    #[serde(default)]
    pub subtotal_formatted: Option<Value>,
    /// Coupons the backend accepted, keyed by code
    #[serde(default, deserialize_with = "lenient::map")]
    pub coupons: JsonMap,
}

/// Persisted cart slice. Only the fields present are restored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct CartStatePatch {
    #[serde(deserialize_with = "lenient::opt_count", skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub products: Option<BTreeMap<String, CartProduct>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Accepted and ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetching: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub user_data: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupons: Option<Vec<String>>,
    #[serde(rename = "vendorCarts", skip_serializing_if = "Option::is_none")]
    pub vendor_carts: Option<Vec<CartSnapshot>>,
    #[serde(deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub payments: Option<BTreeMap<String, Payment>>,
    #[serde(deserialize_with = "lenient::opt_decimal", skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_formatted: Option<Value>,
    #[serde(deserialize_with = "lenient::opt_decimal", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal_formatted: Option<Value>,
    #[serde(rename = "isSeparateCart", deserialize_with = "lenient::opt_flag", skip_serializing_if = "Option::is_none")]
    pub is_separate_cart: Option<bool>,
    #[serde(deserialize_with = "lenient::opt_map", skip_serializing_if = "Option::is_none")]
    pub carts: Option<JsonMap>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// The persisted application snapshot handed back at startup
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Cart slice, if one was persisted
    #[serde(default)]
    pub cart: Option<CartStatePatch>,
}

/// One line of an add-to-cart request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineRequest {
    /// Product to add
    pub product_id: String,
    /// Quantity to add
    pub amount: u32,
    /// Selected option values keyed by option id
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub product_options: JsonMap,
}

impl CartLineRequest {
    /// A line without options
    #[must_use]
    pub fn new(product_id: impl Into<String>, amount: u32) -> Self {
        Self {
            product_id: product_id.into(),
            amount,
            product_options: JsonMap::new(),
        }
    }

    /// Select an option value
    #[must_use]
    pub fn with_option(mut self, option_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.product_options.insert(option_id.into(), value.into());
        self
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Every event the storefront store folds.
///
/// Serializes as `{"type": "CART_REQUEST", "payload": {...}}`; `type` always
/// equals [`StorefrontAction::kind`].
#[derive(Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorefrontAction {
    /// A cart fetch started; `fetching` is the flag value to show meanwhile
    #[request]
    CartRequest {
        /// Loading flag value while the fetch runs
        fetching: bool,
    },
    /// A cart fetch resolved
    #[success]
    CartSuccess {
        /// Vendor whose cart was fetched; `None` for the whole cart
        vendor_id: Option<String>,
        /// Fetched snapshot
        cart: CartSnapshot,
    },
    /// A cart fetch rejected
    #[failure]
    CartFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// Adding products started
    #[request]
    AddToCartRequest,
    /// Adding products resolved
    #[success]
    AddToCartSuccess {
        /// Backend response body
        response: Value,
    },
    /// Adding products rejected
    #[failure]
    AddToCartFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// Emptying the cart started
    #[request]
    CartClearRequest,
    /// Emptying the cart resolved
    #[success]
    CartClearSuccess,
    /// Emptying the cart rejected
    #[failure]
    CartClearFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// Loading checkout profile started
    #[request]
    CartContentRequest,
    /// Loading checkout profile resolved
    #[success]
    CartContentSuccess {
        /// Profile fields, replacing the current ones
        user_data: JsonMap,
    },
    /// Loading checkout profile rejected
    #[failure]
    CartContentFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// Saving checkout profile started
    #[request]
    CartContentSaveRequest,
    /// Saving checkout profile resolved
    #[success]
    CartContentSaveSuccess {
        /// Fields saved, merged over the current profile
        fields: JsonMap,
    },
    /// Saving checkout profile rejected
    #[failure]
    CartContentSaveFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// A line quantity update started
    #[request]
    CartUpdateRequest {
        /// Cart id of the line
        cid: String,
    },
    /// A line quantity update resolved
    #[success]
    CartUpdateSuccess {
        /// Cart id of the line
        cid: String,
    },
    /// A line quantity update rejected
    #[failure]
    CartUpdateFail {
        /// Cart id of the line
        cid: String,
        /// Raw collaborator error
        error: HttpError,
    },

    /// A totals recalculation started
    #[request]
    CartRecalculateRequest,
    /// A totals recalculation resolved
    #[success]
    CartRecalculateSuccess {
        /// Recalculated totals
        totals: CartTotals,
    },
    /// A totals recalculation rejected
    #[failure]
    CartRecalculateFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// Optimistic local quantity change
    ChangeAmount {
        /// Cart id of the line
        cid: String,
        /// New quantity
        amount: u32,
    },
    /// Coupon code entered locally
    CartAddCouponCode {
        /// Coupon code
        code: String,
    },
    /// Coupon code removed locally; drops every equal entry
    CartRemoveCouponCode {
        /// Coupon code
        code: String,
    },

    /// A settlements request started
    #[request]
    SettlementsRequest,
    /// A settlements request resolved
    #[success]
    SettlementsSuccess {
        /// Backend response body
        response: Value,
    },
    /// A settlements request rejected
    #[failure]
    SettlementsFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// A single product fetch started
    #[request]
    FetchOneProductRequest,
    /// A single product fetch resolved
    #[success]
    FetchOneProductSuccess {
        /// Product as returned by the catalogue
        product: Value,
    },
    /// A single product fetch rejected
    #[failure]
    FetchOneProductFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// A product options fetch started
    #[request]
    FetchProductOptionsRequest,
    /// A product options fetch resolved
    #[success]
    FetchProductOptionsSuccess {
        /// Options as returned by the catalogue
        options: Value,
    },
    /// A product options fetch rejected
    #[failure]
    FetchProductOptionsFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// A product discussion fetch started
    #[request]
    FetchDiscussionRequest,
    /// A product discussion page resolved
    #[success]
    FetchDiscussionSuccess {
        /// Reviews and comments
        discussion: Value,
        /// Page that was fetched
        page: u32,
    },
    /// A product discussion fetch rejected
    #[failure]
    FetchDiscussionFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// A product search started
    #[request]
    SearchProductsRequest,
    /// A product search resolved
    #[success]
    SearchProductsSuccess {
        /// Backend response body
        response: Value,
    },
    /// A product search rejected
    #[failure]
    SearchProductsFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// A category listing fetch started
    #[request]
    FetchProductsRequest,
    /// A category listing page resolved
    #[success]
    FetchProductsSuccess {
        /// Backend response body
        response: Value,
    },
    /// A category listing fetch rejected
    #[failure]
    FetchProductsFail {
        /// Raw collaborator error
        error: HttpError,
    },

    /// Show a user-visible notification
    NotificationShow {
        /// Severity
        #[serde(rename = "type")]
        kind: NotificationKind,
        /// Localized title
        title: String,
        /// Localized body
        text: String,
    },
    /// Hide a notification by id
    NotificationHide {
        /// Notification id
        id: u64,
    },

    /// The session ended; cart returns to its initial value
    AuthLogout,
    /// Persisted state handed back at startup
    RestoreState {
        /// Snapshot to overlay
        persisted: PersistedState,
    },
}

impl StorefrontAction {
    /// Notification shown when a remote operation rejects
    #[must_use]
    pub fn error_notification(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::NotificationShow {
            kind: NotificationKind::Error,
            title: title.into(),
            text: text.into(),
        }
    }
}

// ============================================================================
// Root state
// ============================================================================

/// Root snapshot owned by the store
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StorefrontState {
    /// Cart slice
    pub cart: CartState,
    /// Visible notifications
    pub notifications: NotificationsState,
}

/// Tolerant deserializers for backend quirks
mod lenient {
    use rust_decimal::Decimal;
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Maps accept `{}`, `[]` (PHP's empty object) and `null`.
    /// A non-empty list is keyed by position.
    pub fn map<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let object = match Value::deserialize(deserializer)? {
            Value::Null => return Ok(T::default()),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
            Value::Object(object) => object,
            other => return Err(D::Error::custom(format!("expected an object, found {other}"))),
        };
        serde_json::from_value(Value::Object(object)).map_err(D::Error::custom)
    }

    pub fn opt_map<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        map(deserializer).map(Some)
    }

    /// Quantities arrive as numbers or numeric strings
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(0),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| D::Error::custom(format!("invalid quantity {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid quantity {s:?}"))),
            other => Err(D::Error::custom(format!("invalid quantity {other}"))),
        }
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        count(deserializer).map(Some)
    }

    /// Ids arrive as strings or numbers
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("invalid id {other}"))),
        }
    }

    /// Money arrives as a number or a string; `null` and `""` mean absent
    pub fn opt_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        let text = match Value::deserialize(deserializer)? {
            Value::Null => return Ok(None),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => return Err(D::Error::custom(format!("invalid amount {other}"))),
        };
        let text = text.trim();
        text.parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(text))
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid amount {text:?}")))
    }

    /// Flags arrive as booleans, `0`/`1`, or `"Y"`/`"N"`
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|n| n.abs() > f64::EPSILON)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" | "true" | "1" => Ok(true),
                "n" | "no" | "false" | "0" | "" => Ok(false),
                _ => Err(D::Error::custom(format!("invalid flag {s:?}"))),
            },
            other => Err(D::Error::custom(format!("invalid flag {other}"))),
        }
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        flag(deserializer).map(Some)
    }
}
