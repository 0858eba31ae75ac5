use super::{DispatchError, Dispatcher, decode};
use crate::notifications::NotificationKind;
use crate::types::{CartLineRequest, CartSnapshot, CartTotals, JsonMap, StorefrontAction};
use serde::Deserialize;
use serde_json::{Value, json};
use storefront_core::http::HttpRequest;

/// Title of the add-to-cart confirmation
pub const ADDED_TITLE: &str = "Success";
/// Body of the add-to-cart confirmation
pub const ADDED_TEXT: &str = "The product was added to your cart.";

/// Body of a checkout-profile fetch
#[derive(Deserialize)]
struct UserDataResponse {
    #[serde(default)]
    user_data: Option<Value>,
}

/// Cart and checkout-profile operations, borrowed from a [`Dispatcher`]
#[derive(Clone, Copy)]
pub struct CartActions<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> CartActions<'a> {
    pub(crate) const fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Fetch the whole cart. `fetching` is the loading flag shown meanwhile;
    /// background refreshes pass `false`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects or the body is
    /// not a cart snapshot.
    #[tracing::instrument(skip(self), fields(operation = "cart.fetch"))]
    pub async fn fetch(&self, fetching: bool) -> Result<CartSnapshot, DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform(
                "cart.fetch",
                StorefrontAction::CartRequest { fetching },
                HttpRequest::get(env.endpoints.cart.clone()),
                decode::<CartSnapshot>,
                |cart| StorefrontAction::CartSuccess {
                    vendor_id: None,
                    cart: cart.clone(),
                },
                |error| StorefrontAction::CartFail { error },
            )
            .await
    }

    /// Fetch one vendor's cart; the snapshot is appended to `vendor_carts`
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects or the body is
    /// not a cart snapshot.
    #[tracing::instrument(skip(self), fields(operation = "cart.fetch_vendor"))]
    pub async fn fetch_vendor(&self, vendor_id: &str) -> Result<CartSnapshot, DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform(
                "cart.fetch_vendor",
                StorefrontAction::CartRequest { fetching: true },
                HttpRequest::get(env.endpoints.cart.clone()).with_query("vendor_id", vendor_id),
                decode::<CartSnapshot>,
                |cart| StorefrontAction::CartSuccess {
                    vendor_id: Some(vendor_id.to_string()),
                    cart: cart.clone(),
                },
                |error| StorefrontAction::CartFail { error },
            )
            .await
    }

    /// Add products, optionally confirm with a toast, then refresh the cart
    /// in the background.
    ///
    /// Returns the add response. A failed refresh is surfaced through its own
    /// events and does not fail the add.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the add is rejected.
    #[tracing::instrument(skip(self, lines), fields(operation = "cart.add", lines = lines.len()))]
    pub async fn add(&self, lines: Vec<CartLineRequest>, show_notification: bool) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        let products: JsonMap = lines
            .into_iter()
            .map(|line| {
                let key = line.product_id.clone();
                (key, json!(line))
            })
            .collect();

        let response = self
            .dispatcher
            .perform(
                "cart.add",
                StorefrontAction::AddToCartRequest,
                HttpRequest::post(env.endpoints.cart.clone()).with_body(json!({ "products": products })),
                Ok,
                |response| StorefrontAction::AddToCartSuccess {
                    response: response.clone(),
                },
                |error| StorefrontAction::AddToCartFail { error },
            )
            .await?;

        if show_notification {
            self.dispatcher
                .emit(StorefrontAction::NotificationShow {
                    kind: NotificationKind::Success,
                    title: env.gettext(ADDED_TITLE),
                    text: env.gettext(ADDED_TEXT),
                })
                .await?;
        }

        self.refresh().await;
        Ok(response)
    }

    /// Change a line's quantity: update it locally, push the change, then
    /// refresh the cart in the background.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnknownCartItem`] if `cid` is not in the cart; no
    ///   request is issued
    /// - [`DispatchError::Request`] if the update is rejected
    #[tracing::instrument(skip(self), fields(operation = "cart.change_amount"))]
    pub async fn change_amount(&self, cid: &str, amount: u32) -> Result<Value, DispatchError> {
        let known = self
            .dispatcher
            .emit_and_read(
                StorefrontAction::ChangeAmount {
                    cid: cid.to_string(),
                    amount,
                },
                |s| s.cart.products.contains_key(cid),
            )
            .await?;

        if !known {
            return Err(DispatchError::UnknownCartItem { cid: cid.to_string() });
        }

        let env = self.dispatcher.environment();
        let response = self
            .dispatcher
            .perform(
                "cart.change_amount",
                StorefrontAction::CartUpdateRequest { cid: cid.to_string() },
                HttpRequest::put(env.endpoints.cart_line(cid)).with_body(json!({ "amount": amount })),
                Ok,
                |_| StorefrontAction::CartUpdateSuccess { cid: cid.to_string() },
                |error| StorefrontAction::CartUpdateFail {
                    cid: cid.to_string(),
                    error,
                },
            )
            .await?;

        self.refresh().await;
        Ok(response)
    }

    /// Empty the cart
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self), fields(operation = "cart.clear"))]
    pub async fn clear(&self) -> Result<(), DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform(
                "cart.clear",
                StorefrontAction::CartClearRequest,
                HttpRequest::delete(env.endpoints.cart.clone()),
                |_| Ok(()),
                |_| StorefrontAction::CartClearSuccess,
                |error| StorefrontAction::CartClearFail { error },
            )
            .await
    }

    /// Load the checkout profile
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects or `user_data`
    /// is not an object.
    #[tracing::instrument(skip(self), fields(operation = "cart.fetch_user_data"))]
    pub async fn fetch_user_data(&self) -> Result<JsonMap, DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform(
                "cart.fetch_user_data",
                StorefrontAction::CartContentRequest,
                HttpRequest::get(env.endpoints.cart.clone()),
                |data| {
                    let body: UserDataResponse = decode(data)?;
                    match body.user_data {
                        None | Some(Value::Null) => Ok(JsonMap::new()),
                        Some(Value::Array(items)) if items.is_empty() => Ok(JsonMap::new()),
                        Some(Value::Object(fields)) => Ok(fields),
                        Some(other) => decode(other),
                    }
                },
                |user_data| StorefrontAction::CartContentSuccess {
                    user_data: user_data.clone(),
                },
                |error| StorefrontAction::CartContentFail { error },
            )
            .await
    }

    /// Save checkout-profile fields. On success the submitted fields are
    /// merged over the stored profile.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self, fields), fields(operation = "cart.save_user_data"))]
    pub async fn save_user_data(&self, fields: JsonMap) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform(
                "cart.save_user_data",
                StorefrontAction::CartContentSaveRequest,
                HttpRequest::put(env.endpoints.cart.clone()).with_body(json!({ "user_data": fields })),
                Ok,
                |_| StorefrontAction::CartContentSaveSuccess { fields },
                |error| StorefrontAction::CartContentSaveFail { error },
            )
            .await
    }

    /// Recalculate totals for the coupons currently applied
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects or the body is
    /// not a totals payload.
    #[tracing::instrument(skip(self), fields(operation = "cart.recalculate"))]
    pub async fn recalculate(&self) -> Result<CartTotals, DispatchError> {
        let env = self.dispatcher.environment();
        let coupons = self.dispatcher.state(|s| s.cart.coupons.clone()).await;
        let request = coupons.iter().fold(HttpRequest::get(env.endpoints.cart.clone()), |request, code| {
            request.with_query("coupon_codes[]", code)
        });

        self.dispatcher
            .perform(
                "cart.recalculate",
                StorefrontAction::CartRecalculateRequest,
                request,
                decode::<CartTotals>,
                |totals| StorefrontAction::CartRecalculateSuccess {
                    totals: totals.clone(),
                },
                |error| StorefrontAction::CartRecalculateFail { error },
            )
            .await
    }

    /// Apply a coupon code locally, then recalculate
    ///
    /// # Errors
    ///
    /// Whatever [`CartActions::recalculate`] returns.
    #[tracing::instrument(skip(self), fields(operation = "cart.add_coupon"))]
    pub async fn add_coupon(&self, code: &str) -> Result<CartTotals, DispatchError> {
        self.dispatcher
            .emit(StorefrontAction::CartAddCouponCode { code: code.to_string() })
            .await?;
        self.recalculate().await
    }

    /// Remove every copy of a coupon code locally, then recalculate
    ///
    /// # Errors
    ///
    /// Whatever [`CartActions::recalculate`] returns.
    #[tracing::instrument(skip(self), fields(operation = "cart.remove_coupon"))]
    pub async fn remove_coupon(&self, code: &str) -> Result<CartTotals, DispatchError> {
        self.dispatcher
            .emit(StorefrontAction::CartRemoveCouponCode { code: code.to_string() })
            .await?;
        self.recalculate().await
    }

    async fn refresh(&self) {
        if let Err(error) = self.fetch(false).await {
            tracing::debug!(%error, "Background cart refresh failed");
        }
    }
}
