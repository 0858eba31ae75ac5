use super::{DispatchError, Dispatcher};
use crate::types::StorefrontAction;
use serde_json::Value;
use storefront_core::http::HttpRequest;

/// Payment operations, borrowed from a [`Dispatcher`]
#[derive(Clone, Copy)]
pub struct PaymentActions<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> PaymentActions<'a> {
    pub(crate) const fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Submit a payment settlement. `data` is forwarded as the request body;
    /// the response is returned as-is for the payment flow to act on.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self, data), fields(operation = "payments.settlements"))]
    pub async fn settlements(&self, data: Value) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform(
                "payments.settlements",
                StorefrontAction::SettlementsRequest,
                HttpRequest::post(env.endpoints.settlements.clone()).with_body(data),
                Ok,
                |response| StorefrontAction::SettlementsSuccess {
                    response: response.clone(),
                },
                |error| StorefrontAction::SettlementsFail { error },
            )
            .await
    }
}
