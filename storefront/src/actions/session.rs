use super::{DispatchError, Dispatcher};
use crate::types::{PersistedState, StorefrontAction};

/// Session lifecycle operations, borrowed from a [`Dispatcher`]
#[derive(Clone, Copy)]
pub struct SessionActions<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> SessionActions<'a> {
    pub(crate) const fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// End the session; the cart returns to its initial value
    ///
    /// # Errors
    ///
    /// [`DispatchError::Store`] if the store is shutting down.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), DispatchError> {
        self.dispatcher.emit(StorefrontAction::AuthLogout).await
    }

    /// Hand persisted state back to the store at startup
    ///
    /// # Errors
    ///
    /// [`DispatchError::Store`] if the store is shutting down.
    #[tracing::instrument(skip(self, persisted), fields(has_cart = persisted.cart.is_some()))]
    pub async fn restore(&self, persisted: PersistedState) -> Result<(), DispatchError> {
        self.dispatcher
            .emit(StorefrontAction::RestoreState { persisted })
            .await
    }
}
