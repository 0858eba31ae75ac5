use super::{DispatchError, Dispatcher};
use crate::types::StorefrontAction;
use serde_json::Value;
use storefront_core::http::HttpRequest;

/// Products per category page
pub const CATEGORY_PAGE_SIZE: u32 = 10;

/// Catalogue reads, borrowed from a [`Dispatcher`].
///
/// None of these show a notification on failure; the `*_FAIL` event is the
/// only trace.
#[derive(Clone, Copy)]
pub struct ProductActions<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> ProductActions<'a> {
    pub(crate) const fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Fetch one product, then its options and the first discussion page.
    ///
    /// The follow-up reads run concurrently once the product has been folded.
    /// Their failures surface through their own events and do not fail the
    /// fetch.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the product itself is rejected.
    #[tracing::instrument(skip(self), fields(operation = "products.fetch"))]
    pub async fn fetch(&self, pid: &str) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        let product = self
            .dispatcher
            .perform_quietly(
                "products.fetch",
                StorefrontAction::FetchOneProductRequest,
                HttpRequest::get(env.endpoints.product(pid)),
                Ok,
                |product| StorefrontAction::FetchOneProductSuccess {
                    product: product.clone(),
                },
                |error| StorefrontAction::FetchOneProductFail { error },
            )
            .await?;

        let (options, discussion) = tokio::join!(self.fetch_options(pid), self.fetch_discussion(pid, 1));
        for error in [options.err(), discussion.err()].into_iter().flatten() {
            tracing::debug!(%error, pid, "Product follow-up read failed");
        }

        Ok(product)
    }

    /// Fetch the options of one product
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self), fields(operation = "products.fetch_options"))]
    pub async fn fetch_options(&self, pid: &str) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        self.dispatcher
            .perform_quietly(
                "products.fetch_options",
                StorefrontAction::FetchProductOptionsRequest,
                HttpRequest::get(env.endpoints.product_options.clone()).with_query("product_id", pid),
                Ok,
                |options| StorefrontAction::FetchProductOptionsSuccess {
                    options: options.clone(),
                },
                |error| StorefrontAction::FetchProductOptionsFail { error },
            )
            .await
    }

    /// Fetch one page of a product's reviews and comments
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self), fields(operation = "products.fetch_discussion"))]
    pub async fn fetch_discussion(&self, pid: &str, page: u32) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        let request = HttpRequest::get(env.endpoints.discussion.clone())
            .with_query("object_type", "P")
            .with_query("object_id", pid)
            .with_query("params[page]", page.to_string());

        self.dispatcher
            .perform_quietly(
                "products.fetch_discussion",
                StorefrontAction::FetchDiscussionRequest,
                request,
                Ok,
                |discussion| StorefrontAction::FetchDiscussionSuccess {
                    discussion: discussion.clone(),
                    page,
                },
                |error| StorefrontAction::FetchDiscussionFail { error },
            )
            .await
    }

    /// Search the catalogue; every pair in `params` becomes a query parameter
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self, params), fields(operation = "products.search", params = params.len()))]
    pub async fn search(&self, params: &[(&str, &str)]) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        let request = params
            .iter()
            .fold(HttpRequest::get(env.endpoints.products.clone()), |request, (key, value)| {
                request.with_query(*key, *value)
            });

        self.dispatcher
            .perform_quietly(
                "products.search",
                StorefrontAction::SearchProductsRequest,
                request,
                Ok,
                |response| StorefrontAction::SearchProductsSuccess {
                    response: response.clone(),
                },
                |error| StorefrontAction::SearchProductsFail { error },
            )
            .await
    }

    /// Fetch one page of a category's products, subcategories included
    ///
    /// # Errors
    ///
    /// [`DispatchError::Request`] if the collaborator rejects.
    #[tracing::instrument(skip(self), fields(operation = "products.fetch_by_category"))]
    pub async fn fetch_by_category(&self, category_id: &str, page: u32) -> Result<Value, DispatchError> {
        let env = self.dispatcher.environment();
        let request = HttpRequest::get(env.endpoints.category_products(category_id))
            .with_query("items_per_page", CATEGORY_PAGE_SIZE.to_string())
            .with_query("page", page.to_string())
            .with_query("subcats", "Y");

        self.dispatcher
            .perform_quietly(
                "products.fetch_by_category",
                StorefrontAction::FetchProductsRequest,
                request,
                Ok,
                |response| StorefrontAction::FetchProductsSuccess {
                    response: response.clone(),
                },
                |error| StorefrontAction::FetchProductsFail { error },
            )
            .await
    }
}
