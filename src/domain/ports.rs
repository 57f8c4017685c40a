use async_trait::async_trait;
use mockall::automock;

use super::checkout::{CartCheckoutRequest, CheckoutResult};
use super::list::{ListFilters, Page, Resource};
use crate::errors::ApiError;

/// A paginated collection endpoint for one entity type.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync + 'static {
    async fn list(&self, filters: &ListFilters<R::Filter>) -> Result<Page<R>, ApiError>;
    async fn create(&self, draft: R::Draft) -> Result<R, ApiError>;
    async fn update(&self, id: &str, changes: R::Changes) -> Result<R, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

#[automock]
#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    /// Submits every cart item in one request.
    async fn cart_checkout(
        &self,
        request: &CartCheckoutRequest,
    ) -> Result<CheckoutResult, ApiError>;
}
