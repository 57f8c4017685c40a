use async_trait::async_trait;

use crate::domain::checkout::{CartCheckoutRequest, CheckoutResult};
use crate::domain::ports::BookingApi;
use crate::errors::ApiError;

use super::envelope::{self, Parsed};
use super::http::HttpClient;

#[derive(Clone)]
pub struct HttpBookingApi {
    client: HttpClient,
}

impl HttpBookingApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn cart_checkout(
        &self,
        request: &CartCheckoutRequest,
    ) -> Result<CheckoutResult, ApiError> {
        let body = self.client.post(&["bookings", "cart-checkout"], request).await?;
        let Parsed {
            data: mut result,
            warnings,
        } = envelope::parse_data::<CheckoutResult>(body)?;
        result.warnings = warnings;
        Ok(result)
    }
}
