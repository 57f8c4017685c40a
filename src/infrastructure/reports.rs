use serde_json::json;

use crate::domain::reports::{
    Activity, DashboardStats, Period, RepPerformance, SalesPerformance, SalesTarget,
};
use crate::errors::ApiError;

use super::envelope;
use super::http::HttpClient;

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct DashboardApi {
    client: HttpClient,
}

impl DashboardApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let body = self.client.get(&["dashboard", "stats"], &[]).await?;
        Ok(envelope::parse_keyed(body, "stats")?.data)
    }

    pub async fn sales_performance(&self, period: Period) -> Result<SalesPerformance, ApiError> {
        let body = self
            .client
            .get(
                &["dashboard", "sales-performance"],
                &[("period", period.as_str().to_string())],
            )
            .await?;
        let mut performance: SalesPerformance = envelope::parse_data(body)?.data;
        performance.period = period;
        Ok(performance)
    }

    pub async fn recent_activity(&self, limit: u32) -> Result<Vec<Activity>, ApiError> {
        let body = self
            .client
            .get(&["dashboard", "recent-activity"], &[("limit", limit.to_string())])
            .await?;
        Ok(envelope::parse_keyed(body, "activities")?.data)
    }
}

#[derive(Clone)]
pub struct SalesApi {
    client: HttpClient,
}

impl SalesApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn rep(&self, user_id: &str) -> Result<RepPerformance, ApiError> {
        let body = self.client.get(&["sales", "rep", user_id], &[]).await?;
        Ok(envelope::parse_keyed(body, "performance")?.data)
    }

    /// Asks the backend to recompute a rep's figures and returns them.
    pub async fn refresh_rep(&self, user_id: &str) -> Result<RepPerformance, ApiError> {
        let body = self
            .client
            .post(&["sales", "rep", user_id, "refresh"], &json!({}))
            .await?;
        log::info!("refreshed sales figures for {user_id}");
        Ok(envelope::parse_keyed(body, "performance")?.data)
    }

    /// Raw CSV export.
    pub async fn export(&self, period: Period) -> Result<String, ApiError> {
        self.client
            .get_text(&["sales", "export"], &[("period", period.as_str().to_string())])
            .await
    }

    pub async fn targets(&self, user_id: &str) -> Result<Vec<SalesTarget>, ApiError> {
        let body = self
            .client
            .get(&["sales", "targets", user_id], &[])
            .await?;
        Ok(envelope::parse_keyed(body, "targets")?.data)
    }
}
