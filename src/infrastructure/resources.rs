use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::lead::{BulkLeadUpdate, Lead, LeadStats};
use crate::domain::list::{ListFilters, Page, Resource};
use crate::domain::ports::ResourceApi;
use crate::domain::user::User;
use crate::domain::vehicle::{Vehicle, VehicleHistoryEntry};
use crate::errors::ApiError;

use super::envelope;
use super::http::HttpClient;
use super::models::{LeadRecord, VehicleRecord};

// ── Endpoint description ─────────────────────────────────────────────────────

/// How one [`Resource`] maps onto the REST API.
pub trait HttpResource: Resource {
    /// Wire shape of one item before normalisation.
    type Record: DeserializeOwned + Send;

    /// Collection path segments, e.g. `["leads"]`. Items live one segment
    /// below it.
    const PATH: &'static [&'static str];
    const CREATE_PATH: &'static [&'static str] = Self::PATH;
    const UPDATE_METHOD: Method;
    /// Key wrapping a single item in `data`, e.g. `lead`.
    const SINGULAR: &'static str;

    fn normalize(record: Self::Record) -> Result<Self, ApiError>;
}

impl HttpResource for Lead {
    type Record = LeadRecord;
    const PATH: &'static [&'static str] = &["leads"];
    const UPDATE_METHOD: Method = Method::PATCH;
    const SINGULAR: &'static str = "lead";

    fn normalize(record: LeadRecord) -> Result<Self, ApiError> {
        Lead::try_from(record)
    }
}

impl HttpResource for Vehicle {
    type Record = VehicleRecord;
    const PATH: &'static [&'static str] = &["vehicles"];
    const UPDATE_METHOD: Method = Method::PUT;
    const SINGULAR: &'static str = "vehicle";

    fn normalize(record: VehicleRecord) -> Result<Self, ApiError> {
        Vehicle::try_from(record)
    }
}

impl HttpResource for User {
    type Record = User;
    const PATH: &'static [&'static str] = &["users"];
    const CREATE_PATH: &'static [&'static str] = &["admin", "users"];
    const UPDATE_METHOD: Method = Method::PUT;
    const SINGULAR: &'static str = "user";

    fn normalize(record: User) -> Result<Self, ApiError> {
        Ok(record)
    }
}

// ── Adapter ──────────────────────────────────────────────────────────────────

pub struct HttpResourceApi<R> {
    client: HttpClient,
    _resource: PhantomData<fn() -> R>,
}

pub type LeadsApi = HttpResourceApi<Lead>;
pub type VehiclesApi = HttpResourceApi<Vehicle>;
pub type UsersApi = HttpResourceApi<User>;

impl<R> Clone for HttpResourceApi<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<R> HttpResourceApi<R> {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

impl<R: HttpResource> HttpResourceApi<R> {
    fn item_path(id: &str) -> Vec<&str> {
        R::PATH.iter().copied().chain([id]).collect()
    }

    fn single(body: Value) -> Result<R, ApiError> {
        let parsed = envelope::parse_keyed::<R::Record>(body, R::SINGULAR)?;
        R::normalize(parsed.data)
    }
}

#[async_trait]
impl<R: HttpResource> ResourceApi<R> for HttpResourceApi<R> {
    async fn list(&self, filters: &ListFilters<R::Filter>) -> Result<Page<R>, ApiError> {
        let query = filters.query_pairs();
        let body = self.client.get(R::PATH, &query).await?;
        let (records, pagination) = envelope::parse_list::<R::Record>(body, R::COLLECTION)?;
        let items = records
            .into_iter()
            .map(R::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "fetched {} {} (page {}/{})",
            items.len(),
            R::COLLECTION,
            pagination.page,
            pagination.total_pages
        );
        Ok(Page { items, pagination })
    }

    async fn create(&self, draft: R::Draft) -> Result<R, ApiError> {
        let body = self.client.post(R::CREATE_PATH, &draft).await?;
        let created = Self::single(body)?;
        log::debug!("created {} {}", R::SINGULAR, created.id());
        Ok(created)
    }

    async fn update(&self, id: &str, changes: R::Changes) -> Result<R, ApiError> {
        let body = self
            .client
            .request(R::UPDATE_METHOD, &Self::item_path(id), &[], Some(&changes))
            .await?;
        let updated = Self::single(body)?;
        log::debug!("updated {} {}", R::SINGULAR, id);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let body = self.client.delete(&Self::item_path(id)).await?;
        // 204 replies carry no envelope
        if !body.is_null() {
            envelope::open(body)?;
        }
        log::debug!("deleted {} {}", R::SINGULAR, id);
        Ok(())
    }
}

// ── Entity-specific endpoints ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BulkOutcome {
    #[serde(alias = "modifiedCount", alias = "updatedCount")]
    updated: u64,
}

impl HttpResourceApi<Lead> {
    pub async fn stats(&self) -> Result<LeadStats, ApiError> {
        let body = self.client.get(&["leads", "stats"], &[]).await?;
        Ok(envelope::parse_keyed(body, "stats")?.data)
    }

    /// Applies the same changes to several leads; returns how many changed.
    pub async fn bulk_update(&self, update: &BulkLeadUpdate) -> Result<u64, ApiError> {
        let body = self.client.patch(&["leads", "bulk"], update).await?;
        let outcome: BulkOutcome = envelope::parse_data(body)?.data;
        log::info!("bulk-updated {} of {} leads", outcome.updated, update.lead_ids.len());
        Ok(outcome.updated)
    }
}

impl HttpResourceApi<Vehicle> {
    pub async fn history(&self, id: &str) -> Result<Vec<VehicleHistoryEntry>, ApiError> {
        let body = self.client.get(&["vehicles", id, "history"], &[]).await?;
        Ok(envelope::parse_keyed(body, "history")?.data)
    }
}

impl HttpResourceApi<User> {
    pub async fn reset_password(&self, id: &str) -> Result<(), ApiError> {
        let body = self
            .client
            .post(&["users", id, "reset-password"], &json!({}))
            .await?;
        envelope::open(body)?;
        log::info!("password reset requested for user {id}");
        Ok(())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<User>, ApiError> {
        let body = self
            .client
            .get(&["users", "search"], &[("q", query.to_string())])
            .await?;
        Ok(envelope::parse_keyed(body, "users")?.data)
    }
}
