use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::VehicleRef;
use super::list::{Change, Predicates, Resource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    #[default]
    Available,
    Reserved,
    Sold,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Reserved => "RESERVED",
            VehicleStatus::Sold => "SOLD",
            VehicleStatus::Maintenance => "MAINTENANCE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub trim: Option<String>,
    pub mileage: Option<u32>,
    pub price: BigDecimal,
    pub status: VehicleStatus,
    pub condition: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// Only available vehicles can be reserved or test driven.
    pub fn is_bookable(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn to_ref(&self) -> VehicleRef {
        VehicleRef {
            id: self.id.clone(),
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
            price: Some(self.price.clone()),
            stock_number: self.stock_number.clone(),
            image_url: self.images.first().cloned(),
        }
    }
}

impl Resource for Vehicle {
    type Filter = VehicleFilter;
    type Draft = VehicleDraft;
    type Changes = VehicleChanges;
    const COLLECTION: &'static str = "vehicles";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    pub status: Option<VehicleStatus>,
    pub condition: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub price_min: Option<BigDecimal>,
    pub price_max: Option<BigDecimal>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilterPatch {
    pub make: Change<String>,
    pub model: Change<String>,
    pub status: Change<VehicleStatus>,
    pub condition: Change<String>,
    pub year_min: Change<i32>,
    pub year_max: Change<i32>,
    pub price_min: Change<BigDecimal>,
    pub price_max: Change<BigDecimal>,
    pub search: Change<String>,
}

impl From<VehicleFilter> for VehicleFilterPatch {
    fn from(filter: VehicleFilter) -> Self {
        Self {
            make: Change::set_or_keep(filter.make),
            model: Change::set_or_keep(filter.model),
            status: Change::set_or_keep(filter.status),
            condition: Change::set_or_keep(filter.condition),
            year_min: Change::set_or_keep(filter.year_min),
            year_max: Change::set_or_keep(filter.year_max),
            price_min: Change::set_or_keep(filter.price_min),
            price_max: Change::set_or_keep(filter.price_max),
            search: Change::set_or_keep(filter.search),
        }
    }
}

impl Predicates for VehicleFilter {
    type Patch = VehicleFilterPatch;

    fn merge(&mut self, patch: VehicleFilterPatch) {
        let VehicleFilterPatch {
            make,
            model,
            status,
            condition,
            year_min,
            year_max,
            price_min,
            price_max,
            search,
        } = patch;
        make.apply(&mut self.make);
        model.apply(&mut self.model);
        status.apply(&mut self.status);
        condition.apply(&mut self.condition);
        year_min.apply(&mut self.year_min);
        year_max.apply(&mut self.year_max);
        price_min.apply(&mut self.price_min);
        price_max.apply(&mut self.price_max);
        search.apply(&mut self.search);
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                pairs.push((key, value));
            }
        };
        push("make", self.make.clone());
        push("model", self.model.clone());
        push("status", self.status.map(|s| s.as_str().to_string()));
        push("condition", self.condition.clone());
        push("yearMin", self.year_min.map(|y| y.to_string()));
        push("yearMax", self.year_max.map(|y| y.to_string()));
        push("priceMin", self.price_min.as_ref().map(ToString::to_string));
        push("priceMax", self.price_max.as_ref().map(ToString::to_string));
        push("search", self.search.as_ref().map(|s| s.trim().to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_number: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    pub price: BigDecimal,
    pub status: VehicleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exterior_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interior_color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

/// One row of `GET /vehicles/:id/history`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleHistoryEntry {
    #[serde(default)]
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
