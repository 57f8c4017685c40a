use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::lead::{Lead, LeadPriority, LeadStatus};
use crate::domain::vehicle::{Vehicle, VehicleStatus};
use crate::errors::ApiError;

// ── Leads ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerRecord>,
    pub status: LeadStatus,
    #[serde(default)]
    pub priority: Option<LeadPriority>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub vehicle: Option<VehicleSummaryRecord>,
    #[serde(default)]
    pub interest: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<AssigneeRecord>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummaryRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// `assignedTo` is either a bare user id or a populated user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssigneeRecord {
    Id(String),
    User {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default, rename = "firstName")]
        first_name: Option<String>,
        #[serde(default, rename = "lastName")]
        last_name: Option<String>,
    },
}

impl TryFrom<LeadRecord> for Lead {
    type Error = ApiError;

    fn try_from(r: LeadRecord) -> Result<Self, Self::Error> {
        let customer = r.customer.unwrap_or(CustomerRecord {
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
        });
        let email = non_blank(r.email)
            .or(non_blank(customer.email))
            .ok_or_else(|| ApiError::Shape(format!("lead {} has no email", r.id)))?;

        let (assigned_to, assigned_to_name) = match r.assigned_to {
            Some(AssigneeRecord::Id(id)) => (Some(id), None),
            Some(AssigneeRecord::User {
                id,
                first_name,
                last_name,
            }) => {
                let name = [first_name, last_name]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                (Some(id), non_blank(Some(name)))
            }
            None => (None, None),
        };

        let vehicle_interest = r
            .vehicle
            .as_ref()
            .and_then(|v| {
                let parts: Vec<String> = [
                    v.year.map(|y| y.to_string()),
                    v.make.clone(),
                    v.model.clone(),
                ]
                .into_iter()
                .flatten()
                .collect();
                non_blank(Some(parts.join(" ")))
            })
            .or(non_blank(r.interest));

        Ok(Lead {
            vehicle_id: r.vehicle_id.or(r.vehicle.map(|v| v.id)),
            first_name: non_blank(r.first_name)
                .or(non_blank(customer.first_name))
                .unwrap_or_default(),
            last_name: non_blank(r.last_name)
                .or(non_blank(customer.last_name))
                .unwrap_or_default(),
            phone: non_blank(r.phone).or(non_blank(customer.phone)),
            id: r.id,
            email,
            status: r.status,
            priority: r.priority.unwrap_or_default(),
            source: r.source,
            vehicle_interest,
            assigned_to,
            assigned_to_name,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

// ── Vehicles ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub stock_number: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub mileage: Option<u32>,
    pub price: DecimalRecord,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub exterior_color: Option<String>,
    #[serde(default)]
    pub interior_color: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Prices arrive as JSON numbers or as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DecimalRecord {
    Number(serde_json::Number),
    Text(String),
}

impl DecimalRecord {
    fn parse(&self) -> Result<BigDecimal, ApiError> {
        let raw = match self {
            DecimalRecord::Number(n) => n.to_string(),
            DecimalRecord::Text(s) => s.trim().trim_start_matches('$').replace(',', ""),
        };
        BigDecimal::from_str(&raw).map_err(|e| ApiError::Shape(format!("invalid price '{raw}': {e}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageRecord {
    Url(String),
    Object { url: String },
}

impl ImageRecord {
    fn into_url(self) -> String {
        match self {
            ImageRecord::Url(url) | ImageRecord::Object { url } => url,
        }
    }
}

impl TryFrom<VehicleRecord> for Vehicle {
    type Error = ApiError;

    fn try_from(r: VehicleRecord) -> Result<Self, Self::Error> {
        Ok(Vehicle {
            price: r.price.parse()?,
            id: r.id,
            vin: r.vin,
            stock_number: r.stock_number,
            make: r.make,
            model: r.model,
            year: r.year,
            trim: r.trim,
            mileage: r.mileage,
            status: r.status,
            condition: r.condition,
            exterior_color: r.exterior_color,
            interior_color: r.interior_color,
            images: r.images.into_iter().map(ImageRecord::into_url).collect(),
            features: r.features,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
