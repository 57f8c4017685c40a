//! Read-only dashboard and sales reporting payloads. The backend documents
//! these loosely, so every field defaults when absent.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_leads: u64,
    pub new_leads: u64,
    pub total_vehicles: u64,
    pub available_vehicles: u64,
    pub total_sales: u64,
    pub revenue: Option<BigDecimal>,
    pub conversion_rate: f64,
    pub upcoming_test_drives: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesPerformance {
    pub period: Period,
    pub points: Vec<SalesPoint>,
    pub total_sales: u64,
    pub total_revenue: Option<BigDecimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesPoint {
    #[serde(alias = "date")]
    pub label: String,
    pub sales: u64,
    pub revenue: Option<BigDecimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "type")]
    pub kind: String,
    pub description: String,
    pub user_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Performance summary of one sales representative.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepPerformance {
    pub user_id: String,
    pub name: String,
    pub leads_assigned: u64,
    pub leads_converted: u64,
    pub conversion_rate: f64,
    pub total_sales: u64,
    pub revenue: Option<BigDecimal>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesTarget {
    pub user_id: String,
    pub period: Period,
    pub target_sales: u64,
    pub achieved_sales: u64,
    pub target_revenue: Option<BigDecimal>,
    pub achieved_revenue: Option<BigDecimal>,
}

impl SalesTarget {
    /// Share of the unit target met so far, 0 when no target is set.
    pub fn progress(&self) -> f64 {
        if self.target_sales == 0 {
            return 0.0;
        }
        self.achieved_sales as f64 / self.target_sales as f64
    }
}
