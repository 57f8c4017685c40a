use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::list::{Change, Predicates, Resource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Qualified => "QUALIFIED",
            LeadStatus::Proposal => "PROPOSAL",
            LeadStatus::Negotiation => "NEGOTIATION",
            LeadStatus::ClosedWon => "CLOSED_WON",
            LeadStatus::ClosedLost => "CLOSED_LOST",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, LeadStatus::ClosedWon | LeadStatus::ClosedLost)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl LeadPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadPriority::Low => "LOW",
            LeadPriority::Medium => "MEDIUM",
            LeadPriority::High => "HIGH",
        }
    }
}

/// A sales lead, flattened from the nested customer/assignee records the
/// backend returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub source: Option<String>,
    pub vehicle_id: Option<String>,
    pub vehicle_interest: Option<String>,
    pub assigned_to: Option<String>,
    pub assigned_to_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Resource for Lead {
    type Filter = LeadFilter;
    type Draft = LeadDraft;
    type Changes = LeadChanges;
    const COLLECTION: &'static str = "leads";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl LeadFilter {
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Per-predicate update of a [`LeadFilter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilterPatch {
    pub status: Change<LeadStatus>,
    pub priority: Change<LeadPriority>,
    pub source: Change<String>,
    pub assigned_to: Change<String>,
    pub search: Change<String>,
    pub date_from: Change<NaiveDate>,
    pub date_to: Change<NaiveDate>,
}

impl From<LeadFilter> for LeadFilterPatch {
    fn from(filter: LeadFilter) -> Self {
        Self {
            status: Change::set_or_keep(filter.status),
            priority: Change::set_or_keep(filter.priority),
            source: Change::set_or_keep(filter.source),
            assigned_to: Change::set_or_keep(filter.assigned_to),
            search: Change::set_or_keep(filter.search),
            date_from: Change::set_or_keep(filter.date_from),
            date_to: Change::set_or_keep(filter.date_to),
        }
    }
}

impl Predicates for LeadFilter {
    type Patch = LeadFilterPatch;

    fn merge(&mut self, patch: LeadFilterPatch) {
        patch.status.apply(&mut self.status);
        patch.priority.apply(&mut self.priority);
        patch.source.apply(&mut self.source);
        patch.assigned_to.apply(&mut self.assigned_to);
        patch.search.apply(&mut self.search);
        patch.date_from.apply(&mut self.date_from);
        patch.date_to.apply(&mut self.date_to);
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if let Some(source) = &self.source {
            pairs.push(("source", source.clone()));
        }
        if let Some(assigned_to) = &self.assigned_to {
            pairs.push(("assignedTo", assigned_to.clone()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("dateFrom", from.to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("dateTo", to.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<LeadPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload of `PATCH /leads/bulk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkLeadUpdate {
    pub lead_ids: Vec<String>,
    pub updates: LeadChanges,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadStats {
    pub total: u64,
    pub new_this_week: u64,
    pub conversion_rate: f64,
    pub by_status: Vec<StatusCount>,
    pub by_source: Vec<SourceCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overwrites_set_predicates() {
        let mut filter = LeadFilter {
            source: Some("website".to_string()),
            ..LeadFilter::default()
        };
        filter.merge(LeadFilter::status(LeadStatus::Contacted).into());
        assert_eq!(filter.status, Some(LeadStatus::Contacted));
        assert_eq!(filter.source.as_deref(), Some("website"));
    }

    #[test]
    fn clearing_status_keeps_source() {
        let mut filter = LeadFilter {
            status: Some(LeadStatus::New),
            source: Some("web".to_string()),
            ..LeadFilter::default()
        };
        filter.merge(LeadFilterPatch {
            status: Change::Clear,
            ..LeadFilterPatch::default()
        });
        assert_eq!(filter.status, None);
        assert_eq!(filter.query_pairs(), vec![("source", "web".to_string())]);
    }

    #[test]
    fn query_pairs_skip_blank_search() {
        let filter = LeadFilter {
            status: Some(LeadStatus::ClosedWon),
            search: Some("   ".to_string()),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..LeadFilter::default()
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("status", "CLOSED_WON".to_string()),
                ("dateFrom", "2024-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn changes_serialize_only_set_fields() {
        let changes = LeadChanges {
            status: Some(LeadStatus::Qualified),
            ..LeadChanges::default()
        };
        assert_eq!(
            serde_json::to_value(&changes).expect("serialize"),
            serde_json::json!({ "status": "QUALIFIED" })
        );
    }

    #[test]
    fn closed_statuses() {
        assert!(LeadStatus::ClosedLost.is_closed());
        assert!(!LeadStatus::Negotiation.is_closed());
    }
}
