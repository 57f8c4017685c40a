use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::list::{Change, Predicates, Resource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Sales,
    Staff,
    Customer,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
            UserRole::Sales => "SALES",
            UserRole::Staff => "STAFF",
            UserRole::Customer => "CUSTOMER",
        }
    }

    pub fn can_manage_users(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn active_by_default() -> bool {
    true
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Resource for User {
    type Filter = UserFilter;
    type Draft = UserDraft;
    type Changes = UserChanges;
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilterPatch {
    pub role: Change<UserRole>,
    pub is_active: Change<bool>,
    pub search: Change<String>,
}

impl From<UserFilter> for UserFilterPatch {
    fn from(filter: UserFilter) -> Self {
        Self {
            role: Change::set_or_keep(filter.role),
            is_active: Change::set_or_keep(filter.is_active),
            search: Change::set_or_keep(filter.search),
        }
    }
}

impl Predicates for UserFilter {
    type Patch = UserFilterPatch;

    fn merge(&mut self, patch: UserFilterPatch) {
        patch.role.apply(&mut self.role);
        patch.is_active.apply(&mut self.is_active);
        patch.search.apply(&mut self.search);
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(role) = self.role {
            pairs.push(("role", role.as_str().to_string()));
        }
        if let Some(active) = self.is_active {
            pairs.push(("isActive", active.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
