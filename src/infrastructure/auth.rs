use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::user::User;
use crate::errors::ApiError;

use super::envelope;
use super::http::HttpClient;
use super::token_store::TokenStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Login, registration and the current-user lookup. A successful login or
/// registration installs the token on the shared transport and persists it.
pub struct AuthApi {
    client: HttpClient,
    store: Arc<dyn TokenStore>,
}

impl AuthApi {
    pub fn new(client: HttpClient, store: Arc<dyn TokenStore>) -> Self {
        Self { client, store }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let body = self.client.post(&["auth", "login"], credentials).await?;
        self.start(envelope::parse_data(body)?.data)
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session, ApiError> {
        let body = self.client.post(&["auth", "register"], registration).await?;
        self.start(envelope::parse_data(body)?.data)
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let body = self.client.get(&["auth", "me"], &[]).await?;
        Ok(envelope::parse_keyed(body, "user")?.data)
    }

    /// Loads a persisted token into the transport. Returns whether one was
    /// found.
    pub fn restore(&self) -> Result<bool, ApiError> {
        let token = self.store.load()?;
        let found = token.is_some();
        self.client.set_token(token);
        if found {
            log::debug!("restored stored auth token");
        }
        Ok(found)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.set_token(None);
        self.store.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.token().is_some()
    }

    fn start(&self, session: Session) -> Result<Session, ApiError> {
        self.client.set_token(Some(session.token.clone()));
        self.store.save(&session.token)?;
        log::info!("signed in as {} ({})", session.user.email, session.user.role.as_str());
        Ok(session)
    }
}
