use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use super::envelope;
use crate::config::Config;
use crate::errors::ApiError;

pub type Query<'a> = &'a [(&'static str, String)];

/// Thin JSON transport over the dealership API: base URL, bearer token,
/// status handling. Cheap to clone; clones share the token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    base_url: Arc<str>,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(http, &config.api_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The base URL with `segments` appended. Each segment is
    /// percent-encoded, so an id can never add or break a path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let invalid = |reason: String| ApiError::Config(format!("API URL {}: {reason}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get(&self, path: &[&str], query: Query<'_>) -> Result<Value, ApiError> {
        self.request::<()>(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<Value, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &[&str]) -> Result<Value, ApiError> {
        self.request::<()>(Method::DELETE, path, &[], None).await
    }

    /// Sends one request and returns the decoded JSON body. Non-2xx replies
    /// become [`ApiError::Status`] carrying the server's messages when it
    /// sent any.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &[&str],
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let text = self.send(method, path, query, body).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Like [`HttpClient::get`] but returns the raw body, for CSV exports.
    pub async fn get_text(&self, path: &[&str], query: Query<'_>) -> Result<String, ApiError> {
        self.send::<()>(Method::GET, path, query, None).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &[&str],
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        log::debug!("{method} {url}");

        let mut builder = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::warn!("{method} {url} failed with {status}");
            return Err(status_error(status, &text));
        }
        Ok(text)
    }
}

fn status_error(status: StatusCode, body: &str) -> ApiError {
    let mut messages = serde_json::from_str::<Value>(body)
        .map(|v| envelope::error_messages(&v))
        .unwrap_or_default();
    if messages.is_empty() {
        messages.push(
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        );
    }
    ApiError::Status {
        status: status.as_u16(),
        messages,
    }
}
