use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::checkout::CheckoutStep;
use crate::domain::errors::ValidationError;

/// Everything that can go wrong talking to the dealership API.
///
/// `Network` and `Status` are both network failures, `Shape` is a payload
/// that does not match the expected envelope and `Domain` is a
/// `success: false` reply carrying every message the server sent.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {}", .messages.join("; "))]
    Status { status: u16, messages: Vec<String> },

    #[error("Unexpected response: {0}")]
    Shape(String),

    #[error("{}", .0.join("; "))]
    Domain(Vec<String>),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Token storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Shape,
    Domain,
    Local,
}

impl ApiError {
    /// A domain error with a single message.
    pub fn domain(message: impl Into<String>) -> Self {
        ApiError::Domain(vec![message.into()])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) | ApiError::Status { .. } => ErrorKind::Network,
            ApiError::Shape(_) => ErrorKind::Shape,
            ApiError::Domain(_) => ErrorKind::Domain,
            ApiError::Config(_) | ApiError::Storage(_) => ErrorKind::Local,
        }
    }

    /// The single string shown inline next to a retry control.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { messages, .. } if !messages.is_empty() => messages.join("; "),
            other => other.to_string(),
        }
    }

    /// One entry per server message, or the display text when there are none.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Status { messages, .. } | ApiError::Domain(messages)
                if !messages.is_empty() =>
            {
                messages.clone()
            }
            other => vec![other.to_string()],
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        ApiError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Shape(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please complete all required fields")]
    Invalid(Vec<ValidationError>),

    #[error("A checkout is already being submitted")]
    AlreadySubmitting,

    #[error("Checkout can only be submitted from the information step (currently {})", .0.title())]
    WrongStep(CheckoutStep),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Messages for the checkout error list.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CheckoutError::Invalid(errors) => errors.iter().map(ToString::to_string).collect(),
            CheckoutError::AlreadySubmitting | CheckoutError::WrongStep(_) => {
                vec![self.to_string()]
            }
            CheckoutError::Api(e) => e.messages(),
        }
    }
}
