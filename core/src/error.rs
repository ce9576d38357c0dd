//! Error types for the workflow server client.
//!
//! # Design
//! Failures are split by where they happened: no response at all
//! (`Network`), a response with a non-2xx status (`Http`), or something
//! local to this process. `ApiError::kind` collapses them into the three
//! categories operators see, and `ApiError::user_message` renders the fixed
//! text for each category. Transport detail stays on the error for logging
//! but never leaks into the user-facing message of a network failure.

use thiserror::Error;

use crate::config::BaseUrlSelector;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Error de red: La llamada fue bloqueada (Posiblemente CORS o red). Revise la consola.";

pub const UNKNOWN_ERROR_MESSAGE: &str = "Ocurrió un error desconocido. Revise la consola.";

/// Errors returned by `RequestExecutor::execute` and `CallTracker::run`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No response was obtained: refused connection, DNS failure, TLS
    /// rejection, timeout.
    #[error("network error: {detail}")]
    Network { detail: String },

    /// The server answered with a non-2xx status.
    #[error("request failed with status code {status}")]
    Http {
        status: u16,
        status_text: Option<String>,
        body: String,
    },

    /// A 2xx response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("{0}")]
    Unknown(String),
}

/// The classification shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Unknown,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Http { .. } => ErrorKind::Http,
            ApiError::Deserialization(_) | ApiError::Serialization(_) | ApiError::Unknown(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// The classified message recorded into `CallState::error`.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Http {
                status,
                status_text,
                ..
            } => {
                let reason = match status_text.as_deref() {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => self.to_string(),
                };
                format!("Error de API: {status} - {reason}. Revise la consola.")
            }
            _ => UNKNOWN_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Invalid client configuration, detected once at construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base URL for {0} must not be empty")]
    EmptyBaseUrl(BaseUrlSelector),
}
