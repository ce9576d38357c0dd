//! Static configuration shared by every call: base URLs and auth headers.
//!
//! Both tables are computed once from a `ClientConfig` and never mutated
//! afterwards, so one executor can serve concurrent calls without locking.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the anti-forgery header the workflow server expects.
pub const CSRF_HEADER: &str = "BPMCSRFToken";

/// Which server prefix a call targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseUrlSelector {
    /// User-task API (`/bpm/user-tasks/...`).
    #[default]
    Task,
    /// Automation services (`/automationservices/rest/<app>/...`).
    Service,
}

impl std::fmt::Display for BaseUrlSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseUrlSelector::Task => f.write_str("task"),
            BaseUrlSelector::Service => f.write_str("service"),
        }
    }
}

/// One absolute URL prefix per selector.
///
/// Prefixes are stored verbatim. A request URL is `prefix + endpoint` with
/// no slash normalisation, so the caller controls the exact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlTable {
    task: String,
    service: String,
}

impl BaseUrlTable {
    pub fn new(task: impl Into<String>, service: impl Into<String>) -> Result<Self, ConfigError> {
        let task = task.into();
        let service = service.into();
        if task.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl(BaseUrlSelector::Task));
        }
        if service.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl(BaseUrlSelector::Service));
        }
        Ok(Self { task, service })
    }

    pub fn resolve(&self, selector: BaseUrlSelector) -> &str {
        match selector {
            BaseUrlSelector::Task => &self.task,
            BaseUrlSelector::Service => &self.service,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// `base64(user:password)`, the token of a Basic `Authorization` header.
    pub fn basic_token(&self) -> String {
        BASE64_STANDARD.encode(format!("{}:{}", self.user, self.password))
    }
}

/// Static auth headers in declaration order. A `None` value marks a header
/// whose source is not configured; it is skipped when headers are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaderSet {
    entries: Vec<(String, Option<String>)>,
}

impl AuthHeaderSet {
    pub fn new(credentials: &Credentials, csrf_token: Option<&str>) -> Self {
        Self::default()
            .with_header(
                "Authorization",
                Some(format!("Basic {}", credentials.basic_token())),
            )
            .with_header("Content-Type", Some("application/json".to_string()))
            .with_header("Accept", Some("application/json".to_string()))
            .with_header(CSRF_HEADER, csrf_token.map(str::to_string))
    }

    /// Appends a header, or replaces the value of an existing one in place.
    pub fn with_header(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }
}

/// Everything the executor needs about the remote server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub task_base_url: String,
    pub service_base_url: String,
    pub user: String,
    pub password: String,
    /// Session token for the anti-forgery header. Obtained manually from a
    /// live session; there is no refresh flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl ClientConfig {
    pub fn base_urls(&self) -> Result<BaseUrlTable, ConfigError> {
        BaseUrlTable::new(&self.task_base_url, &self.service_base_url)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user, &self.password)
    }

    pub fn auth_headers(&self) -> AuthHeaderSet {
        AuthHeaderSet::new(&self.credentials(), self.csrf_token.as_deref())
    }
}
