//! Harness configuration: a TOML file plus environment overrides.

use std::path::Path;
use std::time::Duration;

use baw_core::{ClientConfig, TransportOptions};
use serde::Deserialize;

use crate::error::HarnessError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarnessConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig {
                task_base_url: "https://localhost:9444".to_string(),
                service_base_url: "https://localhost:9444/automationservices/rest/PR".to_string(),
                user: String::new(),
                password: String::new(),
                csrf_token: None,
            },
            timeout_secs: None,
            accept_invalid_certs: false,
        }
    }
}

impl HarnessConfig {
    /// Reads `path` when given, otherwise starts from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, HarnessError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| HarnessError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| HarnessError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `BAW_*` overrides; `lookup` is `std::env::var` outside tests.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("BAW_TASK_BASE_URL") {
            self.client.task_base_url = v;
        }
        if let Some(v) = lookup("BAW_SERVICE_BASE_URL") {
            self.client.service_base_url = v;
        }
        if let Some(v) = lookup("BAW_USER") {
            self.client.user = v;
        }
        if let Some(v) = lookup("BAW_PASSWORD") {
            self.client.password = v;
        }
        if let Some(v) = lookup("BAW_CSRF_TOKEN") {
            self.client.csrf_token = Some(v).filter(|t| !t.is_empty());
        }
        self
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.timeout_secs.map(Duration::from_secs),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}
