//! Request Executor: composes, logs, dispatches and interprets one call.
//!
//! # Design
//! `build_request` and `parse_response` are pure, mirroring the two halves
//! of a round-trip; `execute` glues them around a single `Transport::send`.
//! The base URL table and auth headers are injected at construction and
//! never mutated, so a cloned executor can serve concurrent calls.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{AuthHeaderSet, BaseUrlTable, ClientConfig};
use crate::curl::{diagnostic_block, render_curl};
use crate::error::{ApiError, ConfigError};
use crate::headers::merge_headers;
use crate::http::{ApiResponse, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::CallOptions;

/// Target of the per-call curl block.
pub const DIAGNOSTIC_TARGET: &str = "baw_core::diagnostic";

#[derive(Clone)]
pub struct RequestExecutor {
    urls: BaseUrlTable,
    auth: AuthHeaderSet,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(
            config.base_urls()?,
            config.auth_headers(),
            transport,
        ))
    }

    pub fn from_parts(urls: BaseUrlTable, auth: AuthHeaderSet, transport: Arc<dyn Transport>) -> Self {
        Self {
            urls,
            auth,
            transport,
        }
    }

    pub fn base_urls(&self) -> &BaseUrlTable {
        &self.urls
    }

    /// Resolves the URL, merges headers and serializes the payload.
    pub fn build_request(&self, options: &CallOptions) -> HttpRequest {
        let url = format!("{}{}", self.urls.resolve(options.base_url), options.endpoint);
        HttpRequest {
            method: options.method,
            url,
            headers: merge_headers(&self.auth),
            body: options.effective_payload().map(Value::to_string),
        }
    }

    /// Turns a raw response into an `ApiResponse`, or an `ApiError::Http`
    /// for any non-2xx status.
    ///
    /// An empty body parses as JSON `null`. A body that is not JSON is
    /// offered to `T` as a JSON string before giving up.
    pub fn parse_response<T: DeserializeOwned>(
        &self,
        response: HttpResponse,
    ) -> Result<ApiResponse<T>, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                status_text: response.status_text,
                body: response.body,
            });
        }
        let data = parse_body(&response.body)?;
        Ok(ApiResponse {
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            data,
        })
    }

    /// Performs one call. The diagnostic block is logged before dispatch,
    /// whatever the outcome. No retries.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        options: &CallOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        let request = self.build_request(options);
        info!(target: DIAGNOSTIC_TARGET, "{}", diagnostic_block(&render_curl(&request)));

        let method = request.method;
        let url = request.url.clone();
        let result = match self.transport.send(request).await {
            Ok(response) => self.parse_response(response),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            warn!(%method, %url, error = %err, "{}", err.user_message());
        }
        result
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return serde_json::from_value(Value::Null)
            .map_err(|e| ApiError::Deserialization(e.to_string()));
    }
    match serde_json::from_str(body) {
        Ok(data) => Ok(data),
        Err(json_err) => serde_json::from_value(Value::String(body.to_string()))
            .map_err(|_| ApiError::Deserialization(json_err.to_string())),
    }
}
