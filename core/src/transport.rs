//! The dispatch seam between the executor and the network.
//!
//! # Design
//! `Transport` takes a fully composed `HttpRequest` and returns whatever the
//! server answered, whatever the status. It only fails when no response was
//! obtained. Keeping status interpretation out of the transport lets tests
//! substitute an in-memory transport without re-implementing classification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Settings of the underlying HTTP client. Neither is applied unless set.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    /// Accept self-signed certificates, common on test workflow servers.
    pub accept_invalid_certs: bool,
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(options: TransportOptions) -> Result<Self, ApiError> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(options.accept_invalid_certs);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(classify_reqwest_error)?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let headers = header_map(&request.headers)?;
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        }
        .headers(headers);
        let builder = match (request.method, request.body) {
            (HttpMethod::Post, Some(body)) => builder.body(body),
            _ => builder,
        };

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(str::to_string),
            headers,
            body,
        })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, ApiError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::Unknown(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::Unknown(format!("invalid value for header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Errors raised before any response arrived are network failures; builder,
/// redirect and decode errors are not transport-layer and stay unclassified.
fn classify_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        ApiError::Network {
            detail: err.to_string(),
        }
    } else {
        ApiError::Unknown(err.to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transports for unit tests.

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;

    pub(crate) fn json_response(status: u16, status_text: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: Some(status_text.to_string()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    /// Answers requests from a queue and records everything it was sent.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn reply(self, reply: Result<HttpResponse, ApiError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub(crate) fn sent(&self) -> Vec<HttpRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.sent.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Unknown("no scripted reply".to_string())))
        }
    }

    /// Holds each request until the test releases the reply for its URL.
    #[derive(Default)]
    pub(crate) struct GatedTransport {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<HttpResponse, ApiError>>>>,
        waiting: Mutex<usize>,
    }

    impl GatedTransport {
        pub(crate) fn gate(&self, url: &str) -> oneshot::Sender<Result<HttpResponse, ApiError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(url.to_string(), rx);
            tx
        }

        pub(crate) fn waiting(&self) -> usize {
            *self.waiting.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let gate = self.gates.lock().unwrap().remove(&request.url);
            let Some(gate) = gate else {
                return Err(ApiError::Unknown(format!("no gate for {}", request.url)));
            };
            *self.waiting.lock().unwrap() += 1;
            gate.await
                .unwrap_or_else(|_| Err(ApiError::Unknown("gate dropped".to_string())))
        }
    }
}
