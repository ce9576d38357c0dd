//! Request-execution core of the workflow server test harness.
//!
//! # Overview
//! Two REST integration points are exercised: completing a user task and
//! invoking an automation service. Every call goes through the same path:
//! `CallTracker::run` clears the call site's state and delegates to
//! `RequestExecutor::execute`, which resolves the base URL, merges the
//! static auth headers, logs a curl reconstruction of the request,
//! dispatches it through a `Transport` and classifies any failure.
//!
//! # Design
//! - Base URLs and auth headers are injected once via `ClientConfig` and
//!   are read-only afterwards.
//! - The network sits behind the `Transport` trait; `ReqwestTransport` is
//!   the production implementation.
//! - Failures are `ApiError` values, never sentinels. `ApiError::kind`
//!   gives the operator-facing category and `user_message` its text.
//! - Each call site owns its own `CallTracker`; only the latest started run
//!   may write the terminal state.

pub mod config;
pub mod curl;
pub mod error;
pub mod executor;
pub mod headers;
pub mod http;
pub mod state;
pub mod transport;
pub mod types;

pub use config::{AuthHeaderSet, BaseUrlSelector, BaseUrlTable, ClientConfig, Credentials};
pub use error::{ApiError, ConfigError, ErrorKind};
pub use executor::RequestExecutor;
pub use http::{ApiResponse, HttpMethod, HttpRequest, HttpResponse};
pub use state::{CallState, CallTracker};
pub use transport::{ReqwestTransport, Transport, TransportOptions};
pub use types::{CallOptions, ClientDataRequest, TaskCompletion, TaskOutput};
