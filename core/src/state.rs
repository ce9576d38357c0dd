//! Call-State Tracker: observable data / in-flight / error for one call site.
//!
//! # Design
//! Each `CallTracker` owns one state cell; clones share it, separate
//! trackers never do. Every `run` takes a sequence number when it starts and
//! only the latest started run may write a terminal result. An older run
//! that finishes late still returns its outcome to its own caller but leaves
//! the state alone, so the observable fields always describe the most
//! recent attempt.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::error::ApiError;
use crate::executor::RequestExecutor;
use crate::http::ApiResponse;
use crate::types::CallOptions;

/// Snapshot of a call site.
///
/// After a completed call exactly one of `data` / `error` is set; while a
/// call is in flight both are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallState<T> {
    pub data: Option<T>,
    pub in_flight: bool,
    pub error: Option<String>,
}

impl<T> Default for CallState<T> {
    fn default() -> Self {
        Self {
            data: None,
            in_flight: false,
            error: None,
        }
    }
}

struct Cell<T> {
    state: CallState<T>,
    latest: u64,
}

struct Shared<T> {
    cell: Mutex<Cell<T>>,
    updates: watch::Sender<CallState<T>>,
}

pub struct CallTracker<T = Value> {
    executor: RequestExecutor,
    shared: Arc<Shared<T>>,
}

impl<T> Clone for CallTracker<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> CallTracker<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(executor: RequestExecutor) -> Self {
        let (updates, _) = watch::channel(CallState::default());
        Self {
            executor,
            shared: Arc::new(Shared {
                cell: Mutex::new(Cell {
                    state: CallState::default(),
                    latest: 0,
                }),
                updates,
            }),
        }
    }

    /// Runs one call and records its outcome.
    ///
    /// Clears `data` and `error` and raises `in_flight` before dispatch. On
    /// failure the classified message is stored and the original error is
    /// returned unchanged.
    pub async fn run(&self, options: &CallOptions) -> Result<ApiResponse<T>, ApiError> {
        let seq = self.update(|cell| {
            cell.latest += 1;
            cell.state = CallState {
                data: None,
                in_flight: true,
                error: None,
            };
            cell.latest
        });

        let result = self.executor.execute::<T>(options).await;

        let applied = self.update(|cell| {
            if cell.latest != seq {
                return false;
            }
            cell.state = match &result {
                Ok(response) => CallState {
                    data: Some(response.data.clone()),
                    in_flight: false,
                    error: None,
                },
                Err(err) => CallState {
                    data: None,
                    in_flight: false,
                    error: Some(err.user_message()),
                },
            };
            true
        });
        if !applied {
            debug!(seq, endpoint = %options.endpoint, "discarding result of superseded call");
        }
        result
    }

    pub fn snapshot(&self) -> CallState<T> {
        self.lock().state.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.lock().state.data.clone()
    }

    pub fn in_flight(&self) -> bool {
        self.lock().state.in_flight
    }

    pub fn error(&self) -> Option<String> {
        self.lock().state.error.clone()
    }

    /// Receives every state transition of this call site.
    pub fn subscribe(&self) -> watch::Receiver<CallState<T>> {
        self.shared.updates.subscribe()
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    fn lock(&self) -> MutexGuard<'_, Cell<T>> {
        // the cell is only mutated by whole-value assignment, so a poisoned
        // lock still holds a consistent state
        self.shared
            .cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies `f` and publishes the resulting state while still holding
    /// the lock, so observers see transitions in order.
    fn update<R>(&self, f: impl FnOnce(&mut Cell<T>) -> R) -> R {
        let mut cell = self.lock();
        let out = f(&mut cell);
        self.shared.updates.send_replace(cell.state.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::{AuthHeaderSet, BaseUrlSelector, BaseUrlTable, Credentials};
    use crate::error::{ErrorKind, NETWORK_ERROR_MESSAGE};
    use crate::transport::testing::{json_response, GatedTransport, ScriptedTransport};
    use crate::transport::Transport;
    use crate::types::TaskCompletion;

    const TASK_BASE: &str = "https://baw.example.com:9444";
    const SERVICE_BASE: &str = "https://baw.example.com:9444/automationservices/rest/PR";

    fn tracker(transport: Arc<dyn Transport>) -> CallTracker {
        CallTracker::new(RequestExecutor::from_parts(
            BaseUrlTable::new(TASK_BASE, SERVICE_BASE).unwrap(),
            AuthHeaderSet::new(&Credentials::new("tester", "secret"), Some("csrf-123")),
            transport,
        ))
    }

    fn complete_task() -> CallOptions {
        let completion = TaskCompletion::default().with_output("tareaAprobada", true);
        CallOptions::complete_task("12345", &completion).unwrap()
    }

    #[test]
    fn starts_idle() {
        let t = tracker(Arc::new(ScriptedTransport::default()));
        assert_eq!(t.snapshot(), CallState::default());
        assert!(!t.in_flight());
    }

    #[tokio::test]
    async fn completed_task_stores_response_body() {
        let t = tracker(Arc::new(
            ScriptedTransport::default().reply(Ok(json_response(200, "OK", r#"{"status":"ok"}"#))),
        ));
        let resp = t.run(&complete_task()).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(
            t.snapshot(),
            CallState {
                data: Some(json!({"status": "ok"})),
                in_flight: false,
                error: None,
            }
        );
    }

    #[tokio::test]
    async fn forbidden_records_http_message_and_reraises() {
        let t = tracker(Arc::new(
            ScriptedTransport::default().reply(Ok(json_response(403, "Forbidden", ""))),
        ));
        let err = t.run(&complete_task()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status(), Some(403));

        let state = t.snapshot();
        assert!(state.data.is_none());
        assert!(!state.in_flight);
        let message = state.error.unwrap();
        assert!(message.starts_with("Error de API: 403 - Forbidden"), "{message}");
    }

    #[tokio::test]
    async fn refused_connection_records_network_message() {
        let t = tracker(Arc::new(ScriptedTransport::default().reply(Err(
            ApiError::Network {
                detail: "Connection refused".to_string(),
            },
        ))));
        let options = CallOptions::get("/x").with_base_url(BaseUrlSelector::Service);
        let err = t.run(&options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(t.error().as_deref(), Some(NETWORK_ERROR_MESSAGE));
        assert!(t.data().is_none());
    }

    #[tokio::test]
    async fn new_call_clears_previous_outcome() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(Ok(json_response(500, "Internal Server Error", "")))
                .reply(Ok(json_response(200, "OK", r#"{"n":2}"#))),
        );
        let t = tracker(transport);
        let mut rx = t.subscribe();

        assert!(t.run(&CallOptions::get("/x")).await.is_err());
        assert!(t.error().is_some());
        rx.borrow_and_update();

        assert!(t.run(&CallOptions::get("/x")).await.is_ok());
        assert_eq!(t.data(), Some(json!({"n": 2})));
        assert!(t.error().is_none());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().data, Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn repeated_runs_yield_identical_data() {
        let body = r#"{"status":"ok","items":[1,2,3]}"#;
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(Ok(json_response(200, "OK", body)))
                .reply(Ok(json_response(200, "OK", body))),
        );
        let t = tracker(transport.clone());
        let options = complete_task();

        t.run(&options).await.unwrap();
        let first = t.data();
        t.run(&options).await.unwrap();
        assert_eq!(t.data(), first);

        let sent = transport.sent();
        assert_eq!(sent[0].body, sent[1].body);
    }

    #[tokio::test]
    async fn in_flight_hides_data_and_error() {
        let transport = Arc::new(GatedTransport::default());
        let gate = transport.gate(&format!("{TASK_BASE}/slow"));
        let t = tracker(transport.clone());

        let handle = tokio::spawn({
            let t = t.clone();
            async move { t.run(&CallOptions::get("/slow")).await }
        });
        while transport.waiting() < 1 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            t.snapshot(),
            CallState {
                data: None,
                in_flight: true,
                error: None,
            }
        );

        gate.send(Ok(json_response(200, "OK", "[]"))).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(t.data(), Some(json!([])));
        assert!(!t.in_flight());
    }

    #[tokio::test]
    async fn superseded_call_does_not_overwrite_latest() {
        let transport = Arc::new(GatedTransport::default());
        let first_gate = transport.gate(&format!("{TASK_BASE}/first"));
        let second_gate = transport.gate(&format!("{TASK_BASE}/second"));
        let t = tracker(transport.clone());

        let first = tokio::spawn({
            let t = t.clone();
            async move { t.run(&CallOptions::get("/first")).await }
        });
        while transport.waiting() < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let t = t.clone();
            async move { t.run(&CallOptions::get("/second")).await }
        });
        while transport.waiting() < 2 {
            tokio::task::yield_now().await;
        }

        second_gate
            .send(Ok(json_response(200, "OK", r#"{"call":"second"}"#)))
            .unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(t.data(), Some(json!({"call": "second"})));

        // the older call still reports its own failure to its caller
        first_gate
            .send(Ok(json_response(502, "Bad Gateway", "")))
            .unwrap();
        let err = first.await.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(502));

        assert_eq!(t.data(), Some(json!({"call": "second"})));
        assert!(t.error().is_none());
        assert!(!t.in_flight());
    }

    #[tokio::test]
    async fn older_call_finishing_first_keeps_in_flight() {
        let transport = Arc::new(GatedTransport::default());
        let first_gate = transport.gate(&format!("{TASK_BASE}/first"));
        let second_gate = transport.gate(&format!("{TASK_BASE}/second"));
        let t = tracker(transport.clone());

        let first = tokio::spawn({
            let t = t.clone();
            async move { t.run(&CallOptions::get("/first")).await }
        });
        while transport.waiting() < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let t = t.clone();
            async move { t.run(&CallOptions::get("/second")).await }
        });
        while transport.waiting() < 2 {
            tokio::task::yield_now().await;
        }

        first_gate.send(Ok(json_response(200, "OK", "1"))).unwrap();
        first.await.unwrap().unwrap();
        assert!(t.in_flight());
        assert!(t.data().is_none());

        second_gate.send(Ok(json_response(200, "OK", "2"))).unwrap();
        tokio::time::timeout(Duration::from_secs(5), second)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(t.data(), Some(json!(2)));
    }

    #[tokio::test]
    async fn separate_trackers_do_not_share_state() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(Ok(json_response(200, "OK", r#"{"task":true}"#)))
                .reply(Ok(json_response(404, "Not Found", ""))),
        );
        let task = tracker(transport.clone());
        let service = tracker(transport);

        task.run(&complete_task()).await.unwrap();
        let _ = service
            .run(&CallOptions::get("/missing").with_base_url(BaseUrlSelector::Service))
            .await;

        assert_eq!(task.data(), Some(json!({"task": true})));
        assert!(task.error().is_none());
        assert!(service.data().is_none());
        assert!(service.error().unwrap().contains("404"));
    }
}
