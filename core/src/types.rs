//! Call options and the payload DTOs of the two workflow server endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::BaseUrlSelector;
use crate::error::ApiError;
use crate::http::HttpMethod;

/// Endpoint of the sample automation service, relative to the service base.
pub const DEFAULT_SERVICE_ENDPOINT: &str = "/REST%20Service/get-client-data";

/// Parameters of one call.
///
/// `endpoint` is appended to the selected base URL verbatim and must already
/// be percent-encoded. `payload` is only sent for POST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(default)]
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default)]
    pub base_url: BaseUrlSelector,
}

impl CallOptions {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn post(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            endpoint: endpoint.into(),
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: BaseUrlSelector) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_payload<P: Serialize>(mut self, payload: &P) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.payload = Some(value);
        Ok(self)
    }

    /// `POST /bpm/user-tasks/{task_id}/complete` against the task server.
    pub fn complete_task(task_id: &str, completion: &TaskCompletion) -> Result<Self, ApiError> {
        Self::complete_task_json(task_id, Value::Null).with_payload(completion)
    }

    /// Like `complete_task`, but sends `payload` exactly as given.
    pub fn complete_task_json(task_id: &str, payload: Value) -> Self {
        Self::post(format!("/bpm/user-tasks/{task_id}/complete"), payload)
    }

    /// A call against the automation service server.
    pub fn invoke_service(
        method: HttpMethod,
        endpoint: impl Into<String>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            payload,
            base_url: BaseUrlSelector::Service,
        }
    }

    /// The payload that goes on the wire: POST only, and JSON `null` counts
    /// as no payload.
    pub fn effective_payload(&self) -> Option<&Value> {
        match (self.method, &self.payload) {
            (HttpMethod::Post, Some(value)) if !value.is_null() => Some(value),
            _ => None,
        }
    }
}

/// One named output variable of a user task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub name: String,
    pub data: Value,
}

/// Body of a task completion request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub output: Vec<TaskOutput>,
}

impl TaskCompletion {
    pub fn with_output(mut self, name: impl Into<String>, data: impl Into<Value>) -> Self {
        self.output.push(TaskOutput {
            name: name.into(),
            data: data.into(),
        });
        self
    }

    /// Approves the task with a marker comment; handy for manual runs.
    pub fn sample() -> Self {
        Self::default()
            .with_output("tareaAprobada", true)
            .with_output("comentario", "Prueba manual desde Test Harness")
    }
}

/// Input of the `get-client-data` automation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDataRequest {
    pub id_solicitud: String,
    pub sector_origen: String,
}
