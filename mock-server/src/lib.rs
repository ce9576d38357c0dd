use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Process app acronym the automation service routes answer for.
pub const PROCESS_APP: &str = "PR";

pub const CSRF_HEADER: &str = "BPMCSRFToken";

/// Credentials and token the mock accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub user: String,
    pub password: String,
    pub csrf_token: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            user: "tester".to_string(),
            password: "secret".to_string(),
            csrf_token: "csrf-123".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskOutput {
    pub name: String,
    pub data: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub output: Vec<TaskOutput>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReceipt {
    pub status: String,
    pub task_id: String,
    pub output_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status: String,
    pub error_message: String,
}

pub type Tasks = Arc<RwLock<HashMap<String, TaskCompletion>>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    tasks: Tasks,
}

type Rejection = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, message: impl Into<String>) -> Rejection {
    let message = message.into();
    warn!(status = status.as_u16(), %message, "rejecting request");
    (
        status,
        Json(ErrorBody {
            status: "error".to_string(),
            error_message: message,
        }),
    )
}

pub fn app(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        tasks: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route("/bpm/user-tasks/{task_id}/complete", post(complete_task))
        .route(
            "/automationservices/rest/{app}/{service}/{operation}",
            get(invoke_service_get).post(invoke_service_post),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

fn authorize(headers: &HeaderMap, config: &MockConfig, require_csrf: bool) -> Result<(), Rejection> {
    let expected = format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{}:{}", config.user, config.password))
    );
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if authorization != Some(expected.as_str()) {
        return Err(reject(StatusCode::UNAUTHORIZED, "invalid or missing credentials"));
    }
    if require_csrf {
        let token = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        if token != Some(config.csrf_token.as_str()) {
            return Err(reject(StatusCode::FORBIDDEN, "invalid or missing BPMCSRFToken"));
        }
    }
    Ok(())
}

/// Empty bodies parse as JSON `null`. Syntax errors are 400, shape errors 422.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Rejection> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| {
        let status = if e.is_data() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::BAD_REQUEST
        };
        reject(status, e.to_string())
    })
}

async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CompletionReceipt>, Rejection> {
    authorize(&headers, &state.config, true)?;
    let completion: TaskCompletion = parse_body(&body)?;

    let mut tasks = state.tasks.write().await;
    if tasks.contains_key(&task_id) {
        return Err(reject(
            StatusCode::CONFLICT,
            format!("task {task_id} is already completed"),
        ));
    }
    let output_count = completion.output.len();
    tasks.insert(task_id.clone(), completion);
    info!(%task_id, output_count, "task completed");

    Ok(Json(CompletionReceipt {
        status: "ok".to_string(),
        task_id,
        output_count,
    }))
}

async fn invoke_service_get(
    State(state): State<AppState>,
    Path((app, service, operation)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, Rejection> {
    authorize(&headers, &state.config, false)?;
    invoke(&app, &service, &operation, Value::Null)
}

async fn invoke_service_post(
    State(state): State<AppState>,
    Path((app, service, operation)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    authorize(&headers, &state.config, true)?;
    let input: Value = parse_body(&body)?;
    invoke(&app, &service, &operation, input)
}

fn invoke(app: &str, service: &str, operation: &str, input: Value) -> Result<Json<Value>, Rejection> {
    if app != PROCESS_APP {
        return Err(reject(
            StatusCode::NOT_FOUND,
            format!("process app {app} not found"),
        ));
    }
    let invocation_id = Uuid::new_v4();
    info!(%invocation_id, service, operation, "service invoked");

    let body = match operation {
        "get-client-data" => json!({
            "invocationId": invocation_id,
            "service": service,
            "operation": operation,
            "data": {
                "idSolicitud": input.get("idSolicitud").cloned().unwrap_or(Value::Null),
                "sectorOrigen": input.get("sectorOrigen").cloned().unwrap_or(Value::Null),
                "cliente": {
                    "nombre": "Cliente de prueba",
                    "segmento": "PYME",
                },
            },
        }),
        _ => json!({
            "invocationId": invocation_id,
            "service": service,
            "operation": operation,
            "input": input,
        }),
    };
    Ok(Json(body))
}
