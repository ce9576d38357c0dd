use std::path::PathBuf;

use baw_core::types::DEFAULT_SERVICE_ENDPOINT;
use baw_core::{CallOptions, ClientDataRequest, HttpMethod, TaskCompletion};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;

use crate::error::HarnessError;

const DEFAULT_SERVICE_PAYLOAD: &str = r#"{"idSolicitud": "SOL-TEST-001"}"#;

/// Manual test harness for the workflow server's task and service APIs.
#[derive(Debug, Parser)]
#[command(name = "baw-harness", version)]
pub struct Cli {
    /// TOML file with base URLs and credentials.
    #[arg(long, short, global = true, env = "BAW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Complete a user task: POST /bpm/user-tasks/<id>/complete.
    CompleteTask {
        #[arg(long)]
        task_id: String,
        /// Completion body as JSON, sent as written; defaults to an approval
        /// with a test comment.
        #[arg(long)]
        payload: Option<String>,
    },
    /// Invoke an automation service endpoint.
    CallService {
        #[arg(long, default_value = "POST")]
        method: HttpMethod,
        /// Path below the service base URL, already percent-encoded.
        #[arg(long, default_value = DEFAULT_SERVICE_ENDPOINT)]
        endpoint: String,
        #[arg(long, default_value = DEFAULT_SERVICE_PAYLOAD)]
        payload: String,
    },
    /// Load client data for a request through the get-client-data service.
    LoadClientData {
        #[arg(long)]
        id_solicitud: String,
        #[arg(long)]
        sector_origen: String,
    },
}

impl Command {
    /// Validates user input and turns it into call options. Nothing is sent
    /// when this fails.
    pub fn call_options(&self) -> Result<CallOptions, HarnessError> {
        match self {
            Command::CompleteTask { task_id, payload } => {
                let task_id = task_id.trim();
                if task_id.is_empty() {
                    return Err(HarnessError::MissingTaskId);
                }
                match payload {
                    Some(raw) => Ok(CallOptions::complete_task_json(
                        task_id,
                        serde_json::from_str(raw)?,
                    )),
                    None => Ok(CallOptions::complete_task(task_id, &TaskCompletion::sample())?),
                }
            }
            Command::CallService {
                method,
                endpoint,
                payload,
            } => {
                let payload: Value = serde_json::from_str(payload)?;
                Ok(CallOptions::invoke_service(*method, endpoint.clone(), Some(payload)))
            }
            Command::LoadClientData {
                id_solicitud,
                sector_origen,
            } => {
                let request = ClientDataRequest {
                    id_solicitud: id_solicitud.clone(),
                    sector_origen: sector_origen.clone(),
                };
                Ok(CallOptions::invoke_service(HttpMethod::Post, DEFAULT_SERVICE_ENDPOINT, None)
                    .with_payload(&request)?)
            }
        }
    }
}
