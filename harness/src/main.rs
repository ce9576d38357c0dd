mod cli;
mod config;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use baw_core::{CallState, CallTracker, RequestExecutor, ReqwestTransport};
use clap::Parser;
use serde_json::Value;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::HarnessConfig;
use crate::error::HarnessError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

/// Failures of the call itself are reported through the printed state and
/// only affect the exit code.
async fn run(cli: Cli) -> Result<ExitCode, HarnessError> {
    let config = HarnessConfig::load(cli.config.as_deref())?
        .with_env_overrides(|key| std::env::var(key).ok());
    debug!(
        task = %config.client.task_base_url,
        service = %config.client.service_base_url,
        user = %config.client.user,
        "configuration loaded"
    );

    let options = cli.command.call_options()?;
    let transport = ReqwestTransport::new(config.transport_options())?;
    let executor = RequestExecutor::new(&config.client, Arc::new(transport))?;
    let tracker: CallTracker = CallTracker::new(executor);

    if let Err(err) = tracker.run(&options).await {
        debug!(kind = ?err.kind(), "call failed");
    }
    let state = tracker.snapshot();
    print_state(&state);
    Ok(exit_code(&state))
}

fn exit_code(state: &CallState<Value>) -> ExitCode {
    if state.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_state(state: &CallState<Value>) {
    if let Some(error) = &state.error {
        println!("Error: {error}");
    }
    if let Some(data) = &state.data {
        let rendered = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        println!("{rendered}");
    }
}
