//! Handles one request read from stdin and prints the response to stdout.
//!
//! ```text
//! echo '{"method":"POST","path":"/api/tasks","body":{"title":"Buy milk"}}' | task-invoke
//! ```

use std::process::ExitCode;

use tasks_backend::invoke::{invoke, Invocation};
use tasks_backend::{build_router, store, telemetry, AppConfig, AppState};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut input = String::new();
    if let Err(err) = tokio::io::stdin().read_to_string(&mut input).await {
        tracing::error!(error = %err, "failed to read invocation from stdin");
        return ExitCode::FAILURE;
    }

    let invocation: Invocation = match serde_json::from_str(&input) {
        Ok(invocation) => invocation,
        Err(err) => {
            tracing::error!(error = %err, "invocation is not valid JSON");
            return ExitCode::FAILURE;
        }
    };

    let router = build_router(AppState::new(store::from_config(&config)), None);
    match invoke(router, invocation).await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to encode response");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "invocation failed");
            ExitCode::FAILURE
        }
    }
}
