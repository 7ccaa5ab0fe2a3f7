use std::path::PathBuf;
use std::process::ExitCode;

use api_gateway::config::{load_config, process_env};
use api_gateway::lifecycle;
use api_gateway::observability::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = process_env("GATEWAY_CONFIG").map(PathBuf::from);

    let config = match load_config(config_path.as_deref(), process_env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("api-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("api-gateway: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        dev_mode = config.dev_mode,
        config_file = ?config_path,
        "api-gateway starting"
    );

    match lifecycle::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
