//! CLI command implementations
//!
//! `serve` follows a fixed boot sequence: load config, initialise logging,
//! connect storage, open collections, then hand the router to tokio.

use std::io::Write;
use std::path::Path;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::http_server::{AppState, HttpServer};
use crate::storage::StorageClient;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Start the HTTP server
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.port = port;
        config.validate()?;
    }

    init_tracing(&config);
    if config.uses_default_secret() {
        warn!("jwt_secret is the built-in default; set JWT_SECRET in production");
    }

    let storage = connect_storage(&config)?;
    let state = AppState::new(&storage, config.jwt_config())
        .map_err(|e| CliError::boot_failed(format!("Failed to open collections: {}", e)))?;

    let server = HttpServer::new(config.http_config(), state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Validate configuration and print it (secret omitted)
pub fn check_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = Config::load(config_path)?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &config)?;
    writeln!(stdout)?;

    Ok(())
}

/// Install the global subscriber: `RUST_LOG` wins, then `log_level`
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let result = if config.log_format == "json" {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

/// Connect to the configured database.
///
/// On failure, either abort (`exit_on_connect_failure`) or continue on a
/// volatile in-memory store.
pub fn connect_storage(config: &Config) -> CliResult<StorageClient> {
    match StorageClient::connect(&config.database_url, &config.database_name) {
        Ok(client) => {
            if config.log_connection {
                info!(
                    backend = %client.backend(),
                    database = %client.database(),
                    "connected to database"
                );
            }
            Ok(client)
        }
        Err(e) => {
            if config.log_connection || config.exit_on_connect_failure {
                error!(
                    error = %e,
                    database = %config.database_name,
                    "database connection failed"
                );
            }

            if config.exit_on_connect_failure {
                return Err(CliError::database_connection(e.to_string()));
            }

            warn!("continuing with in-memory storage; data will not persist");
            Ok(StorageClient::in_memory(&config.database_name))
        }
    }
}
