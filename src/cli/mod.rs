//! CLI module for ledgerdesk
//!
//! Provides command-line interface for:
//! - serve: Connect storage and run the HTTP server
//! - check-config: Validate and print the effective configuration

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, connect_storage, run, run_command, serve};
pub use config::{Config, DEFAULT_JWT_SECRET};
pub use errors::{CliError, CliErrorCode, CliResult};
