//! CLI argument definitions using clap
//!
//! Commands:
//! - ledgerdesk serve [--config <path>] [--port <n>]
//! - ledgerdesk check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ledgerdesk - user registration, login and receipts over HTTP
#[derive(Parser, Debug)]
#[command(name = "ledgerdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to storage and start the HTTP server
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on, overriding config and environment
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load and validate configuration, then print it
    CheckConfig {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["ledgerdesk", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert!(config.is_none());
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_config() {
        let cli =
            Cli::try_parse_from(["ledgerdesk", "check-config", "--config", "ledgerdesk.json"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::CheckConfig { config: Some(ref path) } if path == &PathBuf::from("ledgerdesk.json")
        ));
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["ledgerdesk"]).is_err());
    }
}
