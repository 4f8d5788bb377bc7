//! CLI-specific error types
//!
//! All CLI errors are fatal: `main` prints them and exits with status 1.

use std::fmt;
use std::io;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or environment error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Database connection failed with exit-on-failure set
    DatabaseConnection,
    /// Boot failed
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "LEDGERDESK_CLI_CONFIG_ERROR",
            Self::IoError => "LEDGERDESK_CLI_IO_ERROR",
            Self::DatabaseConnection => "LEDGERDESK_CLI_DATABASE_CONNECTION",
            Self::BootFailed => "LEDGERDESK_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Database connection failure
    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::DatabaseConnection, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::database_connection("Unsupported connection scheme 'mongodb'");
        assert_eq!(
            err.to_string(),
            "LEDGERDESK_CLI_DATABASE_CONNECTION: Unsupported connection scheme 'mongodb'"
        );
        assert_eq!(err.code(), &CliErrorCode::DatabaseConnection);
    }
}
