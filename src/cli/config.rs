//! Service configuration
//!
//! Loaded from an optional JSON file, then overridden from the environment,
//! then validated. Every field has a default, so an empty file (or none at
//! all) is a complete configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::auth::{JwtConfig, MAX_TOKEN_TTL_MINUTES};
use crate::http_server::HttpServerConfig;

/// Fallback signing secret; startup warns when it is still in use
pub const DEFAULT_JWT_SECRET: &str = "CHANGE_THIS_SECRET_IN_PRODUCTION";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins (empty allows any)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Storage connection string (`memory://` or `file://<dir>`)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Database name
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Abort startup when the database cannot be reached
    #[serde(default = "default_true")]
    pub exit_on_connect_failure: bool,

    /// Log connection status
    #[serde(default = "default_true")]
    pub log_connection: bool,

    /// HS256 signing secret (never printed)
    #[serde(default = "default_jwt_secret", skip_serializing)]
    pub jwt_secret: String,

    /// Access token lifetime in minutes
    #[serde(default = "default_jwt_ttl_minutes")]
    pub jwt_ttl_minutes: i64,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_database_url() -> String {
    "memory://".to_string()
}
fn default_database_name() -> String {
    "ledgerdesk".to_string()
}
fn default_true() -> bool {
    true
}
fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}
fn default_jwt_ttl_minutes() -> i64 {
    15
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            database_url: default_database_url(),
            database_name: default_database_name(),
            exit_on_connect_failure: true,
            log_connection: true,
            jwt_secret: default_jwt_secret(),
            jwt_ttl_minutes: default_jwt_ttl_minutes(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup
    pub fn load_with<F>(path: Option<&Path>, env: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env(env)?;
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Environment overrides: DB_CONNECTION, DB_NAME, JWT_SECRET, PORT, LOG_FORMAT
    fn apply_env<F>(&mut self, env: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env("DB_CONNECTION") {
            self.database_url = url;
        }
        if let Some(name) = env("DB_NAME") {
            self.database_name = name;
        }
        if let Some(secret) = env("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(port) = env("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| CliError::config_error(format!("Invalid PORT: '{}'", port)))?;
        }
        if let Some(format) = env("LOG_FORMAT") {
            self.log_format = format.to_ascii_lowercase();
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.port == 0 {
            return Err(CliError::config_error("port must be > 0"));
        }

        if self.jwt_ttl_minutes <= 0 || self.jwt_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(CliError::config_error(format!(
                "jwt_ttl_minutes must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }

        if self.database_name.trim().is_empty() {
            return Err(CliError::config_error("database_name must not be empty"));
        }

        if self.jwt_secret.is_empty() {
            return Err(CliError::config_error("jwt_secret must not be empty"));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(CliError::config_error(format!(
                "Invalid log_format: '{}'. Must be 'text' or 'json'.",
                self.log_format
            )));
        }

        Ok(())
    }

    /// HTTP listener settings
    pub fn http_config(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
        }
    }

    /// Token signing settings
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone(), self.jwt_ttl_minutes)
    }

    /// Whether the built-in signing secret is still in use
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("ledgerdesk.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_with(None, no_env).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "memory://");
        assert_eq!(config.database_name, "ledgerdesk");
        assert!(config.exit_on_connect_failure);
        assert!(config.log_connection);
        assert_eq!(config.jwt_ttl_minutes, 15);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{}");
        assert_eq!(
            Config::load_with(Some(&path), no_env).unwrap(),
            Config::default()
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{ "port": 3000, "database_name": "from_file", "log_format": "text" }"#,
        );

        let env = env_from(&[
            ("PORT", "4000"),
            ("DB_NAME", "from_env"),
            ("DB_CONNECTION", "file:///tmp/ledgerdesk"),
            ("JWT_SECRET", "s3cret"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = Config::load_with(Some(&path), env).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.database_name, "from_env");
        assert_eq!(config.database_url, "file:///tmp/ledgerdesk");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.log_format, "json");
        assert!(!config.uses_default_secret());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();

        for content in [
            r#"{ "port": 0 }"#,
            r#"{ "jwt_ttl_minutes": 0 }"#,
            r#"{ "jwt_ttl_minutes": 525601 }"#,
            r#"{ "jwt_ttl_minutes": 9223372036854775807 }"#,
            r#"{ "database_name": "  " }"#,
            r#"{ "log_format": "xml" }"#,
            r#"{ "port": "eighty" }"#,
        ] {
            let path = write_config(&dir, content);
            assert!(
                Config::load_with(Some(&path), no_env).is_err(),
                "accepted {}",
                content
            );
        }

        assert!(Config::load_with(None, env_from(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_token_ttl_bound() {
        let longest = Config {
            jwt_ttl_minutes: MAX_TOKEN_TTL_MINUTES,
            ..Config::default()
        };
        assert!(longest.validate().is_ok());
        assert_eq!(
            longest.jwt_config().access_token_ttl.num_minutes(),
            MAX_TOKEN_TTL_MINUTES
        );

        let err = Config {
            jwt_ttl_minutes: i64::MAX,
            ..Config::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.code(), &super::super::errors::CliErrorCode::ConfigError);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load_with(Some(Path::new("/nonexistent/ledgerdesk.json")), no_env)
            .unwrap_err();
        assert_eq!(err.code(), &super::super::errors::CliErrorCode::ConfigError);
    }

    #[test]
    fn test_secret_never_serialized() {
        let config = Config {
            jwt_secret: "top-secret".to_string(),
            ..Config::default()
        };
        let printed = serde_json::to_string(&config).unwrap();
        assert!(!printed.contains("top-secret"));
        assert!(!printed.contains("jwt_secret"));
    }

    #[test]
    fn test_derived_configs() {
        let config = Config {
            port: 9000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Config::default()
        };
        assert_eq!(config.http_config().socket_addr(), "0.0.0.0:9000");
        assert_eq!(config.http_config().cors_origins.len(), 1);
        assert_eq!(config.jwt_config().access_token_ttl.num_minutes(), 15);
    }
}
