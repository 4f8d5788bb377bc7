//! Storage client
//!
//! The process entry point builds exactly one client from a connection
//! string and a database name, then hands it to every component that needs
//! persistence. Supported connection strings:
//!
//! - `memory://` - volatile, process-local
//! - `file://<dir>` - one `<dir>/<database>/<collection>.jsonl` per collection

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::info;

use super::collection::Collection;
use super::errors::{StorageError, StorageResult};

const LOG_EXTENSION: &str = "jsonl";

/// Where documents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Volatile, process-local
    Memory,
    /// JSON-lines files under the database directory
    File(PathBuf),
}

impl Backend {
    /// Parses a connection string into a backend.
    ///
    /// # Errors
    ///
    /// `InvalidUri` without a `scheme://` prefix, `UnsupportedScheme` for
    /// anything other than `memory` or `file`.
    pub fn parse(uri: &str) -> StorageResult<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| StorageError::InvalidUri(uri.to_string()))?;

        match scheme.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Backend::Memory),
            "file" if !rest.is_empty() => Ok(Backend::File(PathBuf::from(rest))),
            "file" => Err(StorageError::InvalidUri(uri.to_string())),
            other => Err(StorageError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory://"),
            Backend::File(root) => write!(f, "file://{}", root.display()),
        }
    }
}

/// Handle to one database
#[derive(Debug)]
pub struct StorageClient {
    database: String,
    backend: Backend,
    collections: RwLock<HashMap<String, Collection>>,
}

impl StorageClient {
    /// Connect to the database named `database` at `uri`.
    ///
    /// For file backends this creates the database directory if needed and
    /// replays every existing collection log.
    pub fn connect(uri: &str, database: &str) -> StorageResult<Self> {
        let backend = Backend::parse(uri)?;
        let mut collections = HashMap::new();

        if let Backend::File(root) = &backend {
            let dir = root.join(database);
            fs::create_dir_all(&dir).map_err(|e| {
                StorageError::io_error(format!("Failed to create {}", dir.display()), e)
            })?;

            let entries = fs::read_dir(&dir).map_err(|e| {
                StorageError::io_error(format!("Failed to read {}", dir.display()), e)
            })?;

            for entry in entries {
                let path = entry
                    .map_err(|e| {
                        StorageError::io_error(format!("Failed to read {}", dir.display()), e)
                    })?
                    .path();

                if path.extension().map_or(true, |ext| ext != LOG_EXTENSION) {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                else {
                    continue;
                };

                let collection = Collection::replay(name.clone(), path)?;
                info!(
                    collection = %name,
                    documents = collection.count()?,
                    "collection replayed"
                );
                collections.insert(name, collection);
            }
        }

        Ok(Self {
            database: database.to_string(),
            backend,
            collections: RwLock::new(collections),
        })
    }

    /// Volatile client, used as a startup fallback and in tests
    pub fn in_memory(database: &str) -> Self {
        Self {
            database: database.to_string(),
            backend: Backend::Memory,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Database name
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Backend in use
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Returns the named collection, creating it on first use, with a
    /// unique index on each of `unique_fields`.
    pub fn collection(&self, name: &str, unique_fields: &[&str]) -> StorageResult<Collection> {
        let collection = {
            let mut collections = self
                .collections
                .write()
                .map_err(|_| StorageError::LockPoisoned)?;

            collections
                .entry(name.to_string())
                .or_insert_with(|| Collection::new(name, self.log_path(name)))
                .clone()
        };

        for field in unique_fields {
            collection.ensure_unique(field)?;
        }

        Ok(collection)
    }

    fn log_path(&self, collection: &str) -> Option<PathBuf> {
        match &self.backend {
            Backend::Memory => None,
            Backend::File(root) => Some(
                root.join(&self.database)
                    .join(format!("{}.{}", collection, LOG_EXTENSION)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_backends() {
        assert_eq!(Backend::parse("memory://").unwrap(), Backend::Memory);
        assert_eq!(
            Backend::parse("file:///var/lib/ledgerdesk").unwrap(),
            Backend::File(PathBuf::from("/var/lib/ledgerdesk"))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_scheme() {
        assert!(matches!(
            Backend::parse("mongodb://localhost:27017"),
            Err(StorageError::UnsupportedScheme(s)) if s == "mongodb"
        ));
        assert!(matches!(
            Backend::parse("localhost"),
            Err(StorageError::InvalidUri(_))
        ));
        assert!(matches!(
            Backend::parse("file://"),
            Err(StorageError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_collection_is_shared() {
        let client = StorageClient::in_memory("test");
        let a = client.collection("users", &["email"]).unwrap();
        let b = client.collection("users", &[]).unwrap();

        a.insert(json!({ "email": "a@b.co" })).unwrap();
        assert_eq!(b.count().unwrap(), 1);
        // unique index declared through `a` applies to `b`
        assert!(b.insert(json!({ "email": "a@b.co" })).is_err());
    }

    #[test]
    fn test_file_backend_survives_reconnect() {
        let tmp = TempDir::new().unwrap();
        let uri = format!("file://{}", tmp.path().display());

        {
            let client = StorageClient::connect(&uri, "shop").unwrap();
            let receipts = client.collection("receipts", &["receipt_number"]).unwrap();
            receipts.insert(json!({ "receipt_number": "10", "amount": 1 })).unwrap();
            receipts.insert(json!({ "receipt_number": "11", "amount": 2 })).unwrap();
        }

        assert!(tmp.path().join("shop").join("receipts.jsonl").exists());

        let client = StorageClient::connect(&uri, "shop").unwrap();
        let receipts = client.collection("receipts", &["receipt_number"]).unwrap();
        let all = receipts.find_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["receipt_number"], "10");
        assert_eq!(all[1]["receipt_number"], "11");

        // unique index re-declared over replayed documents
        assert!(receipts
            .insert(json!({ "receipt_number": "10", "amount": 3 }))
            .is_err());
    }

    #[test]
    fn test_databases_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let uri = format!("file://{}", tmp.path().display());

        let one = StorageClient::connect(&uri, "one").unwrap();
        one.collection("users", &[])
            .unwrap()
            .insert(json!({ "email": "a@b.co" }))
            .unwrap();

        let two = StorageClient::connect(&uri, "two").unwrap();
        assert_eq!(two.collection("users", &[]).unwrap().count().unwrap(), 0);
    }
}
