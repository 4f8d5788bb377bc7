//! Named document collections with unique indexes
//!
//! Documents are kept in insertion order. A unique check and the insert it
//! guards run under one write lock, so two concurrent inserts of the same
//! unique value cannot both succeed. With a log file attached, a document
//! is appended and synced before it becomes visible in memory.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::errors::{StorageError, StorageResult};

#[derive(Debug)]
struct CollectionState {
    name: String,
    unique_fields: Vec<String>,
    documents: Vec<Map<String, Value>>,
    log_path: Option<PathBuf>,
}

/// Shared handle to one collection
#[derive(Debug, Clone)]
pub struct Collection {
    state: Arc<RwLock<CollectionState>>,
}

impl Collection {
    /// Create an empty collection, optionally backed by a JSON-lines log
    pub(crate) fn new(name: impl Into<String>, log_path: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CollectionState {
                name: name.into(),
                unique_fields: Vec::new(),
                documents: Vec::new(),
                log_path,
            })),
        }
    }

    /// Open a file-backed collection, replaying every line of its log
    pub(crate) fn replay(name: impl Into<String>, log_path: PathBuf) -> StorageResult<Self> {
        let documents = read_log(&log_path)?;
        let collection = Self::new(name, Some(log_path));
        collection.write_state()?.documents = documents;
        Ok(collection)
    }

    /// Declare a unique index on `field`.
    ///
    /// Existing documents must already satisfy it.
    pub fn ensure_unique(&self, field: &str) -> StorageResult<()> {
        let mut state = self.write_state()?;
        if state.unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        let mut seen: Vec<&Value> = Vec::with_capacity(state.documents.len());
        for document in &state.documents {
            if let Some(value) = document.get(field) {
                if seen.contains(&value) {
                    return Err(duplicate(&state.name, field, value));
                }
                seen.push(value);
            }
        }

        state.unique_fields.push(field.to_string());
        Ok(())
    }

    /// Insert a document.
    ///
    /// # Errors
    ///
    /// - `DuplicateKey` if a unique field value is already stored
    /// - `NotAnObject` if `document` is not a JSON object
    /// - `Io` if the log append fails (the document is then not stored)
    pub fn insert(&self, document: Value) -> StorageResult<()> {
        let Value::Object(document) = document else {
            return Err(StorageError::NotAnObject);
        };

        let mut state = self.write_state()?;

        for field in &state.unique_fields {
            if let Some(value) = document.get(field) {
                let taken = state
                    .documents
                    .iter()
                    .any(|existing| existing.get(field) == Some(value));
                if taken {
                    return Err(duplicate(&state.name, field, value));
                }
            }
        }

        if let Some(path) = &state.log_path {
            append_line(path, &document)?;
        }

        debug!(collection = %state.name, "document inserted");
        state.documents.push(document);
        Ok(())
    }

    /// First document whose `field` equals `value`
    pub fn find_one(&self, field: &str, value: &Value) -> StorageResult<Option<Value>> {
        let state = self.read_state()?;
        Ok(state
            .documents
            .iter()
            .find(|doc| doc.get(field) == Some(value))
            .cloned()
            .map(Value::Object))
    }

    /// Every document in insertion order
    pub fn find_all(&self) -> StorageResult<Vec<Value>> {
        let state = self.read_state()?;
        Ok(state.documents.iter().cloned().map(Value::Object).collect())
    }

    /// Number of stored documents
    pub fn count(&self) -> StorageResult<usize> {
        Ok(self.read_state()?.documents.len())
    }

    fn read_state(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, CollectionState>> {
        self.state.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write_state(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, CollectionState>> {
        self.state.write().map_err(|_| StorageError::LockPoisoned)
    }
}

fn duplicate(collection: &str, field: &str, value: &Value) -> StorageError {
    StorageError::DuplicateKey {
        collection: collection.to_string(),
        field: field.to_string(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}

fn append_line(path: &Path, document: &Map<String, Value>) -> StorageResult<()> {
    let mut line = serde_json::to_string(document).map_err(|e| {
        StorageError::io_error(
            "Failed to encode document",
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            StorageError::io_error(format!("Failed to open {}", path.display()), e)
        })?;

    write_line(&mut file, line.as_bytes())
        .map_err(|e| StorageError::io_error(format!("Failed to append to {}", path.display()), e))
}

/// Append target that can be cut back to an earlier length
trait LogFile: Write {
    fn end(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for fs::File {
    fn end(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Write and sync one line. On failure the log is truncated back to its
/// previous length so a partial line never precedes the next append.
fn write_line<L: LogFile>(log: &mut L, line: &[u8]) -> io::Result<()> {
    let end = log.end()?;

    if let Err(e) = log.write_all(line).and_then(|_| log.sync()) {
        if let Err(rollback) = log.truncate(end) {
            warn!(error = %rollback, "failed to truncate partial log line");
        }
        return Err(e);
    }

    Ok(())
}

fn read_log(path: &Path) -> StorageResult<Vec<Map<String, Value>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(path)
        .map_err(|e| StorageError::io_error(format!("Failed to open {}", path.display()), e))?;

    let mut documents = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line
            .map_err(|e| StorageError::io_error(format!("Failed to read {}", path.display()), e))?;
        if line.trim().is_empty() {
            continue;
        }

        let corrupt = |reason: String| StorageError::Corrupt {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(document)) => documents.push(document),
            Ok(_) => return Err(corrupt("not a JSON object".to_string())),
            Err(e) => return Err(corrupt(e.to_string())),
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_insert_and_find() {
        let users = Collection::new("users", None);
        users.insert(json!({ "email": "a@b.co" })).unwrap();
        users.insert(json!({ "email": "c@d.co" })).unwrap();

        let found = users.find_one("email", &json!("c@d.co")).unwrap();
        assert_eq!(found, Some(json!({ "email": "c@d.co" })));
        assert!(users.find_one("email", &json!("x@y.co")).unwrap().is_none());
        assert_eq!(users.count().unwrap(), 2);
    }

    #[test]
    fn test_unique_index_rejects_duplicates() {
        let users = Collection::new("users", None);
        users.ensure_unique("email").unwrap();

        users.insert(json!({ "email": "a@b.co" })).unwrap();
        let err = users.insert(json!({ "email": "a@b.co" })).unwrap_err();

        assert!(matches!(err, StorageError::DuplicateKey { ref field, .. } if field == "email"));
        assert_eq!(users.count().unwrap(), 1);
    }

    #[test]
    fn test_ensure_unique_checks_existing_documents() {
        let users = Collection::new("users", None);
        users.insert(json!({ "email": "a@b.co" })).unwrap();
        users.insert(json!({ "email": "a@b.co" })).unwrap();

        assert!(users.ensure_unique("email").is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        let users = Collection::new("users", None);
        assert!(matches!(
            users.insert(json!([1, 2])),
            Err(StorageError::NotAnObject)
        ));
    }

    #[test]
    fn test_find_all_keeps_insertion_order() {
        let receipts = Collection::new("receipts", None);
        for n in ["3", "1", "2"] {
            receipts.insert(json!({ "receipt_number": n })).unwrap();
        }

        let numbers: Vec<_> = receipts
            .find_all()
            .unwrap()
            .into_iter()
            .map(|doc| doc["receipt_number"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(numbers, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_log_replay() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("receipts.jsonl");

        let receipts = Collection::new("receipts", Some(path.clone()));
        receipts.insert(json!({ "receipt_number": "1", "amount": 5 })).unwrap();
        receipts.insert(json!({ "receipt_number": "2", "amount": 7 })).unwrap();

        let reopened = Collection::replay("receipts", path).unwrap();
        assert_eq!(reopened.find_all().unwrap(), receipts.find_all().unwrap());
    }

    #[test]
    fn test_corrupt_log_line_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.jsonl");
        fs::write(&path, "{\"email\":\"a@b.co\"}\nnot json\n").unwrap();

        let err = Collection::replay("users", path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
    }

    /// Accepts `budget` bytes, then fails every write
    struct ShortLog {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogFile for ShortLog {
        fn end(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_append_leaves_no_partial_line() {
        let mut log = ShortLog {
            data: b"{\"n\":1}\n".to_vec(),
            budget: 4,
        };

        assert!(write_line(&mut log, b"{\"n\":2}\n").is_err());
        assert_eq!(log.data, b"{\"n\":1}\n");

        log.budget = usize::MAX;
        write_line(&mut log, b"{\"n\":3}\n").unwrap();
        assert_eq!(log.data, b"{\"n\":1}\n{\"n\":3}\n");
    }

    #[test]
    fn test_truncate_on_append_mode_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("receipts.jsonl");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();

        write_line(&mut file, b"{\"n\":1}\n").unwrap();
        file.write_all(b"{\"n\":").unwrap();
        file.truncate(8).unwrap();
        write_line(&mut file, b"{\"n\":2}\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"n\":1}\n{\"n\":2}\n");
    }
}
