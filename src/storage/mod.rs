//! Document storage for ledgerdesk
//!
//! A small document store: named collections of JSON objects, kept in
//! insertion order, with unique indexes enforced by the store itself.
//!
//! # Design Principles
//!
//! - One explicitly constructed client per process, no global handle
//! - Unique constraints are checked under the collection write lock
//! - File backend is append-only; a document is synced before it is visible
//! - Storage failures never leak their text to HTTP callers

mod client;
mod collection;
mod errors;

pub use client::{Backend, StorageClient};
pub use collection::Collection;
pub use errors::{StorageError, StorageResult};
