//! Shared application state
//!
//! Built once from the connected [`StorageClient`] and cloned into every handler.
//! Each service keeps its own collection handles, so the client itself is
//! not retained.

use std::sync::Arc;

use crate::auth::{AuthWorkflow, JwtConfig, StoredUserRepository};
use crate::receipts::ReceiptService;
use crate::storage::{StorageClient, StorageResult};

/// State shared by all routes
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthWorkflow>,
    pub receipts: Arc<ReceiptService>,
}

impl AppState {
    /// Open every collection the routes need
    pub fn new(storage: &StorageClient, jwt_config: JwtConfig) -> StorageResult<Self> {
        let users = StoredUserRepository::open(storage)?;
        let receipts = ReceiptService::open(storage)?;

        Ok(Self {
            auth: Arc::new(AuthWorkflow::new(users, jwt_config)),
            receipts: Arc::new(receipts),
        })
    }

    /// Volatile state for tests
    pub fn in_memory(jwt_config: JwtConfig) -> StorageResult<Self> {
        Self::new(&StorageClient::in_memory("test"), jwt_config)
    }
}
