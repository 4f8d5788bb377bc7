//! ledgerdesk - user registration, login and receipts over HTTP
//!
//! Payloads are validated against static schemas, persisted in a small
//! document store, and every failure leaves through one JSON error envelope.

pub mod api;
pub mod auth;
pub mod cli;
pub mod http_server;
pub mod receipts;
pub mod schema;
pub mod storage;
