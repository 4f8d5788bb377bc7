//! Receipts
//!
//! Generated receipts with a random amount and a strictly increasing
//! millisecond receipt number.

mod numbering;
mod service;

pub use numbering::ReceiptNumberAuthority;
pub use service::{Receipt, ReceiptService, ReceiptSummary, RECEIPT_AMOUNTS};
