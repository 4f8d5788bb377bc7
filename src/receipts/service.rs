//! Receipt generation and listing over the `receipts` collection

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::numbering::ReceiptNumberAuthority;
use crate::api::{ErrorSignal, SignalResult};
use crate::schema::{receipt_schema, RequestValidator, SchemaDescriptor, RECEIPTS_COLLECTION};
use crate::storage::{Collection, StorageClient, StorageResult};

/// Amounts a generated receipt can carry
pub const RECEIPT_AMOUNTS: [u64; 4] = [500_000, 750_000, 1_250_000, 1_750_000];

/// Stored receipt document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_number: String,
    pub amount: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl Receipt {
    fn new(receipt_number: u64, amount: u64, now: DateTime<Utc>) -> Self {
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            receipt_number: receipt_number.to_string(),
            amount,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }
}

/// Listing projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptSummary {
    pub amount: u64,
    pub receipt_number: String,
}

impl From<Receipt> for ReceiptSummary {
    fn from(receipt: Receipt) -> Self {
        Self {
            amount: receipt.amount,
            receipt_number: receipt.receipt_number,
        }
    }
}

/// Creates and lists receipts
#[derive(Debug)]
pub struct ReceiptService {
    receipts: Collection,
    numbers: ReceiptNumberAuthority,
    schema: SchemaDescriptor,
}

impl ReceiptService {
    /// Open the `receipts` collection, declare its unique index and seed
    /// numbering from whatever is already stored.
    pub fn open(client: &StorageClient) -> StorageResult<Self> {
        let receipts = client.collection(RECEIPTS_COLLECTION, &["receipt_number"])?;

        let highest = receipts
            .find_all()?
            .iter()
            .filter_map(|doc| doc.get("receipt_number")?.as_str()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        if highest > 0 {
            info!(highest, "receipt numbering resumed");
        }

        Ok(Self {
            receipts,
            numbers: ReceiptNumberAuthority::from_replayed(highest),
            schema: receipt_schema(),
        })
    }

    /// Generate and store one receipt with a random amount
    pub fn create(&self) -> SignalResult<Receipt> {
        let index = rand::thread_rng().gen_range(0..RECEIPT_AMOUNTS.len());
        let receipt = Receipt::new(self.numbers.next(), RECEIPT_AMOUNTS[index], Utc::now());

        let document = serde_json::to_value(&receipt).map_err(|e| {
            error!(error = %e, "receipt encoding failed");
            ErrorSignal::unexpected()
        })?;

        let Value::Object(fields) = &document else {
            return Err(ErrorSignal::unexpected());
        };
        RequestValidator::new(&self.schema)
            .all_fields()
            .strict()
            .validate(fields)
            .map_err(|signal| {
                error!(error = %signal, "generated receipt failed schema check");
                ErrorSignal::unexpected()
            })?;

        self.receipts.insert(document)?;
        debug!(receipt_number = %receipt.receipt_number, amount = receipt.amount, "receipt created");
        Ok(receipt)
    }

    /// Every receipt in insertion order
    pub fn list(&self) -> SignalResult<Vec<ReceiptSummary>> {
        self.receipts
            .find_all()?
            .into_iter()
            .map(|document| {
                serde_json::from_value::<Receipt>(document)
                    .map(ReceiptSummary::from)
                    .map_err(|e| {
                        error!(error = %e, "stored receipt is unreadable");
                        ErrorSignal::unexpected()
                    })
            })
            .collect()
    }
}
