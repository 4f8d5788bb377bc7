//! Receipt number allocation
//!
//! Numbers are Unix milliseconds, forced strictly increasing within the
//! process: each allocation returns `max(now, last + 1)`. Seeding from the
//! highest replayed number keeps the sequence increasing across restarts.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Monotonic receipt number source
#[derive(Debug, Default)]
pub struct ReceiptNumberAuthority {
    last: AtomicU64,
}

impl ReceiptNumberAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authority that will never hand out `highest` or anything below it
    pub fn from_replayed(highest: u64) -> Self {
        Self {
            last: AtomicU64::new(highest),
        }
    }

    /// Allocate the next number using the wall clock
    pub fn next(&self) -> u64 {
        self.next_at(now_millis())
    }

    /// Allocate the next number given the current time in milliseconds
    pub fn next_at(&self, now: u64) -> u64 {
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }

    /// Highest number handed out so far (0 if none)
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
