//! # Order Numbering
//!
//! Human-readable order numbers in the form `NNNN/YYYY`, scoped per
//! account, per kind and per year.
//!
//! ## Why Not Count Records?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  COUNT-BASED (broken)            MAX + COUNTER (this module)           │
//! │                                                                         │
//! │  0001, 0002, 0003 exist          0001, 0002, 0003 exist                │
//! │  delete 0002                     delete 0003                            │
//! │  count = 2 → next = 0003 ✗ dup   counter = 3 → next = 0004 ✓            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The persistent counter remembers the highest number ever handed out;
//! the max of existing records seeds it for data created before the
//! counter existed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// An order number: a sequence within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderNumber {
    // Field order matters for Ord: year first, then sequence.
    pub year: i32,
    pub seq: u32,
}

impl OrderNumber {
    pub const fn new(seq: u32, year: i32) -> Self {
        OrderNumber { year, seq }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:04}", self.seq, self.year)
    }
}

impl FromStr for OrderNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "numero".to_string(),
            reason: "expected NNNN/YYYY".to_string(),
        };

        let (seq, year) = s.trim().split_once('/').ok_or_else(invalid)?;
        if year.len() != 4 || seq.is_empty() {
            return Err(invalid());
        }
        let seq: u32 = seq.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        if seq == 0 {
            return Err(invalid());
        }
        Ok(OrderNumber::new(seq, year))
    }
}

/// Next sequence value for a scope.
///
/// `counter` is the last value recorded by the persistent counter (if
/// the scope has one); `max_existing` is the highest sequence among the
/// scope's current records.
///
/// ```rust
/// use atelie_core::numbering::next_sequence;
///
/// assert_eq!(next_sequence(None, None), 1);
/// assert_eq!(next_sequence(Some(3), Some(2)), 4); // 0003 was deleted
/// assert_eq!(next_sequence(None, Some(12)), 13); // legacy data, no counter yet
/// ```
pub fn next_sequence(counter: Option<u32>, max_existing: Option<u32>) -> u32 {
    counter.unwrap_or(0).max(max_existing.unwrap_or(0)) + 1
}
