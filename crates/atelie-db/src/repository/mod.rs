//! # Repository Module
//!
//! Owner-scoped repositories over the SQLite database.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command handler                                                       │
//! │       │                                                                 │
//! │       │  db.stock().list(&account, "vaso", 20, 0)                      │
//! │       ▼                                                                 │
//! │  StockRepository                                                       │
//! │  ├── register / update / delete                                        │
//! │  └── get / list                                                        │
//! │       │                                                                 │
//! │       │  SQL ... WHERE owner_id = ?                                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every method takes the acting AccountId. A record owned by another    │
//! │  account is indistinguishable from a missing one.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StockRepository`](stock::StockRepository) - Stock items
//! - [`OrderRepository`](order::OrderRepository) - Quotes, orders, conversion
//! - [`SaleRepository`](sale::SaleRepository) - Atomic stock sale
//! - [`MaterialRepository`](material::MaterialRepository) - Material catalog
//! - [`PricingRepository`](pricing::PricingRepository) - Saved pricing records

use serde::Serialize;

pub mod material;
pub mod numbering;
pub mod order;
pub mod pricing;
pub mod sale;
pub mod stock;

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
