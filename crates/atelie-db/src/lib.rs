//! # atelie-db: Database Layer for Atelie
//!
//! SQLite storage for the workshop backend, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atelie Data Flow                                 │
//! │                                                                         │
//! │  Invoke command (sell_from_stock)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     atelie-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ StockRepo     │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_initial  │   │   │
//! │  │   │ WAL, FKs on   │    │ SaleRepo      │    │ _schema.sql  │   │   │
//! │  │   │               │    │ MaterialRepo  │    │              │   │   │
//! │  │   │               │    │ PricingRepo   │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/atelie/atelie.db                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Owner-scoped repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelie_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/atelie.db")).await?;
//! let page = db.stock().list(&account, "vaso", 20, 0).await?;
//! let receipt = db.sales().sell_from_stock(&account, &page.items[0].id, 2).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use repository::Page;

// Repository re-exports for convenience
pub use repository::material::{MaterialInput, MaterialRepository};
pub use repository::order::{NewOrder, OrderFilter, OrderRepository};
pub use repository::pricing::{PricingInput, PricingRepository};
pub use repository::sale::{SaleRepository, StockSaleReceipt};
pub use repository::stock::{StockItemInput, StockRepository};
