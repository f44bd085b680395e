//! # State Module
//!
//! Separate state types, each command takes only the ones it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │   DbState    │ │ SessionState │ │ OrderLedger  │ │ ConfigState  │   │
//! │  │              │ │              │ │              │ │              │   │
//! │  │  Database    │ │  AccountId   │ │  Arc<Mutex<  │ │  store_name  │   │
//! │  │  (SQLite     │ │  (acting     │ │   Vec<Order  │ │  page_size   │   │
//! │  │   pool)      │ │   owner)     │ │   Record>>>  │ │  currency    │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • OrderLedger: Protected by Arc<Mutex<T>> for exclusive access        │
//! │  • SessionState, ConfigState: Read-only after initialization           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod ledger;
mod session;

pub use config::ConfigState;
pub use db::DbState;
pub use ledger::OrderLedger;
pub use session::SessionState;

/// Everything the invoke loop hands to commands.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DbState,
    pub session: SessionState,
    pub ledger: OrderLedger,
    pub config: ConfigState,
}
