//! # Database State
//!
//! Wraps the `Database` handle for command handlers. The inner
//! `SqlitePool` is thread-safe, so no lock is needed here.

use atelie_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ```rust,ignore
    /// let page = db_state.inner().stock().list(&account, "vaso", 20, 0).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
