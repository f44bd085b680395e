//! # Session State
//!
//! The acting account. Authentication happens outside this process; the
//! host only receives an identifier, from configuration or per request,
//! and stamps it on everything it writes.

use atelie_core::{AccountId, CoreError};

#[derive(Debug, Clone)]
pub struct SessionState {
    account: AccountId,
}

impl SessionState {
    pub fn new(account: AccountId) -> Self {
        SessionState { account }
    }

    /// The configured account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Resolves the account a request acts as. A request may name its
    /// own account; a blank one is refused rather than falling back.
    pub fn acting(&self, requested: Option<&str>) -> Result<AccountId, CoreError> {
        match requested {
            Some(id) => AccountId::new(id),
            None => Ok(self.account.clone()),
        }
    }
}
