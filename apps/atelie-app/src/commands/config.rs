//! # Config Commands
//!
//! Read-only view of the resolved configuration.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::{ConfigState, SessionState};

/// What the front-end needs at startup. The database path stays private.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    pub account_id: String,
    pub store_name: String,
    pub page_size: i64,
    pub currency_symbol: String,
}

/// Gets the current application configuration.
///
/// ## When Used
/// - App startup (store name in the header)
/// - Currency formatting
pub fn get_config(config: &ConfigState, session: &SessionState) -> Result<Reply, ApiError> {
    debug!("get_config command");
    Reply::done(
        ConfigView {
            account_id: session.account().to_string(),
            store_name: config.store_name.clone(),
            page_size: config.page_size,
            currency_symbol: config.currency_symbol.clone(),
        },
        "",
    )
}
