//! # Format Commands
//!
//! Money and date formatting for values typed in the front-end, so the
//! display rules live in one place.

use atelie_core::format::to_display_date;
use atelie_core::money::to_money;
use atelie_core::RawAmount;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::ConfigState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormatMoneyArgs {
    pub amount: Option<RawAmount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormatDateArgs {
    /// ISO `YYYY-MM-DD`
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoneyView {
    pub cents: i64,
    pub display: String,
}

/// Normalizes a typed amount (`"R$ 1.234,56"`, `12.5`, garbage) and
/// formats it. Unparseable input is zero.
pub fn format_money(config: &ConfigState, args: FormatMoneyArgs) -> Result<Reply, ApiError> {
    let money = to_money(args.amount.as_ref());
    Reply::done(
        MoneyView {
            cents: money.cents(),
            display: config.format_money(Some(money)),
        },
        "",
    )
}

pub fn format_date(args: FormatDateArgs) -> Result<Reply, ApiError> {
    Reply::done(to_display_date(args.date.as_deref()), "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_money() {
        let config = ConfigState::default();
        let args = FormatMoneyArgs {
            amount: Some(RawAmount::from("R$ 1.234,56")),
        };
        let reply = format_money(&config, args).unwrap();
        assert_eq!(reply.data, json!({ "cents": 123456, "display": "R$ 1.234,56" }));

        let reply = format_money(&config, FormatMoneyArgs::default()).unwrap();
        assert_eq!(reply.data["display"], "R$ 0,00");
    }

    #[test]
    fn test_format_date() {
        let reply = format_date(FormatDateArgs {
            date: Some("2024-03-15".to_string()),
        })
        .unwrap();
        assert_eq!(reply.data, json!("15/03/2024"));

        let reply = format_date(FormatDateArgs::default()).unwrap();
        assert_eq!(reply.data, json!("-"));
    }
}
