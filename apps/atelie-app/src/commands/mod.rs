//! # Commands Module
//!
//! All commands the front-end can invoke, and the table that routes a
//! command name to its function.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch)
//! ├── stock.rs     ◄─── Stock CRUD, counter sale
//! ├── order.rs     ◄─── Quotes, orders, conversion, status
//! ├── pricing.rs   ◄─── Calculator, saved records, re-pricing
//! ├── material.rs  ◄─── Material catalog
//! ├── format.rs    ◄─── Money/date display helpers
//! └── config.rs    ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Front-end                                                              │
//! │  ─────────                                                              │
//! │  {"id":7,"cmd":"list_stock_items","args":{"query":"caneca"}}            │
//! │         │                                                               │
//! │         │ (one JSON line on stdin)                                      │
//! │         ▼                                                               │
//! │  dispatch(state, "list_stock_items", account, args)                     │
//! │         │                                                               │
//! │         ├── owner = session.acting(account)                             │
//! │         ├── args  = serde_json::from_value::<ListArgs>(args)            │
//! │         ▼                                                               │
//! │  stock::list_stock_items(&state.db, &state.config, &owner, args)        │
//! │         │                                                               │
//! │         │ Result<Reply, ApiError>                                       │
//! │         ▼                                                               │
//! │  Notifier ──► {"id":7,"ok":true,"data":{...},"notice":{...}}            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn get_stock_item(db: &DbState, owner: &AccountId, args: IdArgs)
//!
//! // Needs database and the ledger
//! async fn sell_from_stock(db: &DbState, ledger: &OrderLedger, owner: &AccountId, args: SellArgs)
//!
//! // Pure
//! fn recompute_pricing(args: RecomputeArgs)
//! ```

pub mod config;
pub mod format;
pub mod material;
pub mod order;
pub mod pricing;
pub mod stock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::AppState;

/// Every command name `dispatch` accepts.
pub const COMMANDS: &[&str] = &[
    "get_config",
    "format_money",
    "format_date",
    "register_stock_item",
    "update_stock_item",
    "delete_stock_item",
    "get_stock_item",
    "list_stock_items",
    "sell_from_stock",
    "create_order",
    "create_quote",
    "convert_quote",
    "update_order_financials",
    "update_order_status",
    "delete_order",
    "get_order",
    "list_orders",
    "get_ledger",
    "create_material",
    "update_material",
    "delete_material",
    "list_materials",
    "recompute_pricing",
    "save_pricing",
    "get_pricing",
    "list_pricing",
    "delete_pricing",
    "reprice_pricing",
];

/// Decodes command arguments. A missing `args` reads as `{}`.
fn parse<T: DeserializeOwned>(cmd: &str, args: Value) -> Result<T, ApiError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args)
        .map_err(|e| ApiError::invalid_request(format!("Invalid arguments for {}: {}", cmd, e)))
}

/// Routes one command to its function.
///
/// `account` overrides the configured account for this request only.
pub async fn dispatch(
    state: &AppState,
    cmd: &str,
    account: Option<&str>,
    args: Value,
) -> Result<Reply, ApiError> {
    let AppState {
        db,
        session,
        ledger,
        config,
    } = state;

    // Pure commands need no owner.
    match cmd {
        "get_config" => return config::get_config(config, session),
        "format_money" => return format::format_money(config, parse(cmd, args)?),
        "format_date" => return format::format_date(parse(cmd, args)?),
        "recompute_pricing" => return pricing::recompute_pricing(parse(cmd, args)?),
        "get_ledger" => return order::get_ledger(ledger),
        _ => {}
    }

    if !COMMANDS.contains(&cmd) {
        return Err(ApiError::invalid_request(format!("Unknown command: {}", cmd)));
    }
    let owner = session.acting(account)?;
    let owner = &owner;

    match cmd {
        // Stock
        "register_stock_item" => stock::register_stock_item(db, owner, parse(cmd, args)?).await,
        "update_stock_item" => stock::update_stock_item(db, owner, parse(cmd, args)?).await,
        "delete_stock_item" => stock::delete_stock_item(db, owner, parse(cmd, args)?).await,
        "get_stock_item" => stock::get_stock_item(db, owner, parse(cmd, args)?).await,
        "list_stock_items" => stock::list_stock_items(db, config, owner, parse(cmd, args)?).await,
        "sell_from_stock" => stock::sell_from_stock(db, ledger, owner, parse(cmd, args)?).await,

        // Orders
        "create_order" => order::create_order(db, ledger, owner, parse(cmd, args)?).await,
        "create_quote" => order::create_quote(db, ledger, owner, parse(cmd, args)?).await,
        "convert_quote" => order::convert_quote(db, ledger, owner, parse(cmd, args)?).await,
        "update_order_financials" => {
            order::update_order_financials(db, ledger, owner, parse(cmd, args)?).await
        }
        "update_order_status" => order::update_order_status(db, ledger, owner, parse(cmd, args)?).await,
        "delete_order" => order::delete_order(db, ledger, owner, parse(cmd, args)?).await,
        "get_order" => order::get_order(db, owner, parse(cmd, args)?).await,
        "list_orders" => order::list_orders(db, ledger, config, owner, parse(cmd, args)?).await,

        // Materials
        "create_material" => material::create_material(db, owner, parse(cmd, args)?).await,
        "update_material" => material::update_material(db, owner, parse(cmd, args)?).await,
        "delete_material" => material::delete_material(db, owner, parse(cmd, args)?).await,
        "list_materials" => material::list_materials(db, owner).await,

        // Pricing
        "save_pricing" => pricing::save_pricing(db, owner, parse(cmd, args)?).await,
        "get_pricing" => pricing::get_pricing(db, owner, parse(cmd, args)?).await,
        "list_pricing" => pricing::list_pricing(db, owner).await,
        "delete_pricing" => pricing::delete_pricing(db, owner, parse(cmd, args)?).await,
        "reprice_pricing" => pricing::reprice_pricing(db, owner, parse(cmd, args)?).await,

        _ => Err(ApiError::invalid_request(format!("Unknown command: {}", cmd))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{ConfigState, DbState, OrderLedger, SessionState};
    use atelie_core::AccountId;
    use atelie_db::{Database, DbConfig};
    use serde_json::json;

    async fn state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState {
            db: DbState::new(db),
            session: SessionState::new(AccountId::new("acc-1").unwrap()),
            ledger: OrderLedger::new(),
            config: ConfigState::default(),
        }
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let state = state().await;
        let err = dispatch(&state, "drop_tables", None, Value::Null).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_bad_args_are_invalid_request() {
        let state = state().await;
        let err = dispatch(&state, "sell_from_stock", None, json!({ "quantity": "three" }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_null_args_read_as_empty_object() {
        let state = state().await;
        let reply = dispatch(&state, "list_stock_items", None, Value::Null).await.unwrap();
        assert_eq!(reply.data["total"], 0);
        assert_eq!(reply.data["limit"], 20);
    }

    #[tokio::test]
    async fn test_account_override_scopes_records() {
        let state = state().await;
        let reply = dispatch(
            &state,
            "register_stock_item",
            Some("acc-2"),
            json!({ "produto": "Caneca", "quantidade": 2, "valor_venda": "20,00" }),
        )
        .await
        .unwrap();
        let id = reply.data["id"].clone();
        assert_eq!(reply.data["owner_id"], "acc-2");

        let err = dispatch(&state, "get_stock_item", None, json!({ "id": id }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = dispatch(&state, "list_materials", Some(" "), Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_command_names_are_unique() {
        let mut names = COMMANDS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
