//! # Stock Commands
//!
//! Inventory catalog maintenance and the counter sale.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Sale Flow                                      │
//! │                                                                         │
//! │  {"cmd":"sell_from_stock","args":{"stock_item_id":"..","quantity":3}}   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleRepository::sell_from_stock    (one transaction)                   │
//! │       │                                                                 │
//! │       ├── Err ──► TRANSACTION_FAILED, nothing saved, no retry           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderLedger::upsert(pedido)         views update without reload        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  remaining < 0 ? warning notice : success notice                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelie_core::money::{to_currency_display, to_money};
use atelie_core::projection::FinancialSnapshot;
use atelie_core::validation::{
    validate_page_size, validate_price, validate_product_name, validate_quantity,
    validate_search_query, validate_uuid,
};
use atelie_core::{AccountId, RawAmount, StockItem, UnitFinancials};
use atelie_db::{Page, StockItemInput};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::order::OrderView;
use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::{ConfigState, DbState, OrderLedger};

/// Stock item fields as typed in the form. Amounts accept numbers or
/// `R$ 1.234,56`-style strings.
#[derive(Debug, Clone, Deserialize)]
pub struct StockItemArgs {
    pub produto: String,
    #[serde(default)]
    pub quantidade: i64,
    #[serde(default)]
    pub valor_venda: Option<RawAmount>,
    #[serde(default)]
    pub custo: Option<RawAmount>,
    #[serde(default)]
    pub salario: Option<RawAmount>,
    #[serde(default)]
    pub margem: Option<RawAmount>,
}

impl StockItemArgs {
    fn into_input(self) -> Result<StockItemInput, ApiError> {
        let produto = validate_product_name(&self.produto)?;
        let valor_venda = to_money(self.valor_venda.as_ref());
        validate_price(valor_venda)?;

        let financeiro = UnitFinancials {
            custo: to_money(self.custo.as_ref()),
            salario: to_money(self.salario.as_ref()),
            margem: to_money(self.margem.as_ref()),
        };
        FinancialSnapshot::for_price(valor_venda, financeiro.custo, financeiro.salario, financeiro.margem)?;

        Ok(StockItemInput {
            produto,
            quantidade: self.quantidade,
            valor_venda,
            financeiro,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStockArgs {
    pub id: String,
    pub item: StockItemArgs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListArgs {
    #[serde(default)]
    pub query: String,
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SellArgs {
    pub stock_item_id: String,
    pub quantity: i64,
}

/// Stock item as sent to the front-end.
#[derive(Debug, Clone, Serialize)]
pub struct StockItemView {
    #[serde(flatten)]
    pub item: StockItem,
    pub valor_venda_display: String,
    pub negative_stock: bool,
}

impl From<StockItem> for StockItemView {
    fn from(item: StockItem) -> Self {
        StockItemView {
            valor_venda_display: to_currency_display(Some(item.valor_venda)),
            negative_stock: item.is_oversold(),
            item,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    pub order: OrderView,
    pub remaining_quantity: i64,
    pub negative_stock: bool,
}

/// Registers a new stock item. Quantity must be positive on registration.
pub async fn register_stock_item(
    db: &DbState,
    owner: &AccountId,
    args: StockItemArgs,
) -> Result<Reply, ApiError> {
    validate_quantity(args.quantidade)?;
    let input = args.into_input()?;

    let item = db.inner().stock().register(owner, &input).await?;
    let message = format!("Produto {} cadastrado no estoque", item.produto);
    Reply::done(StockItemView::from(item), message)
}

/// Overwrites a stock item (last write wins).
pub async fn update_stock_item(
    db: &DbState,
    owner: &AccountId,
    args: UpdateStockArgs,
) -> Result<Reply, ApiError> {
    let input = args.item.into_input()?;
    let item = db.inner().stock().update(owner, &args.id, &input).await?;
    Reply::done(StockItemView::from(item), "Estoque atualizado")
}

pub async fn delete_stock_item(db: &DbState, owner: &AccountId, args: IdArgs) -> Result<Reply, ApiError> {
    db.inner().stock().delete(owner, &args.id).await?;
    Reply::done(serde_json::json!({ "id": args.id }), "Produto removido do estoque")
}

pub async fn get_stock_item(db: &DbState, owner: &AccountId, args: IdArgs) -> Result<Reply, ApiError> {
    let item = db
        .inner()
        .stock()
        .get(owner, &args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("StockItem", &args.id))?;
    Reply::done(StockItemView::from(item), "")
}

/// Lists stock items whose name contains `query`.
pub async fn list_stock_items(
    db: &DbState,
    config: &ConfigState,
    owner: &AccountId,
    args: ListArgs,
) -> Result<Reply, ApiError> {
    let query = validate_search_query(&args.query)?;
    let limit = args.limit.unwrap_or(config.page_size);
    validate_page_size(limit)?;
    debug!(query = %query, limit, offset = args.offset, "list_stock_items command");

    let page: Page<StockItemView> = db
        .inner()
        .stock()
        .list(owner, &query, limit, args.offset.max(0))
        .await?
        .map(StockItemView::from);

    let message = format!("{} produto(s)", page.total);
    Reply::done(page, message)
}

/// Sells from stock and records the paid pedido in one transaction.
pub async fn sell_from_stock(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: SellArgs,
) -> Result<Reply, ApiError> {
    validate_uuid(&args.stock_item_id)?;
    validate_quantity(args.quantity)?;

    let receipt = db
        .inner()
        .sales()
        .sell_from_stock(owner, &args.stock_item_id, args.quantity)
        .await?;

    ledger.upsert(receipt.order.clone());

    let negative_stock = receipt.negative_stock();
    let message = format!(
        "Venda registrada: pedido {} ({})",
        receipt.order.numero,
        to_currency_display(Some(receipt.order.financeiro.total))
    );
    let view = SaleView {
        order: OrderView::from(receipt.order),
        remaining_quantity: receipt.remaining_quantity,
        negative_stock,
    };

    if negative_stock {
        warn!(
            owner_id = %owner,
            stock_item_id = %args.stock_item_id,
            remaining = view.remaining_quantity,
            "Sale left stock negative"
        );
        let message = format!("{}. Estoque ficou negativo ({})", message, view.remaining_quantity);
        return Reply::attention(view, message);
    }
    Reply::done(view, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use atelie_db::{Database, DbConfig};

    async fn setup() -> (DbState, OrderLedger, AccountId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), OrderLedger::new(), AccountId::new("acc-1").unwrap())
    }

    fn caneca(quantidade: i64) -> StockItemArgs {
        StockItemArgs {
            produto: "  Caneca  ".to_string(),
            quantidade,
            valor_venda: Some(RawAmount::from("R$ 20,00")),
            custo: Some(RawAmount::from(6.0)),
            salario: Some(RawAmount::from("8,00")),
            margem: Some(RawAmount::from("5,00")),
        }
    }

    async fn register(db: &DbState, owner: &AccountId, quantidade: i64) -> String {
        let reply = register_stock_item(db, owner, caneca(quantidade)).await.unwrap();
        reply.data["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_validates_and_trims() {
        let (db, _, owner) = setup().await;

        let reply = register_stock_item(&db, &owner, caneca(10)).await.unwrap();
        assert_eq!(reply.data["produto"], "Caneca");
        assert_eq!(reply.data["valor_venda"], 2000);
        assert_eq!(reply.data["valor_venda_display"], "R$ 20,00");

        let err = register_stock_item(&db, &owner, caneca(0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut free = caneca(1);
        free.valor_venda = None;
        let err = register_stock_item(&db, &owner, free).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut dup = caneca(1);
        dup.produto = "CANECA".to_string();
        let err = register_stock_item(&db, &owner, dup).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_sale_updates_ledger() {
        let (db, ledger, owner) = setup().await;
        let id = register(&db, &owner, 10).await;

        let reply = sell_from_stock(
            &db,
            &ledger,
            &owner,
            SellArgs {
                stock_item_id: id,
                quantity: 3,
            },
        )
        .await
        .unwrap();

        assert!(!reply.attention);
        assert_eq!(reply.data["remaining_quantity"], 7);
        assert_eq!(reply.data["order"]["financeiro"]["total"], 6000);
        assert_eq!(reply.data["order"]["financeiro"]["restante"], 0);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_oversell_is_warning() {
        let (db, ledger, owner) = setup().await;
        let id = register(&db, &owner, 1).await;

        let reply = sell_from_stock(
            &db,
            &ledger,
            &owner,
            SellArgs {
                stock_item_id: id,
                quantity: 4,
            },
        )
        .await
        .unwrap();
        assert!(reply.attention);
        assert_eq!(reply.data["negative_stock"], true);
        assert_eq!(reply.data["remaining_quantity"], -3);
    }

    #[tokio::test]
    async fn test_other_account_cannot_sell() {
        let (db, ledger, owner) = setup().await;
        let id = register(&db, &owner, 10).await;
        let other = AccountId::new("acc-2").unwrap();

        let err = sell_from_stock(
            &db,
            &ledger,
            &other,
            SellArgs {
                stock_item_id: id,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_id_rejected_before_db() {
        let (db, ledger, owner) = setup().await;
        let err = sell_from_stock(
            &db,
            &ledger,
            &owner,
            SellArgs {
                stock_item_id: "caneca".to_string(),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unit_components_above_price_rejected() {
        let (db, _, owner) = setup().await;
        let mut args = caneca(5);
        args.margem = Some(RawAmount::from("9,00"));

        let err = register_stock_item(&db, &owner, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let page = list_stock_items(&db, &ConfigState::default(), &owner, ListArgs::default())
            .await
            .unwrap();
        assert_eq!(page.data["total"], 0);
    }

    #[tokio::test]
    async fn test_huge_quantity_rejected_without_selling() {
        let (db, ledger, owner) = setup().await;
        let id = register(&db, &owner, 10).await;

        let err = sell_from_stock(
            &db,
            &ledger,
            &owner,
            SellArgs {
                stock_item_id: id.clone(),
                quantity: 10_000_000_000_000_000,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let item = db.inner().stock().get(&owner, &id).await.unwrap().unwrap();
        assert_eq!(item.quantidade, 10);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_list_uses_config_page_size() {
        let (db, _, owner) = setup().await;
        register(&db, &owner, 5).await;
        let mut config = ConfigState::default();
        config.page_size = 1;

        let reply = list_stock_items(&db, &config, &owner, ListArgs::default())
            .await
            .unwrap();
        assert_eq!(reply.data["limit"], 1);
        assert_eq!(reply.data["total"], 1);

        let err = list_stock_items(
            &db,
            &config,
            &owner,
            ListArgs {
                limit: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
