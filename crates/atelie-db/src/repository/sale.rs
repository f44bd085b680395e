//! # Sale Repository
//!
//! The atomic stock sale: decrement stock and record the paid pedido in
//! one transaction.
//!
//! ## Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    sell_from_stock(owner, item, qty)                    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. load item (owner-scoped)            ──► NotFound                  │
//! │    2. plan_stock_sale(item, qty)          ──► Rejected (bad qty/price)  │
//! │    3. quantidade = quantidade - qty       (delta, no floor)             │
//! │    4. next pedido number + counter bump                                 │
//! │    5. insert pedido { origem: stock_sale, entrada = total }             │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure in 3-5 → transaction dropped → rollback → nothing visible  │
//! │  Never retried automatically.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelie_core::sale::plan_stock_sale;
use atelie_core::{AccountId, OrderKind, OrderRecord, OrderSource};
use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use super::order::{insert_numbered, NewOrder};
use super::stock;
use crate::error::{DbError, DbResult};

/// What a committed stock sale produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSaleReceipt {
    pub order: OrderRecord,
    /// Quantity on hand right after the sale committed.
    pub remaining_quantity: i64,
}

impl StockSaleReceipt {
    pub fn negative_stock(&self) -> bool {
        self.remaining_quantity < 0
    }
}

/// Repository for stock sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sells `quantity` units of a stock item.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the item does not exist for `owner`
    /// - `DbError::Rejected` if `quantity` is not positive
    /// - `DbError::TransactionFailed` if any write fails (already rolled back)
    pub async fn sell_from_stock(
        &self,
        owner: &AccountId,
        stock_item_id: &str,
        quantity: i64,
    ) -> DbResult<StockSaleReceipt> {
        debug!(owner_id = %owner, stock_item_id = %stock_item_id, quantity, "Starting stock sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let receipt = match sell_in_transaction(&mut tx, owner, stock_item_id, quantity).await {
            Ok(receipt) => receipt,
            Err(err) => {
                let err = err.in_transaction();
                if matches!(err, DbError::TransactionFailed(_)) {
                    error!(owner_id = %owner, stock_item_id = %stock_item_id, quantity, error = %err, "Stock sale rolled back");
                }
                return Err(err);
            }
        };

        tx.commit().await.map_err(|e| {
            error!(owner_id = %owner, stock_item_id = %stock_item_id, error = %e, "Stock sale commit failed");
            DbError::TransactionFailed(e.to_string())
        })?;

        info!(
            owner_id = %owner,
            stock_item_id = %stock_item_id,
            order_id = %receipt.order.id,
            numero = %receipt.order.numero,
            quantity,
            total = %receipt.order.financeiro.total,
            "Stock sale committed"
        );
        if receipt.negative_stock() {
            warn!(
                owner_id = %owner,
                stock_item_id = %stock_item_id,
                remaining = receipt.remaining_quantity,
                "Stock went negative"
            );
        }

        Ok(receipt)
    }
}

async fn sell_in_transaction(
    conn: &mut SqliteConnection,
    owner: &AccountId,
    stock_item_id: &str,
    quantity: i64,
) -> DbResult<StockSaleReceipt> {
    let item = stock::fetch_owned(conn, owner, stock_item_id)
        .await?
        .ok_or_else(|| DbError::not_found("StockItem", stock_item_id))?;

    let plan = plan_stock_sale(&item, quantity)?;

    let remaining_quantity: i64 = sqlx::query_scalar(
        r#"
        UPDATE stock_items SET quantidade = quantidade - ?3, updated_at = ?4
        WHERE id = ?1 AND owner_id = ?2
        RETURNING quantidade
        "#,
    )
    .bind(stock_item_id)
    .bind(owner.as_str())
    .bind(plan.quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("StockItem", stock_item_id))?;

    let order = insert_numbered(
        conn,
        owner,
        NewOrder {
            tipo: OrderKind::Pedido,
            cliente: String::new(),
            produtos: vec![plan.item],
            base: plan.base,
            financeiro: plan.financeiro,
            origem: OrderSource::StockSale,
            quote_id: None,
            stock_item_id: Some(stock_item_id.to_string()),
            data_entrega: None,
            below_cost_acknowledged: false,
        },
    )
    .await?;

    Ok(StockSaleReceipt {
        order,
        remaining_quantity,
    })
}

// =============================================================================
// Tests
// =============================================================================
