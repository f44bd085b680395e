//! # Stock Sale Planning
//!
//! The pure half of a counter sale: everything that can be computed
//! before touching the database.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan_stock_sale(item, qty)          (this module, pure)                │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  StockSalePlan { order line, financials, resulting quantity }           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  SaleRepository::sell_from_stock     (atelie-db, one transaction)       │
//! │      ├── quantidade = quantidade - qty                                  │
//! │      ├── next order number                                              │
//! │      └── insert pedido + items                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A counter sale is paid in full: `entrada == total`, `restante == 0`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::projection::FinancialSnapshot;
use crate::types::{OrderFinancials, OrderItem, StockItem};
use crate::validation::validate_quantity;

/// What a stock sale will write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSalePlan {
    pub quantity: i64,
    pub item: OrderItem,
    pub base: FinancialSnapshot,
    pub financeiro: OrderFinancials,
    /// Quantity on hand once the sale commits, from the item as read.
    /// The database applies the sale as a delta, so concurrent sales may
    /// leave a different figure.
    pub expected_quantity: i64,
}

impl StockSalePlan {
    pub fn leaves_negative_stock(&self) -> bool {
        self.expected_quantity < 0
    }
}

/// Plans the sale of `qty` units of `item`.
///
/// Per-unit cost, salary and margin are scaled by `qty`. Whatever part of
/// the sale price they do not cover goes to `caixa_empresa`.
///
/// ## Errors
/// - `ValidationError::MustBePositive` when `qty <= 0`
/// - `ValidationError::OutOfRange` when `qty > MAX_ITEM_QUANTITY`
/// - `CoreError::ComponentsExceedPrice` when the item's unit cost, salary
///   and margin add up to more than its sale price
///
/// There is no stock floor: selling more than is on hand is allowed.
pub fn plan_stock_sale(item: &StockItem, qty: i64) -> CoreResult<StockSalePlan> {
    validate_quantity(qty)?;

    let line = OrderItem::new(item.produto.clone(), qty, item.valor_venda);
    let total = line.valor_total;

    let base = FinancialSnapshot::for_price(
        total,
        item.financeiro.custo.multiply_quantity(qty),
        item.financeiro.salario.multiply_quantity(qty),
        item.financeiro.margem.multiply_quantity(qty),
    )?;

    let financeiro = OrderFinancials {
        total,
        entrada: total,
        restante: Money::zero(),
        desconto: Money::zero(),
        custos_totais: base.custos_totais,
        custo_mao_de_obra: base.custo_mao_de_obra,
        margem_lucro: base.margem_lucro,
        caixa_empresa: base.caixa_empresa,
    };

    Ok(StockSalePlan {
        quantity: qty,
        item: line,
        base,
        financeiro,
        expected_quantity: item.quantidade - qty,
    })
}
