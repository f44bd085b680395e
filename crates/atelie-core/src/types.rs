//! # Domain Types
//!
//! Core domain types used throughout Atelie.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │  OrderRecord    │   │ PricingRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  owner_id       │   │  owner_id       │   │  owner_id       │       │
//! │  │  produto        │   │  numero NNNN/YY │   │  produto        │       │
//! │  │  quantidade     │   │  tipo           │   │  breakdown      │       │
//! │  │  valor_venda    │   │  produtos[]     │   │  preco_sugerido │       │
//! │  │  financeiro     │   │  financeiro     │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐  ┌─────────────────┐       │
//! │  │   OrderKind     │   │ ProductionStatus │  │   Material      │       │
//! │  │  Orcamento      │   │ Aberto/Convertido│  │  nome           │       │
//! │  │  Pedido         │   │ Pendente → ...   │  │  custo_unitario │       │
//! │  └─────────────────┘   └──────────────────┘  └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Every persisted entity carries `owner_id`, stamped at creation from the
//! acting [`AccountId`]. Reads are always filtered by it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::numbering::OrderNumber;
use crate::pricing::CostBreakdown;
use crate::projection::FinancialSnapshot;

// =============================================================================
// Account
// =============================================================================

/// Identifier of the acting account, as handed over by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an account identifier. Blank identifiers are rejected so no
    /// record can ever be stamped with an empty owner.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MissingOwner);
        }
        Ok(AccountId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// Per-unit financial split of a stock item's sale price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitFinancials {
    /// Materials + indirect cost per unit.
    pub custo: Money,
    /// Labor (salary) per unit.
    pub salario: Money,
    /// Profit margin per unit.
    pub margem: Money,
}

/// A product kept in stock and sold at the counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockItem {
    pub id: String,
    pub owner_id: String,
    /// Product name, unique per owner (case-insensitive).
    pub produto: String,
    /// Units on hand. May be negative: there is no hard stock floor.
    pub quantidade: i64,
    /// Unit sale price.
    pub valor_venda: Money,
    pub financeiro: UnitFinancials,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// True when sales have pushed the quantity below zero.
    #[inline]
    pub fn is_oversold(&self) -> bool {
        self.quantidade < 0
    }
}

// =============================================================================
// Order Kind / Source / Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderKind {
    /// Quote: a pre-order estimate, convertible into a pedido.
    Orcamento,
    /// Confirmed order with production tracking.
    Pedido,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Orcamento => "orcamento",
            OrderKind::Pedido => "pedido",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an order record came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderSource {
    Manual,
    Quote,
    StockSale,
}

/// Lifecycle of quotes and orders.
///
/// ## Transitions
/// ```text
/// Quotes:  Aberto ──convert──► Convertido
///             └──────────────► Cancelado
///
/// Orders:  Pendente ─► EmProducao ─► Pronto ─► Entregue
///             │            │           │
///             └────────────┴───────────┴─────► Cancelado
/// ```
/// Forward jumps (e.g. Pendente → Pronto) are allowed; moving backwards
/// or out of a terminal state is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductionStatus {
    Aberto,
    Convertido,
    Pendente,
    EmProducao,
    Pronto,
    Entregue,
    Cancelado,
}

impl ProductionStatus {
    /// Initial status for a freshly created record of `kind`.
    pub fn initial(kind: OrderKind) -> Self {
        match kind {
            OrderKind::Orcamento => ProductionStatus::Aberto,
            OrderKind::Pedido => ProductionStatus::Pendente,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Aberto => "aberto",
            ProductionStatus::Convertido => "convertido",
            ProductionStatus::Pendente => "pendente",
            ProductionStatus::EmProducao => "em_producao",
            ProductionStatus::Pronto => "pronto",
            ProductionStatus::Entregue => "entregue",
            ProductionStatus::Cancelado => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProductionStatus::Convertido | ProductionStatus::Entregue | ProductionStatus::Cancelado
        )
    }

    fn pipeline_rank(&self) -> Option<u8> {
        match self {
            ProductionStatus::Pendente => Some(0),
            ProductionStatus::EmProducao => Some(1),
            ProductionStatus::Pronto => Some(2),
            ProductionStatus::Entregue => Some(3),
            _ => None,
        }
    }

    /// Whether a record of `kind` may move from `self` to `to` through a
    /// plain status update. `Convertido` is only reachable by converting.
    pub fn can_transition_to(&self, kind: OrderKind, to: ProductionStatus) -> bool {
        if self.is_terminal() || *self == to {
            return false;
        }
        match kind {
            OrderKind::Orcamento => {
                *self == ProductionStatus::Aberto && to == ProductionStatus::Cancelado
            }
            OrderKind::Pedido => {
                if to == ProductionStatus::Cancelado {
                    return self.pipeline_rank().is_some();
                }
                match (self.pipeline_rank(), to.pipeline_rank()) {
                    (Some(from), Some(target)) => target > from,
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Record
// =============================================================================

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub descricao: String,
    pub quantidade: i64,
    pub valor_unit: Money,
    /// valor_unit × quantidade, frozen at creation.
    pub valor_total: Money,
}

impl OrderItem {
    pub fn new(descricao: impl Into<String>, quantidade: i64, valor_unit: Money) -> Self {
        OrderItem {
            descricao: descricao.into(),
            quantidade,
            valor_unit,
            valor_total: valor_unit.multiply_quantity(quantidade),
        }
    }
}

/// The stored financial breakdown of a quote or order.
///
/// ## Invariants
/// - `total == entrada + restante`
/// - `total == custos_totais + custo_mao_de_obra + margem_lucro + caixa_empresa`
/// - `total >= custos_totais`: a discount the cascade cannot absorb is
///   dropped once acknowledged (see `OrderRecord::below_cost_acknowledged`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFinancials {
    /// Amount charged to the customer.
    pub total: Money,
    /// Deposit paid.
    pub entrada: Money,
    /// Balance due.
    pub restante: Money,
    /// Discount actually applied at closing.
    pub desconto: Money,
    pub custos_totais: Money,
    /// Labor (salary) after the discount cascade.
    pub custo_mao_de_obra: Money,
    /// Profit after the discount cascade.
    pub margem_lucro: Money,
    /// Company-cash component, never touched by discounts.
    pub caixa_empresa: Money,
}

/// A quote or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRecord {
    pub id: String,
    pub owner_id: String,
    pub numero: OrderNumber,
    pub tipo: OrderKind,
    pub cliente: String,
    pub produtos: Vec<OrderItem>,
    /// Undiscounted split, kept so the discount can be re-applied later.
    pub base: FinancialSnapshot,
    pub financeiro: OrderFinancials,
    pub status: ProductionStatus,
    pub origem: OrderSource,
    /// Quote this order was converted from.
    pub quote_id: Option<String>,
    /// Stock item this order was sold from.
    pub stock_item_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub data_entrega: Option<NaiveDate>,
    /// The user confirmed a discount larger than profit plus salary.
    pub below_cost_acknowledged: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Pricing Catalog
// =============================================================================

/// A raw material in the owner's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Material {
    pub id: String,
    pub owner_id: String,
    pub nome: String,
    /// Unit label shown next to quantities ("m", "g", "un").
    pub unidade: String,
    pub custo_unitario: Money,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One material line of a pricing calculation.
///
/// `quantidade_milli` is the quantity in thousandths so fractional use
/// (0.25 m of ribbon) stays in integer math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialLine {
    /// Catalog entry this line was priced from, if any.
    pub material_id: Option<String>,
    pub descricao: String,
    pub quantidade_milli: i64,
    pub custo_unitario: Money,
}

impl MaterialLine {
    /// Line cost, rounded half up to the centavo.
    pub fn cost(&self) -> Money {
        let raw = self.custo_unitario.cents() as i128 * self.quantidade_milli as i128;
        let rounded = (raw + 500) / 1000;
        Money::from_cents(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

/// A named indirect cost share (energy, rent, packaging...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IndirectCost {
    pub descricao: String,
    pub valor: Money,
}

/// A saved pricing-calculator result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingRecord {
    pub id: String,
    pub owner_id: String,
    pub produto: String,
    pub materiais: Vec<MaterialLine>,
    pub mao_de_obra: Money,
    pub custos_indiretos: Vec<IndirectCost>,
    pub margem_lucro: Money,
    /// Breakdown snapshot taken when the record was last saved.
    pub breakdown: CostBreakdown,
    pub preco_sugerido: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
