//! # Pricing Engine
//!
//! Computes the suggested sale price from its components and exposes the
//! breakdown for display and storage.
//!
//! ## Price Waterfall
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   materiais (Σ qty × unit cost)  ─┐                                     │
//! │   mão de obra (salary)            ├──►  preço sugerido                  │
//! │   custos indiretos (Σ shares)     │     = exact sum, no rounding        │
//! │   margem de lucro                ─┘                                     │
//! │                                                                         │
//! │   Every field edit ──► recompute(inputs) ──► new output                 │
//! │   (no cached totals, no hidden observers)                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Save Policy
//! - Zero materials, labor or margin is a *soft block*: the save returns
//!   `NeedsConfirmation` (advisory) and proceeds once confirmed.
//! - Reopening a saved record re-derives costs from the current material
//!   catalog; a difference is reported as [`CostDrift`] and never
//!   silently overwrites the stored price.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::{to_money, Money, RawAmount};
use crate::outcome::{Confirmation, Outcome};
use crate::types::{IndirectCost, Material, MaterialLine, PricingRecord};

// =============================================================================
// Breakdown
// =============================================================================

/// The four components of a price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    pub materials_cost: Money,
    /// Labor, a.k.a. salary.
    pub labor_cost: Money,
    pub indirect_costs_total: Money,
    pub profit_margin: Money,
}

impl CostBreakdown {
    /// Suggested sale price: the exact sum of the four components.
    ///
    /// ```rust
    /// use atelie_core::money::Money;
    /// use atelie_core::pricing::CostBreakdown;
    ///
    /// let b = CostBreakdown {
    ///     materials_cost: Money::from_cents(1500),
    ///     labor_cost: Money::from_cents(3000),
    ///     indirect_costs_total: Money::from_cents(500),
    ///     profit_margin: Money::from_cents(2000),
    /// };
    /// assert_eq!(b.suggested_price().cents(), 7000);
    /// ```
    pub fn suggested_price(&self) -> Money {
        self.materials_cost + self.labor_cost + self.indirect_costs_total + self.profit_margin
    }

    /// Materials plus indirect costs: what the order must at least cover.
    pub fn total_costs(&self) -> Money {
        self.materials_cost + self.indirect_costs_total
    }

    /// Components that are zero among those the soft block watches.
    pub fn zeroed_fields(&self) -> Vec<CostField> {
        let mut fields = Vec::new();
        if self.materials_cost.is_zero() {
            fields.push(CostField::Materials);
        }
        if self.labor_cost.is_zero() {
            fields.push(CostField::Labor);
        }
        if self.profit_margin.is_zero() {
            fields.push(CostField::ProfitMargin);
        }
        fields
    }
}

/// Pricing components that trigger the zero-value soft block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CostField {
    Materials,
    Labor,
    ProfitMargin,
}

impl CostField {
    pub fn label(&self) -> &'static str {
        match self {
            CostField::Materials => "materiais",
            CostField::Labor => "mão de obra",
            CostField::ProfitMargin => "margem de lucro",
        }
    }
}

// =============================================================================
// Recompute
// =============================================================================

/// Raw calculator inputs, straight from the form.
///
/// Explicit `materials_cost` / `indirect_costs_total` values win; when
/// absent, they are rolled up from `material_lines` / `indirect_costs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingInputs {
    #[serde(default)]
    pub materials_cost: Option<RawAmount>,
    #[serde(default)]
    pub labor_cost: Option<RawAmount>,
    #[serde(default)]
    pub indirect_costs_total: Option<RawAmount>,
    #[serde(default)]
    pub profit_margin: Option<RawAmount>,
    /// Margin as basis points over the cost base, used when no explicit
    /// `profit_margin` is given.
    #[serde(default)]
    pub profit_margin_bps: Option<u32>,
    #[serde(default)]
    pub material_lines: Vec<MaterialLine>,
    #[serde(default)]
    pub indirect_costs: Vec<IndirectCost>,
}

/// What the calculator shows after every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingOutput {
    pub breakdown: CostBreakdown,
    pub suggested_price: Money,
    /// Fields the soft block would flag on save.
    pub zeroed_fields: Vec<CostField>,
}

/// Recomputes the breakdown and suggested price from raw inputs.
///
/// Pure: call it on every field change.
pub fn recompute(inputs: &PricingInputs) -> PricingOutput {
    let materials_cost = match &inputs.materials_cost {
        Some(raw) => to_money(Some(raw)),
        None => rollup_materials(&inputs.material_lines),
    };
    let indirect_costs_total = match &inputs.indirect_costs_total {
        Some(raw) => to_money(Some(raw)),
        None => rollup_indirect(&inputs.indirect_costs),
    };

    let labor_cost = to_money(inputs.labor_cost.as_ref());
    let profit_margin = match (&inputs.profit_margin, inputs.profit_margin_bps) {
        (None, Some(bps)) => {
            margin_from_percentage(materials_cost + labor_cost + indirect_costs_total, bps)
        }
        (raw, _) => to_money(raw.as_ref()),
    };

    let breakdown = CostBreakdown {
        materials_cost,
        labor_cost,
        indirect_costs_total,
        profit_margin,
    };

    PricingOutput {
        suggested_price: breakdown.suggested_price(),
        zeroed_fields: breakdown.zeroed_fields(),
        breakdown,
    }
}

/// Σ line costs.
pub fn rollup_materials(lines: &[MaterialLine]) -> Money {
    lines.iter().map(MaterialLine::cost).sum()
}

/// Σ indirect cost shares.
pub fn rollup_indirect(costs: &[IndirectCost]) -> Money {
    costs.iter().map(|c| c.valor).sum()
}

/// A margin of `bps` basis points over the cost base
/// (materials + labor + indirect).
///
/// ```rust
/// use atelie_core::money::Money;
/// use atelie_core::pricing::margin_from_percentage;
///
/// // 30% over R$ 100,00
/// assert_eq!(margin_from_percentage(Money::from_cents(10000), 3000).cents(), 3000);
/// ```
pub fn margin_from_percentage(cost_base: Money, bps: u32) -> Money {
    cost_base.floor_zero().percentage_bps(bps)
}

// =============================================================================
// Save Checks
// =============================================================================

/// Soft block applied before persisting a priced record.
///
/// Returns `NeedsConfirmation` (advisory) listing zeroed fields, unless
/// the caller already confirmed. Never blocks on its own.
pub fn check_save(breakdown: &CostBreakdown, confirmed: bool) -> Outcome<()> {
    let fields = breakdown.zeroed_fields();
    if fields.is_empty() || confirmed {
        return Outcome::ok(());
    }
    Outcome::confirm(Confirmation::ZeroCostFields { fields })
}

// =============================================================================
// Cost Drift
// =============================================================================

/// Price change between a stored snapshot and freshly fetched costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostDrift {
    pub old_price: Money,
    pub new_price: Money,
    /// new − old; negative when costs went down.
    pub delta: Money,
}

/// Compares a stored breakdown with the current one.
///
/// Returns `None` when nothing changed. Any component change counts,
/// even if the totals happen to cancel out.
pub fn detect_cost_drift(stored: &CostBreakdown, current: &CostBreakdown) -> Option<CostDrift> {
    if stored == current {
        return None;
    }
    let old_price = stored.suggested_price();
    let new_price = current.suggested_price();
    Some(CostDrift {
        old_price,
        new_price,
        delta: new_price - old_price,
    })
}

/// Result of re-pricing a saved record against the current catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Repricing {
    /// Material lines with unit costs refreshed from the catalog.
    pub materiais: Vec<MaterialLine>,
    pub current: CostBreakdown,
    pub drift: Option<CostDrift>,
    /// Descriptions of linked lines whose material left the catalog.
    pub missing_materials: Vec<String>,
}

/// Re-derives a record's breakdown from current material costs.
///
/// Lines whose `material_id` is no longer in the catalog keep their
/// stored unit cost and are listed in `missing_materials`. The record
/// itself is not modified.
pub fn reprice(record: &PricingRecord, catalog: &[Material]) -> Repricing {
    let by_id: HashMap<&str, &Material> = catalog.iter().map(|m| (m.id.as_str(), m)).collect();

    let missing_materials: Vec<String> = record
        .materiais
        .iter()
        .filter(|line| matches!(line.material_id.as_deref(), Some(id) if !by_id.contains_key(id)))
        .map(|line| line.descricao.clone())
        .collect();

    let materiais: Vec<MaterialLine> = record
        .materiais
        .iter()
        .map(|line| {
            let fresh = line
                .material_id
                .as_deref()
                .and_then(|id| by_id.get(id))
                .map(|m| m.custo_unitario);
            MaterialLine {
                custo_unitario: fresh.unwrap_or(line.custo_unitario),
                ..line.clone()
            }
        })
        .collect();

    let current = CostBreakdown {
        materials_cost: rollup_materials(&materiais),
        labor_cost: record.mao_de_obra,
        indirect_costs_total: rollup_indirect(&record.custos_indiretos),
        profit_margin: record.margem_lucro,
    };

    Repricing {
        drift: detect_cost_drift(&record.breakdown, &current),
        materiais,
        current,
        missing_materials,
    }
}

/// Decides whether a re-priced record may be saved.
///
/// ## Outcome
/// - `Blocked` when a linked material left the catalog; confirming does
///   not help, the record's lines have to be edited first
/// - `NeedsConfirmation(CostDrift)` when costs changed and `confirmed`
///   is false
/// - `Ok` otherwise
pub fn check_reprice(repricing: &Repricing, confirmed: bool) -> Outcome<()> {
    if !repricing.missing_materials.is_empty() {
        let reasons = repricing
            .missing_materials
            .iter()
            .map(|descricao| format!("Material {} não está mais no catálogo", descricao))
            .collect();
        return Outcome::blocked(reasons);
    }
    match repricing.drift {
        Some(drift) if !confirmed => Outcome::confirm(Confirmation::CostDrift { drift }),
        _ => Outcome::ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
