//! # Outcome Type
//!
//! What the engines hand back instead of popping `confirm()` dialogs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Engine result              UI reaction                                │
//! │  ─────────────              ───────────                                │
//! │  Ok { value }               show success, done                         │
//! │  NeedsConfirmation          show warning + "Confirmar" button,         │
//! │    mandatory = false        re-invoke with confirmed = true            │
//! │    mandatory = true         same, and nothing is written until then    │
//! │  Blocked { reasons }        show reasons, operation not attempted      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{CostDrift, CostField};

/// Result of an operation that may require user confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export)]
pub enum Outcome<T> {
    Ok { value: T },
    NeedsConfirmation { confirmation: Confirmation },
    Blocked { reasons: Vec<String> },
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Outcome::Ok { value }
    }

    pub fn confirm(confirmation: Confirmation) -> Self {
        Outcome::NeedsConfirmation { confirmation }
    }

    pub fn blocked(reasons: Vec<String>) -> Self {
        Outcome::Blocked { reasons }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Outcome::NeedsConfirmation { .. })
    }

    /// Maps the success value, keeping confirmations and blocks as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok { value } => Outcome::Ok { value: f(value) },
            Outcome::NeedsConfirmation { confirmation } => {
                Outcome::NeedsConfirmation { confirmation }
            }
            Outcome::Blocked { reasons } => Outcome::Blocked { reasons },
        }
    }
}

/// A warning the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Confirmation {
    /// Advisory: some pricing components are zero.
    ZeroCostFields { fields: Vec<CostField> },
    /// Advisory: component costs changed since the record was saved.
    CostDrift { drift: CostDrift },
    /// Hard gate: the discounted total is below cost.
    BelowCost { total: Money, custos_totais: Money, shortfall: Money },
}

impl Confirmation {
    /// Whether the write must not happen without an explicit confirmation.
    ///
    /// Advisory warnings are shown but the caller may proceed; the
    /// below-cost gate defaults to "do not persist".
    pub fn mandatory(&self) -> bool {
        matches!(self, Confirmation::BelowCost { .. })
    }

    /// Short user-facing message.
    pub fn message(&self) -> String {
        match self {
            Confirmation::ZeroCostFields { fields } => {
                let names: Vec<&str> = fields.iter().map(|f| f.label()).collect();
                format!("Campos zerados: {}. Salvar mesmo assim?", names.join(", "))
            }
            Confirmation::CostDrift { drift } => format!(
                "Custos mudaram: preço {} → {} ({})",
                drift.old_price, drift.new_price, drift.delta
            ),
            Confirmation::BelowCost { total, custos_totais, shortfall } => format!(
                "Desconto passa do lucro e do salário em {}: venda fica em {} (custos {})",
                shortfall, total, custos_totais
            ),
        }
    }
}
