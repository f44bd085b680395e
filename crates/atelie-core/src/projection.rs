//! # Order Financial Projection
//!
//! Turns an undiscounted [`FinancialSnapshot`] plus the closing discount
//! and deposit into the [`OrderFinancials`] that get stored.
//!
//! ## Discount Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  discount D ──► margem_lucro ──► custo_mao_de_obra ──► (unabsorbed)     │
//! │                 absorbs first    absorbs the rest       below cost      │
//! │                                                                         │
//! │  custos_totais and caixa_empresa are never touched.                     │
//! │  total = custos + salary after + profit after + caixa                   │
//! │                                                                         │
//! │  Example: custos 40, salary 80, profit 50                               │
//! │    D = 0    → profit 50, salary 80, total 170                           │
//! │    D = 30   → profit 20, salary 80, total 140                           │
//! │    D = 100  → profit  0, salary 30, total  70                           │
//! │    D = 130  → profit  0, salary  0, total  40   (exactly at cost)       │
//! │    D = 150  → profit  0, salary  0, total  40   ⚠ shortfall 20          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Below-Cost Gate
//! A discount larger than profit plus salary would cut into cost. It
//! returns `Outcome::NeedsConfirmation` with a mandatory
//! [`Confirmation::BelowCost`] whose shortfall is the unabsorbed part.
//! Nothing is persisted until the caller re-invokes with
//! `confirmed = true`. The confirmed order is then charged its components:
//! the unabsorbed part is dropped and `desconto` records what was applied.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::outcome::{Confirmation, Outcome};
use crate::types::OrderFinancials;

/// The undiscounted split of a quote or order price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSnapshot {
    pub custos_totais: Money,
    pub custo_mao_de_obra: Money,
    pub margem_lucro: Money,
    pub caixa_empresa: Money,
}

impl FinancialSnapshot {
    /// Splits a sale price into components. Whatever the cost, salary
    /// and margin do not cover goes to `caixa_empresa`, so `gross()`
    /// always equals `price`.
    ///
    /// ## Errors
    /// - `CoreError::ComponentsExceedPrice` when cost, salary and margin
    ///   add up to more than `price`
    pub fn for_price(
        price: Money,
        custos_totais: Money,
        custo_mao_de_obra: Money,
        margem_lucro: Money,
    ) -> CoreResult<Self> {
        let components = custos_totais + custo_mao_de_obra + margem_lucro;
        if components > price {
            return Err(CoreError::ComponentsExceedPrice { components, price });
        }
        Ok(FinancialSnapshot {
            custos_totais,
            custo_mao_de_obra,
            margem_lucro,
            caixa_empresa: price - components,
        })
    }

    /// Sum of all four components.
    pub fn gross(&self) -> Money {
        self.custos_totais + self.custo_mao_de_obra + self.margem_lucro + self.caixa_empresa
    }
}

/// Components after a discount has been absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountCascade {
    pub profit_after: Money,
    pub salary_after: Money,
    /// Discount left over once profit and salary are exhausted.
    pub unabsorbed: Money,
}

/// Absorbs `discount` into profit first, then salary.
///
/// Negative discounts are treated as zero.
pub fn apply_discount(snapshot: &FinancialSnapshot, discount: Money) -> DiscountCascade {
    let mut remaining = discount.floor_zero();

    let profit_after = (snapshot.margem_lucro - remaining).floor_zero();
    remaining = (remaining - snapshot.margem_lucro).floor_zero();

    let salary_after = (snapshot.custo_mao_de_obra - remaining).floor_zero();
    remaining = (remaining - snapshot.custo_mao_de_obra).floor_zero();

    DiscountCascade {
        profit_after,
        salary_after,
        unabsorbed: remaining,
    }
}

/// Projects the financials to store for an order or quote.
///
/// ## Errors
/// - `CoreError::DepositExceedsTotal` when `entrada` is above the charged total
///
/// ## Outcome
/// - `NeedsConfirmation(BelowCost)` when the discount is larger than
///   profit plus salary and `confirmed` is false
/// - `Ok(financials)` otherwise; the components always add up to `total`
pub fn project_order(
    snapshot: &FinancialSnapshot,
    discount: Money,
    entrada: Money,
    confirmed: bool,
) -> CoreResult<Outcome<OrderFinancials>> {
    let discount = discount.floor_zero();
    let entrada = entrada.floor_zero();
    let cascade = apply_discount(snapshot, discount);
    let total = snapshot.custos_totais
        + cascade.salary_after
        + cascade.profit_after
        + snapshot.caixa_empresa;

    if entrada > total {
        return Err(CoreError::DepositExceedsTotal { entrada, total });
    }

    if cascade.unabsorbed.is_positive() && !confirmed {
        return Ok(Outcome::confirm(Confirmation::BelowCost {
            total,
            custos_totais: snapshot.custos_totais,
            shortfall: cascade.unabsorbed,
        }));
    }

    Ok(Outcome::ok(OrderFinancials {
        total,
        entrada,
        restante: total - entrada,
        desconto: discount - cascade.unabsorbed,
        custos_totais: snapshot.custos_totais,
        custo_mao_de_obra: cascade.salary_after,
        margem_lucro: cascade.profit_after,
        caixa_empresa: snapshot.caixa_empresa,
    }))
}

/// Part of `discount` that profit and salary cannot absorb.
///
/// Non-zero exactly when [`project_order`] raises the below-cost gate.
pub fn discount_shortfall(snapshot: &FinancialSnapshot, discount: Money) -> Money {
    apply_discount(snapshot, discount).unabsorbed
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reais(r: i64) -> Money {
        Money::from_cents(r * 100)
    }

    fn sample() -> FinancialSnapshot {
        FinancialSnapshot {
            custos_totais: reais(40),
            custo_mao_de_obra: reais(80),
            margem_lucro: reais(50),
            caixa_empresa: Money::zero(),
        }
    }

    fn ok_value(outcome: Outcome<OrderFinancials>) -> OrderFinancials {
        match outcome {
            Outcome::Ok { value } => value,
            other => panic!("expected ok, got {:?}", other),
        }
    }

    fn components(f: &OrderFinancials) -> Money {
        f.custos_totais + f.custo_mao_de_obra + f.margem_lucro + f.caixa_empresa
    }

    #[test]
    fn test_for_price_puts_remainder_in_company_cash() {
        let s = FinancialSnapshot::for_price(reais(200), reais(40), reais(80), reais(50)).unwrap();
        assert_eq!(s.caixa_empresa, reais(30));
        assert_eq!(s.gross(), reais(200));

        let exact = FinancialSnapshot::for_price(reais(170), reais(40), reais(80), reais(50)).unwrap();
        assert_eq!(exact.caixa_empresa, Money::zero());
    }

    #[test]
    fn test_for_price_rejects_components_above_price() {
        let err = FinancialSnapshot::for_price(reais(100), reais(40), reais(80), reais(50)).unwrap_err();
        match err {
            CoreError::ComponentsExceedPrice { components, price } => {
                assert_eq!(components, reais(170));
                assert_eq!(price, reais(100));
            }
            other => panic!("expected ComponentsExceedPrice, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_discount_is_identity() {
        let s = sample();
        let cascade = apply_discount(&s, Money::zero());
        assert_eq!(cascade.profit_after, s.margem_lucro);
        assert_eq!(cascade.salary_after, s.custo_mao_de_obra);

        let f = ok_value(project_order(&s, Money::zero(), Money::zero(), false).unwrap());
        assert_eq!(f.total, reais(170));
        assert_eq!(f.restante, reais(170));
    }

    #[test]
    fn test_discount_within_profit_touches_profit_only() {
        let cascade = apply_discount(&sample(), reais(30));
        assert_eq!(cascade.profit_after, reais(20));
        assert_eq!(cascade.salary_after, reais(80));
    }

    #[test]
    fn test_discount_spills_into_salary() {
        let f = ok_value(project_order(&sample(), reais(100), Money::zero(), false).unwrap());
        assert_eq!(f.margem_lucro, Money::zero());
        assert_eq!(f.custo_mao_de_obra, reais(30));
        assert_eq!(f.total, reais(70));
        assert_eq!(f.custos_totais, reais(40));
        assert_eq!(f.desconto, reais(100));
    }

    #[test]
    fn test_below_cost_gate() {
        let outcome = project_order(&sample(), reais(150), Money::zero(), false).unwrap();
        match outcome {
            Outcome::NeedsConfirmation { confirmation } => {
                assert!(confirmation.mandatory());
                assert_eq!(
                    confirmation,
                    Confirmation::BelowCost {
                        total: reais(40),
                        custos_totais: reais(40),
                        shortfall: reais(20),
                    }
                );
            }
            other => panic!("expected confirmation, got {:?}", other),
        }

        let f = ok_value(project_order(&sample(), reais(150), Money::zero(), true).unwrap());
        assert_eq!(f.total, reais(40));
        assert_eq!(f.desconto, reais(130));
        assert_eq!(components(&f), f.total);
    }

    #[test]
    fn test_boundary_at_cost_does_not_warn() {
        // D == margem + salary
        let f = ok_value(project_order(&sample(), reais(130), Money::zero(), false).unwrap());
        assert_eq!(f.total, reais(40));
        assert_eq!(discount_shortfall(&sample(), reais(130)), Money::zero());
    }

    #[test]
    fn test_shortfall_matches_unabsorbed_discount() {
        for d in [131, 150, 170, 500] {
            let s = sample();
            assert_eq!(discount_shortfall(&s, reais(d)), reais(d - 130));
            if let Outcome::NeedsConfirmation {
                confirmation: Confirmation::BelowCost { shortfall, total, .. },
            } = project_order(&s, reais(d), Money::zero(), false).unwrap()
            {
                assert_eq!(shortfall, reais(d - 130));
                assert_eq!(total, reais(40));
            } else {
                panic!("expected below-cost gate for D = {}", d);
            }
        }
    }

    #[test]
    fn test_caixa_empresa_untouched() {
        let s = FinancialSnapshot {
            caixa_empresa: reais(25),
            ..sample()
        };
        let f = ok_value(project_order(&s, reais(100), Money::zero(), false).unwrap());
        assert_eq!(f.caixa_empresa, reais(25));
        assert_eq!(f.total, reais(95));
        assert_eq!(components(&f), f.total);
    }

    #[test]
    fn test_gate_fires_past_salary_even_with_company_cash() {
        let s = FinancialSnapshot {
            caixa_empresa: reais(25),
            ..sample()
        };
        match project_order(&s, reais(150), Money::zero(), false).unwrap() {
            Outcome::NeedsConfirmation {
                confirmation: Confirmation::BelowCost { total, shortfall, .. },
            } => {
                assert_eq!(shortfall, reais(20));
                assert_eq!(total, reais(65));
            }
            other => panic!("expected below-cost gate, got {:?}", other),
        }

        let f = ok_value(project_order(&s, reais(150), Money::zero(), true).unwrap());
        assert_eq!(f.total, reais(65));
        assert_eq!(f.caixa_empresa, reais(25));
        assert_eq!(f.desconto, reais(130));
        assert_eq!(components(&f), f.total);
        assert_eq!(s.gross() - f.desconto, f.total);
    }

    #[test]
    fn test_components_always_sum_to_total() {
        for caixa in [0, 25] {
            for d in [0, 30, 100, 130, 131, 150, 500] {
                let s = FinancialSnapshot {
                    caixa_empresa: reais(caixa),
                    ..sample()
                };
                let f = ok_value(project_order(&s, reais(d), Money::zero(), true).unwrap());
                assert_eq!(components(&f), f.total, "caixa {} D {}", caixa, d);
            }
        }
    }

    #[test]
    fn test_entrada_and_restante() {
        let f = ok_value(project_order(&sample(), reais(10), reais(60), false).unwrap());
        assert_eq!(f.total, reais(160));
        assert_eq!(f.entrada + f.restante, f.total);
        assert_eq!(f.restante, reais(100));

        let err = project_order(&sample(), reais(100), reais(90), false).unwrap_err();
        assert!(matches!(err, CoreError::DepositExceedsTotal { .. }));
    }
}
