//! # Pricing Repository
//!
//! Saved pricing-calculator results. Material lines and indirect costs
//! are stored as JSON columns; the breakdown snapshot is stored flat so
//! it can be compared against a fresh one for drift.

use atelie_core::pricing::CostBreakdown;
use atelie_core::{AccountId, IndirectCost, MaterialLine, Money, PricingRecord};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Fields of a pricing record as submitted by the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingInput {
    pub produto: String,
    pub materiais: Vec<MaterialLine>,
    pub mao_de_obra: Money,
    pub custos_indiretos: Vec<IndirectCost>,
    pub margem_lucro: Money,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, FromRow)]
struct PricingRow {
    id: String,
    owner_id: String,
    produto: String,
    materiais_json: String,
    custos_indiretos_json: String,
    mao_de_obra_cents: i64,
    margem_cents: i64,
    materials_cost_cents: i64,
    labor_cost_cents: i64,
    indirect_total_cents: i64,
    profit_margin_cents: i64,
    preco_sugerido_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PricingRow> for PricingRecord {
    type Error = DbError;

    fn try_from(row: PricingRow) -> DbResult<Self> {
        Ok(PricingRecord {
            id: row.id,
            owner_id: row.owner_id,
            produto: row.produto,
            materiais: serde_json::from_str(&row.materiais_json)?,
            mao_de_obra: Money::from_cents(row.mao_de_obra_cents),
            custos_indiretos: serde_json::from_str(&row.custos_indiretos_json)?,
            margem_lucro: Money::from_cents(row.margem_cents),
            breakdown: CostBreakdown {
                materials_cost: Money::from_cents(row.materials_cost_cents),
                labor_cost: Money::from_cents(row.labor_cost_cents),
                indirect_costs_total: Money::from_cents(row.indirect_total_cents),
                profit_margin: Money::from_cents(row.profit_margin_cents),
            },
            preco_sugerido: Money::from_cents(row.preco_sugerido_cents),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RETURNING: &str = r#"
    id, owner_id, produto, materiais_json, custos_indiretos_json,
    mao_de_obra_cents, margem_cents,
    materials_cost_cents, labor_cost_cents, indirect_total_cents, profit_margin_cents,
    preco_sugerido_cents, created_at, updated_at
"#;

/// Repository for saved pricing records.
#[derive(Debug, Clone)]
pub struct PricingRepository {
    pool: SqlitePool,
}

impl PricingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PricingRepository { pool }
    }

    /// Inserts a new record, or overwrites `id` when given.
    ///
    /// The stored price is always `input.breakdown.suggested_price()`.
    pub async fn save(
        &self,
        owner: &AccountId,
        id: Option<&str>,
        input: &PricingInput,
    ) -> DbResult<PricingRecord> {
        let materiais = serde_json::to_string(&input.materiais)?;
        let indiretos = serde_json::to_string(&input.custos_indiretos)?;
        let b = &input.breakdown;
        let now = Utc::now();

        let sql = match id {
            None => format!(
                r#"
                INSERT INTO pricing_records (
                    id, owner_id, produto, materiais_json, custos_indiretos_json,
                    mao_de_obra_cents, margem_cents,
                    materials_cost_cents, labor_cost_cents, indirect_total_cents, profit_margin_cents,
                    preco_sugerido_cents, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
                RETURNING {}
                "#,
                RETURNING
            ),
            Some(_) => format!(
                r#"
                UPDATE pricing_records SET
                    produto = ?3, materiais_json = ?4, custos_indiretos_json = ?5,
                    mao_de_obra_cents = ?6, margem_cents = ?7,
                    materials_cost_cents = ?8, labor_cost_cents = ?9,
                    indirect_total_cents = ?10, profit_margin_cents = ?11,
                    preco_sugerido_cents = ?12, updated_at = ?13
                WHERE id = ?1 AND owner_id = ?2
                RETURNING {}
                "#,
                RETURNING
            ),
        };

        let record_id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        debug!(owner_id = %owner, id = %record_id, produto = %input.produto, "Saving pricing record");

        let row: PricingRow = sqlx::query_as(&sql)
            .bind(&record_id)
            .bind(owner.as_str())
            .bind(&input.produto)
            .bind(&materiais)
            .bind(&indiretos)
            .bind(input.mao_de_obra.cents())
            .bind(input.margem_lucro.cents())
            .bind(b.materials_cost.cents())
            .bind(b.labor_cost.cents())
            .bind(b.indirect_costs_total.cents())
            .bind(b.profit_margin.cents())
            .bind(b.suggested_price().cents())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("PricingRecord", record_id.as_str()))?;

        row.try_into()
    }

    pub async fn get(&self, owner: &AccountId, id: &str) -> DbResult<Option<PricingRecord>> {
        let row: Option<PricingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pricing_records WHERE id = ?1 AND owner_id = ?2",
            RETURNING
        ))
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PricingRecord::try_from).transpose()
    }

    pub async fn list(&self, owner: &AccountId) -> DbResult<Vec<PricingRecord>> {
        let rows: Vec<PricingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pricing_records WHERE owner_id = ?1 ORDER BY produto COLLATE NOCASE",
            RETURNING
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PricingRecord::try_from).collect()
    }

    pub async fn delete(&self, owner: &AccountId, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM pricing_records WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PricingRecord", id));
        }
        Ok(())
    }
}
