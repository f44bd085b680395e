//! # Stock Repository
//!
//! Database operations for stock items.
//!
//! ## Key Operations
//! - Register / update / delete (catalog maintenance)
//! - Name search with limit/offset pagination
//!
//! Quantity changes caused by sales never go through here: they are
//! applied as deltas inside the sale transaction (see `sale.rs`).

use atelie_core::{AccountId, Money, StockItem, UnitFinancials};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::Page;
use crate::error::{DbError, DbResult};

/// Fields a caller supplies when registering or editing a stock item.
#[derive(Debug, Clone, PartialEq)]
pub struct StockItemInput {
    pub produto: String,
    pub quantidade: i64,
    pub valor_venda: Money,
    pub financeiro: UnitFinancials,
}

/// Row as stored in `stock_items`.
#[derive(Debug, Clone, FromRow)]
struct StockItemRow {
    id: String,
    owner_id: String,
    produto: String,
    quantidade: i64,
    valor_venda_cents: i64,
    custo_cents: i64,
    salario_cents: i64,
    margem_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StockItemRow> for StockItem {
    fn from(row: StockItemRow) -> Self {
        StockItem {
            id: row.id,
            owner_id: row.owner_id,
            produto: row.produto,
            quantidade: row.quantidade,
            valor_venda: Money::from_cents(row.valor_venda_cents),
            financeiro: UnitFinancials {
                custo: Money::from_cents(row.custo_cents),
                salario: Money::from_cents(row.salario_cents),
                margem: Money::from_cents(row.margem_cents),
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, owner_id, produto, quantidade,
           valor_venda_cents, custo_cents, salario_cents, margem_cents,
           created_at, updated_at
    FROM stock_items
"#;

fn decode(row: SqliteRow) -> DbResult<StockItem> {
    Ok(StockItemRow::from_row(&row)?.into())
}

/// Repository for stock item operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = StockRepository::new(pool);
/// let page = repo.list(&account, "caneca", 20, 0).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Registers a new stock item.
    ///
    /// ## Errors
    /// - `DbError::UniqueViolation` when the owner already has a product
    ///   with the same name (case-insensitive)
    pub async fn register(&self, owner: &AccountId, input: &StockItemInput) -> DbResult<StockItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(owner_id = %owner, produto = %input.produto, "Registering stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, owner_id, produto, quantidade,
                valor_venda_cents, custo_cents, salario_cents, margem_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&id)
        .bind(owner.as_str())
        .bind(&input.produto)
        .bind(input.quantidade)
        .bind(input.valor_venda.cents())
        .bind(input.financeiro.custo.cents())
        .bind(input.financeiro.salario.cents())
        .bind(input.financeiro.margem.cents())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &input.produto))?;

        Ok(StockItem {
            id,
            owner_id: owner.as_str().to_string(),
            produto: input.produto.clone(),
            quantidade: input.quantidade,
            valor_venda: input.valor_venda,
            financeiro: input.financeiro,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrites an item's editable fields (last write wins).
    pub async fn update(
        &self,
        owner: &AccountId,
        id: &str,
        input: &StockItemInput,
    ) -> DbResult<StockItem> {
        debug!(owner_id = %owner, id = %id, "Updating stock item");

        let row = sqlx::query(
            r#"
            UPDATE stock_items SET
                produto = ?3,
                quantidade = ?4,
                valor_venda_cents = ?5,
                custo_cents = ?6,
                salario_cents = ?7,
                margem_cents = ?8,
                updated_at = ?9
            WHERE id = ?1 AND owner_id = ?2
            RETURNING id, owner_id, produto, quantidade,
                      valor_venda_cents, custo_cents, salario_cents, margem_cents,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner.as_str())
        .bind(&input.produto)
        .bind(input.quantidade)
        .bind(input.valor_venda.cents())
        .bind(input.financeiro.custo.cents())
        .bind(input.financeiro.salario.cents())
        .bind(input.financeiro.margem.cents())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &input.produto))?
        .ok_or_else(|| DbError::not_found("StockItem", id))?;

        decode(row)
    }

    /// Deletes an item. Orders sold from it keep their data.
    pub async fn delete(&self, owner: &AccountId, id: &str) -> DbResult<()> {
        debug!(owner_id = %owner, id = %id, "Deleting stock item");

        let result = sqlx::query("DELETE FROM stock_items WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockItem", id));
        }
        Ok(())
    }

    /// Gets an item by ID.
    pub async fn get(&self, owner: &AccountId, id: &str) -> DbResult<Option<StockItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, owner, id).await
    }

    /// Lists items whose name contains `query` (case-insensitive),
    /// ordered by name.
    pub async fn list(
        &self,
        owner: &AccountId,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Page<StockItem>> {
        let query = query.trim();
        debug!(owner_id = %owner, query = %query, limit, offset, "Listing stock items");

        let filter = "WHERE owner_id = ?1 AND (?2 = '' OR instr(lower(produto), lower(?2)) > 0)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM stock_items {}", filter))
            .bind(owner.as_str())
            .bind(query)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "{} {} ORDER BY produto COLLATE NOCASE LIMIT ?3 OFFSET ?4",
            SELECT_COLUMNS, filter
        ))
        .bind(owner.as_str())
        .bind(query)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(decode).collect::<DbResult<Vec<_>>>()?;
        debug!(count = items.len(), total, "Stock list returned items");

        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }
}

/// Loads an owner's item on an existing connection (pool or transaction).
pub(crate) async fn fetch_owned(
    conn: &mut SqliteConnection,
    owner: &AccountId,
    id: &str,
) -> DbResult<Option<StockItem>> {
    let row = sqlx::query(&format!("{} WHERE id = ?1 AND owner_id = ?2", SELECT_COLUMNS))
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(decode).transpose()
}

fn name_conflict(err: sqlx::Error, produto: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("produto", produto),
        other => other,
    }
}

// =============================================================================
// Tests
// =============================================================================
