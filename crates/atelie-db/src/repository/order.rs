//! # Order Repository
//!
//! Database operations for quotes (orçamentos) and orders (pedidos).
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → numbered in the same transaction as the insert      │
//! │                                                                         │
//! │  2. CONVERT (quotes only, one transaction)                             │
//! │     ├── quote: aberto → convertido                                     │
//! │     ├── next pedido number                                             │
//! │     └── insert pedido { origem: quote, quote_id }                      │
//! │                                                                         │
//! │  3. EDIT                                                               │
//! │     ├── update_financials() → projected by the caller                  │
//! │     └── update_status()     → guarded by the current status            │
//! │                                                                         │
//! │  4. DELETE                                                             │
//! │     └── delete() → the number is never handed out again                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Projection and confirmation happen before these methods are called;
//! the repository only persists what it is given.

use atelie_core::numbering::OrderNumber;
use atelie_core::projection::FinancialSnapshot;
use atelie_core::{
    AccountId, CoreError, Money, OrderFinancials, OrderItem, OrderKind, OrderRecord, OrderSource,
    ProductionStatus,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::numbering::next_order_number;
use super::Page;
use crate::error::{DbError, DbResult};

// =============================================================================
// Inputs
// =============================================================================

/// Everything needed to insert a quote or order. The repository adds
/// the id, number, initial status and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub tipo: OrderKind,
    pub cliente: String,
    pub produtos: Vec<OrderItem>,
    pub base: FinancialSnapshot,
    pub financeiro: OrderFinancials,
    pub origem: OrderSource,
    pub quote_id: Option<String>,
    pub stock_item_id: Option<String>,
    pub data_entrega: Option<NaiveDate>,
    pub below_cost_acknowledged: bool,
}

/// List filter. Empty `search` matches every customer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub tipo: Option<OrderKind>,
    pub status: Option<ProductionStatus>,
    pub search: String,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: String,
    owner_id: String,
    numero_seq: i64,
    numero_year: i64,
    tipo: OrderKind,
    cliente: String,
    status: ProductionStatus,
    origem: OrderSource,
    quote_id: Option<String>,
    stock_item_id: Option<String>,
    data_entrega: Option<NaiveDate>,
    below_cost_acknowledged: bool,
    base_custos_cents: i64,
    base_mao_de_obra_cents: i64,
    base_margem_cents: i64,
    base_caixa_cents: i64,
    total_cents: i64,
    entrada_cents: i64,
    restante_cents: i64,
    desconto_cents: i64,
    custos_totais_cents: i64,
    mao_de_obra_cents: i64,
    margem_cents: i64,
    caixa_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct OrderItemRow {
    descricao: String,
    quantidade: i64,
    valor_unit_cents: i64,
    valor_total_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            descricao: row.descricao,
            quantidade: row.quantidade,
            valor_unit: Money::from_cents(row.valor_unit_cents),
            valor_total: Money::from_cents(row.valor_total_cents),
        }
    }
}

impl OrderRow {
    fn numero(&self) -> DbResult<OrderNumber> {
        let out_of_range = || {
            DbError::Internal(format!(
                "order {} has numero {}/{} out of range",
                self.id, self.numero_seq, self.numero_year
            ))
        };
        let seq = u32::try_from(self.numero_seq).map_err(|_| out_of_range())?;
        let year = i32::try_from(self.numero_year).map_err(|_| out_of_range())?;
        Ok(OrderNumber::new(seq, year))
    }

    fn into_record(self, produtos: Vec<OrderItem>) -> DbResult<OrderRecord> {
        let numero = self.numero()?;
        Ok(OrderRecord {
            id: self.id,
            owner_id: self.owner_id,
            numero,
            tipo: self.tipo,
            cliente: self.cliente,
            produtos,
            base: FinancialSnapshot {
                custos_totais: Money::from_cents(self.base_custos_cents),
                custo_mao_de_obra: Money::from_cents(self.base_mao_de_obra_cents),
                margem_lucro: Money::from_cents(self.base_margem_cents),
                caixa_empresa: Money::from_cents(self.base_caixa_cents),
            },
            financeiro: OrderFinancials {
                total: Money::from_cents(self.total_cents),
                entrada: Money::from_cents(self.entrada_cents),
                restante: Money::from_cents(self.restante_cents),
                desconto: Money::from_cents(self.desconto_cents),
                custos_totais: Money::from_cents(self.custos_totais_cents),
                custo_mao_de_obra: Money::from_cents(self.mao_de_obra_cents),
                margem_lucro: Money::from_cents(self.margem_cents),
                caixa_empresa: Money::from_cents(self.caixa_cents),
            },
            status: self.status,
            origem: self.origem,
            quote_id: self.quote_id,
            stock_item_id: self.stock_item_id,
            data_entrega: self.data_entrega,
            below_cost_acknowledged: self.below_cost_acknowledged,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, owner_id, numero_seq, numero_year, tipo, cliente, status, origem,
           quote_id, stock_item_id, data_entrega, below_cost_acknowledged,
           base_custos_cents, base_mao_de_obra_cents, base_margem_cents, base_caixa_cents,
           total_cents, entrada_cents, restante_cents, desconto_cents,
           custos_totais_cents, mao_de_obra_cents, margem_cents, caixa_cents,
           created_at, updated_at
    FROM orders
"#;

// =============================================================================
// Connection-level helpers (shared with the sale transaction)
// =============================================================================

async fn load_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
        r#"
        SELECT descricao, quantidade, valor_unit_cents, valor_total_cents
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

async fn hydrate(conn: &mut SqliteConnection, row: SqliteRow) -> DbResult<OrderRecord> {
    let row = OrderRow::from_row(&row)?;
    let produtos = load_items(conn, &row.id).await?;
    row.into_record(produtos)
}

/// Loads an owner's order on an existing connection.
pub(crate) async fn fetch_owned(
    conn: &mut SqliteConnection,
    owner: &AccountId,
    id: &str,
) -> DbResult<Option<OrderRecord>> {
    let row = sqlx::query(&format!("{} WHERE id = ?1 AND owner_id = ?2", SELECT_COLUMNS))
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(hydrate(conn, row).await?)),
        None => Ok(None),
    }
}

/// Numbers and inserts an order on the caller's transaction.
pub(crate) async fn insert_numbered(
    conn: &mut SqliteConnection,
    owner: &AccountId,
    new: NewOrder,
) -> DbResult<OrderRecord> {
    let now = Utc::now();
    let numero = next_order_number(conn, owner, new.tipo, now.year()).await?;

    let record = OrderRecord {
        id: Uuid::new_v4().to_string(),
        owner_id: owner.as_str().to_string(),
        numero,
        tipo: new.tipo,
        cliente: new.cliente,
        produtos: new.produtos,
        base: new.base,
        financeiro: new.financeiro,
        status: ProductionStatus::initial(new.tipo),
        origem: new.origem,
        quote_id: new.quote_id,
        stock_item_id: new.stock_item_id,
        data_entrega: new.data_entrega,
        below_cost_acknowledged: new.below_cost_acknowledged,
        created_at: now,
        updated_at: now,
    };

    insert_record(conn, &record).await?;
    Ok(record)
}

async fn insert_record(conn: &mut SqliteConnection, record: &OrderRecord) -> DbResult<()> {
    debug!(id = %record.id, numero = %record.numero, tipo = %record.tipo, "Inserting order");

    let f = &record.financeiro;
    let b = &record.base;

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, owner_id, numero_seq, numero_year, tipo, cliente, status, origem,
            quote_id, stock_item_id, data_entrega, below_cost_acknowledged,
            base_custos_cents, base_mao_de_obra_cents, base_margem_cents, base_caixa_cents,
            total_cents, entrada_cents, restante_cents, desconto_cents,
            custos_totais_cents, mao_de_obra_cents, margem_cents, caixa_cents,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20,
            ?21, ?22, ?23, ?24,
            ?25, ?26
        )
        "#,
    )
    .bind(&record.id)
    .bind(&record.owner_id)
    .bind(i64::from(record.numero.seq))
    .bind(record.numero.year)
    .bind(record.tipo)
    .bind(&record.cliente)
    .bind(record.status)
    .bind(record.origem)
    .bind(&record.quote_id)
    .bind(&record.stock_item_id)
    .bind(record.data_entrega)
    .bind(record.below_cost_acknowledged)
    .bind(b.custos_totais.cents())
    .bind(b.custo_mao_de_obra.cents())
    .bind(b.margem_lucro.cents())
    .bind(b.caixa_empresa.cents())
    .bind(f.total.cents())
    .bind(f.entrada.cents())
    .bind(f.restante.cents())
    .bind(f.desconto.cents())
    .bind(f.custos_totais.cents())
    .bind(f.custo_mao_de_obra.cents())
    .bind(f.margem_lucro.cents())
    .bind(f.caixa_empresa.cents())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in record.produtos.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, position, descricao, quantidade, valor_unit_cents, valor_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(position as i64)
        .bind(&item.descricao)
        .bind(item.quantidade)
        .bind(item.valor_unit.cents())
        .bind(item.valor_total.cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for quotes and orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates a quote or a manual order with the next number of its scope.
    pub async fn create(&self, owner: &AccountId, new: NewOrder) -> DbResult<OrderRecord> {
        let mut tx = self.pool.begin().await?;

        let record = insert_numbered(&mut tx, owner, new)
            .await
            .map_err(DbError::in_transaction)?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(owner_id = %owner, order_id = %record.id, numero = %record.numero, tipo = %record.tipo, "Order created");
        Ok(record)
    }

    /// Converts an open quote into a numbered pedido.
    ///
    /// ## Transaction Steps
    /// 1. Mark the quote `convertido` (only if still `aberto`)
    /// 2. Reserve the next pedido number
    /// 3. Insert the pedido with `origem = quote` and `quote_id`
    ///
    /// Any failure rolls back all three.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the quote does not exist for `owner`
    /// - `DbError::Rejected(WrongOrderKind)` if `quote_id` is a pedido
    /// - `DbError::Rejected(InvalidStatusTransition)` if it is not open
    pub async fn convert_quote(
        &self,
        owner: &AccountId,
        quote_id: &str,
        pedido: NewOrder,
    ) -> DbResult<OrderRecord> {
        let mut tx = self.pool.begin().await?;

        let result = convert_in_transaction(&mut tx, owner, quote_id, pedido)
            .await
            .map_err(DbError::in_transaction)?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            owner_id = %owner,
            quote_id = %quote_id,
            order_id = %result.id,
            numero = %result.numero,
            "Quote converted"
        );
        Ok(result)
    }

    /// Replaces the stored financial breakdown of an order or quote.
    pub async fn update_financials(
        &self,
        owner: &AccountId,
        id: &str,
        base: &FinancialSnapshot,
        financeiro: &OrderFinancials,
        below_cost_acknowledged: bool,
    ) -> DbResult<OrderRecord> {
        debug!(owner_id = %owner, id = %id, total = %financeiro.total, "Updating order financials");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                base_custos_cents = ?3,
                base_mao_de_obra_cents = ?4,
                base_margem_cents = ?5,
                base_caixa_cents = ?6,
                total_cents = ?7,
                entrada_cents = ?8,
                restante_cents = ?9,
                desconto_cents = ?10,
                custos_totais_cents = ?11,
                mao_de_obra_cents = ?12,
                margem_cents = ?13,
                caixa_cents = ?14,
                below_cost_acknowledged = ?15,
                updated_at = ?16
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner.as_str())
        .bind(base.custos_totais.cents())
        .bind(base.custo_mao_de_obra.cents())
        .bind(base.margem_lucro.cents())
        .bind(base.caixa_empresa.cents())
        .bind(financeiro.total.cents())
        .bind(financeiro.entrada.cents())
        .bind(financeiro.restante.cents())
        .bind(financeiro.desconto.cents())
        .bind(financeiro.custos_totais.cents())
        .bind(financeiro.custo_mao_de_obra.cents())
        .bind(financeiro.margem_lucro.cents())
        .bind(financeiro.caixa_empresa.cents())
        .bind(below_cost_acknowledged)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get(owner, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Moves an order from `from` to `to`.
    ///
    /// The update only applies if the stored status is still `from`, so
    /// two concurrent edits cannot both succeed.
    pub async fn update_status(
        &self,
        owner: &AccountId,
        id: &str,
        from: ProductionStatus,
        to: ProductionStatus,
    ) -> DbResult<OrderRecord> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?4, updated_at = ?5 WHERE id = ?1 AND owner_id = ?2 AND status = ?3",
        )
        .bind(id)
        .bind(owner.as_str())
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self
                .get(owner, id)
                .await?
                .ok_or_else(|| DbError::not_found("Order", id))?;
            return Err(CoreError::InvalidStatusTransition {
                order_id: id.to_string(),
                from: current.status.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        info!(owner_id = %owner, order_id = %id, from = %from, to = %to, "Order status changed");

        self.get(owner, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Deletes an order and its items. Its number is not reused.
    pub async fn delete(&self, owner: &AccountId, id: &str) -> DbResult<()> {
        debug!(owner_id = %owner, id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }
        Ok(())
    }

    /// Gets an order or quote by ID.
    pub async fn get(&self, owner: &AccountId, id: &str) -> DbResult<Option<OrderRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, owner, id).await
    }

    /// Lists orders, newest first.
    pub async fn list(&self, owner: &AccountId, filter: &OrderFilter) -> DbResult<Page<OrderRecord>> {
        let search = filter.search.trim();
        debug!(owner_id = %owner, search = %search, limit = filter.limit, offset = filter.offset, "Listing orders");

        let clause = r#"
            WHERE owner_id = ?1
              AND (?2 IS NULL OR tipo = ?2)
              AND (?3 IS NULL OR status = ?3)
              AND (?4 = '' OR instr(lower(cliente), lower(?4)) > 0)
        "#;

        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {}", clause))
            .bind(owner.as_str())
            .bind(filter.tipo)
            .bind(filter.status)
            .bind(search)
            .fetch_one(&mut *conn)
            .await?;

        let rows = sqlx::query(&format!(
            "{} {} ORDER BY created_at DESC, numero_seq DESC LIMIT ?5 OFFSET ?6",
            SELECT_COLUMNS, clause
        ))
        .bind(owner.as_str())
        .bind(filter.tipo)
        .bind(filter.status)
        .bind(search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&mut *conn)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(hydrate(&mut conn, row).await?);
        }

        Ok(Page {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }
}

async fn convert_in_transaction(
    conn: &mut SqliteConnection,
    owner: &AccountId,
    quote_id: &str,
    pedido: NewOrder,
) -> DbResult<OrderRecord> {
    let marked = sqlx::query(
        r#"
        UPDATE orders SET status = ?3, updated_at = ?4
        WHERE id = ?1 AND owner_id = ?2 AND tipo = ?5 AND status = ?6
        "#,
    )
    .bind(quote_id)
    .bind(owner.as_str())
    .bind(ProductionStatus::Convertido)
    .bind(Utc::now())
    .bind(OrderKind::Orcamento)
    .bind(ProductionStatus::Aberto)
    .execute(&mut *conn)
    .await?;

    if marked.rows_affected() == 0 {
        let quote = fetch_owned(conn, owner, quote_id)
            .await?
            .ok_or_else(|| DbError::not_found("Quote", quote_id))?;
        return Err(conversion_rejected(&quote).into());
    }

    let new = NewOrder {
        tipo: OrderKind::Pedido,
        origem: OrderSource::Quote,
        quote_id: Some(quote_id.to_string()),
        ..pedido
    };
    insert_numbered(conn, owner, new).await
}

fn conversion_rejected(quote: &OrderRecord) -> CoreError {
    if quote.tipo != OrderKind::Orcamento {
        CoreError::WrongOrderKind {
            order_id: quote.id.clone(),
            expected: OrderKind::Orcamento.to_string(),
            actual: quote.tipo.to_string(),
        }
    } else {
        CoreError::InvalidStatusTransition {
            order_id: quote.id.clone(),
            from: quote.status.to_string(),
            to: ProductionStatus::Convertido.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn new_order(tipo: OrderKind, cliente: &str) -> NewOrder {
        let item = OrderItem::new("Vaso", 2, Money::from_cents(8500));
        let base = FinancialSnapshot {
            custos_totais: Money::from_cents(4000),
            custo_mao_de_obra: Money::from_cents(8000),
            margem_lucro: Money::from_cents(5000),
            caixa_empresa: Money::zero(),
        };
        NewOrder {
            tipo,
            cliente: cliente.to_string(),
            produtos: vec![item],
            base,
            financeiro: OrderFinancials {
                total: base.gross(),
                entrada: Money::zero(),
                restante: base.gross(),
                desconto: Money::zero(),
                custos_totais: base.custos_totais,
                custo_mao_de_obra: base.custo_mao_de_obra,
                margem_lucro: base.margem_lucro,
                caixa_empresa: base.caixa_empresa,
            },
            origem: OrderSource::Manual,
            quote_id: None,
            stock_item_id: None,
            data_entrega: NaiveDate::from_ymd_opt(2024, 12, 20),
            below_cost_acknowledged: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");

        let created = db
            .orders()
            .create(&owner, new_order(OrderKind::Pedido, "Ana"))
            .await
            .unwrap();
        assert_eq!(created.numero.seq, 1);
        assert_eq!(created.status, ProductionStatus::Pendente);

        let loaded = db.orders().get(&owner, &created.id).await.unwrap().unwrap();
        assert_eq!(loaded.produtos, created.produtos);
        assert_eq!(loaded.financeiro, created.financeiro);
        assert_eq!(loaded.base, created.base);
        assert_eq!(loaded.data_entrega, created.data_entrega);
        assert_eq!(loaded.numero, created.numero);
    }

    #[tokio::test]
    async fn test_out_of_range_numero_is_internal_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let created = db
            .orders()
            .create(&owner, new_order(OrderKind::Pedido, "Ana"))
            .await
            .unwrap();

        sqlx::query("UPDATE orders SET numero_seq = ?1 WHERE id = ?2")
            .bind(i64::from(u32::MAX) + 1)
            .bind(&created.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.orders().get(&owner, &created.id).await.unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));
    }

    #[tokio::test]
    async fn test_numbering_never_reuses_after_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();

        let mut issued = Vec::new();
        for _ in 0..3 {
            issued.push(repo.create(&owner, new_order(OrderKind::Pedido, "Ana")).await.unwrap());
        }
        let seqs: Vec<u32> = issued.iter().map(|o| o.numero.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);

        repo.delete(&owner, &issued[2].id).await.unwrap();
        let next = repo.create(&owner, new_order(OrderKind::Pedido, "Bia")).await.unwrap();
        assert_eq!(next.numero.seq, 4);
    }

    #[tokio::test]
    async fn test_convert_quote() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();

        // A pedido first, so the converted one is 0002
        repo.create(&owner, new_order(OrderKind::Pedido, "Ana")).await.unwrap();
        let quote = repo.create(&owner, new_order(OrderKind::Orcamento, "Caio")).await.unwrap();
        assert_eq!(quote.status, ProductionStatus::Aberto);
        assert_eq!(quote.numero.seq, 1);

        let pedido = repo
            .convert_quote(&owner, &quote.id, new_order(OrderKind::Orcamento, "Caio"))
            .await
            .unwrap();
        assert_eq!(pedido.tipo, OrderKind::Pedido);
        assert_eq!(pedido.origem, OrderSource::Quote);
        assert_eq!(pedido.quote_id.as_deref(), Some(quote.id.as_str()));
        assert_eq!(pedido.numero.seq, 2);
        assert_eq!(pedido.status, ProductionStatus::Pendente);

        let quote = repo.get(&owner, &quote.id).await.unwrap().unwrap();
        assert_eq!(quote.status, ProductionStatus::Convertido);

        // Second conversion is rejected
        let err = repo
            .convert_quote(&owner, &quote.id, new_order(OrderKind::Orcamento, "Caio"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_convert_rejects_pedido_and_other_owner() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();

        let pedido = repo.create(&owner, new_order(OrderKind::Pedido, "Ana")).await.unwrap();
        let err = repo
            .convert_quote(&owner, &pedido.id, new_order(OrderKind::Orcamento, "Ana"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::WrongOrderKind { .. })));

        let quote = repo.create(&owner, new_order(OrderKind::Orcamento, "Ana")).await.unwrap();
        let err = repo
            .convert_quote(&account("acc-2"), &quote.id, new_order(OrderKind::Orcamento, "Ana"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_conversion_leaves_quote_open() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();
        let quote = repo.create(&owner, new_order(OrderKind::Orcamento, "Ana")).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER fail_pedido BEFORE INSERT ON orders WHEN NEW.tipo = 'pedido' \
             BEGIN SELECT RAISE(ABORT, 'offline'); END;",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo
            .convert_quote(&owner, &quote.id, new_order(OrderKind::Orcamento, "Ana"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));

        let quote = repo.get(&owner, &quote.id).await.unwrap().unwrap();
        assert_eq!(quote.status, ProductionStatus::Aberto);
    }

    #[tokio::test]
    async fn test_update_status_guards_current_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();
        let order = repo.create(&owner, new_order(OrderKind::Pedido, "Ana")).await.unwrap();

        let moved = repo
            .update_status(&owner, &order.id, ProductionStatus::Pendente, ProductionStatus::EmProducao)
            .await
            .unwrap();
        assert_eq!(moved.status, ProductionStatus::EmProducao);

        // Stale "from"
        let err = repo
            .update_status(&owner, &order.id, ProductionStatus::Pendente, ProductionStatus::Pronto)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_financials() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();
        let order = repo.create(&owner, new_order(OrderKind::Pedido, "Ana")).await.unwrap();

        let mut financeiro = order.financeiro;
        financeiro.desconto = Money::from_cents(10000);
        financeiro.total = Money::from_cents(7000);
        financeiro.restante = Money::from_cents(7000);
        financeiro.margem_lucro = Money::zero();
        financeiro.custo_mao_de_obra = Money::from_cents(3000);

        let updated = repo
            .update_financials(&owner, &order.id, &order.base, &financeiro, false)
            .await
            .unwrap();
        assert_eq!(updated.financeiro, financeiro);
        assert_eq!(updated.base, order.base);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = account("acc-1");
        let repo = db.orders();

        repo.create(&owner, new_order(OrderKind::Pedido, "Ana Souza")).await.unwrap();
        repo.create(&owner, new_order(OrderKind::Pedido, "Bruno")).await.unwrap();
        repo.create(&owner, new_order(OrderKind::Orcamento, "Ana Lima")).await.unwrap();
        repo.create(&account("acc-2"), new_order(OrderKind::Pedido, "Ana")).await.unwrap();

        let all = repo
            .list(&owner, &OrderFilter { limit: 20, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.total, 3);

        let pedidos = repo
            .list(
                &owner,
                &OrderFilter {
                    tipo: Some(OrderKind::Pedido),
                    limit: 20,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(pedidos.total, 2);

        let ana = repo
            .list(
                &owner,
                &OrderFilter {
                    search: "ana".to_string(),
                    limit: 20,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ana.total, 2);
        assert!(ana.items.iter().all(|o| o.produtos.len() == 1));
    }
}
