//! # Order Number Counters
//!
//! Issues the next `NNNN/YYYY` number for an (owner, kind, year) scope.
//! Always called on a transaction's connection so the counter bump and
//! the order insert commit or roll back together.

use atelie_core::numbering::{next_sequence, OrderNumber};
use atelie_core::{AccountId, OrderKind};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

fn to_seq(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

/// Reserves the next order number in the caller's transaction.
pub(crate) async fn next_order_number(
    conn: &mut SqliteConnection,
    owner: &AccountId,
    kind: OrderKind,
    year: i32,
) -> DbResult<OrderNumber> {
    let counter: Option<i64> = sqlx::query_scalar(
        "SELECT last_seq FROM order_counters WHERE owner_id = ?1 AND tipo = ?2 AND year = ?3",
    )
    .bind(owner.as_str())
    .bind(kind)
    .bind(year)
    .fetch_optional(&mut *conn)
    .await?;

    let max_existing: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(numero_seq) FROM orders WHERE owner_id = ?1 AND tipo = ?2 AND numero_year = ?3",
    )
    .bind(owner.as_str())
    .bind(kind)
    .bind(year)
    .fetch_one(&mut *conn)
    .await?;

    let seq = next_sequence(to_seq(counter), to_seq(max_existing));

    sqlx::query(
        r#"
        INSERT INTO order_counters (owner_id, tipo, year, last_seq)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (owner_id, tipo, year) DO UPDATE SET last_seq = excluded.last_seq
        "#,
    )
    .bind(owner.as_str())
    .bind(kind)
    .bind(year)
    .bind(i64::from(seq))
    .execute(&mut *conn)
    .await?;

    let numero = OrderNumber::new(seq, year);
    debug!(owner_id = %owner, kind = %kind, numero = %numero, "Reserved order number");
    Ok(numero)
}
