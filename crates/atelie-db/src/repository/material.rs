//! # Material Repository
//!
//! The owner's raw-material catalog, used by the pricing calculator.

use atelie_core::{AccountId, Material, Money};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Editable material fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInput {
    pub nome: String,
    pub unidade: String,
    pub custo_unitario: Money,
}

#[derive(Debug, Clone, FromRow)]
struct MaterialRow {
    id: String,
    owner_id: String,
    nome: String,
    unidade: String,
    custo_unitario_cents: i64,
    updated_at: DateTime<Utc>,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: row.id,
            owner_id: row.owner_id,
            nome: row.nome,
            unidade: row.unidade,
            custo_unitario: Money::from_cents(row.custo_unitario_cents),
            updated_at: row.updated_at,
        }
    }
}

/// Repository for the material catalog.
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
}

impl MaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaterialRepository { pool }
    }

    pub async fn create(&self, owner: &AccountId, input: &MaterialInput) -> DbResult<Material> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        debug!(owner_id = %owner, nome = %input.nome, "Creating material");

        sqlx::query(
            r#"
            INSERT INTO materials (id, owner_id, nome, unidade, custo_unitario_cents, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(owner.as_str())
        .bind(&input.nome)
        .bind(&input.unidade)
        .bind(input.custo_unitario.cents())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &input.nome))?;

        Ok(Material {
            id,
            owner_id: owner.as_str().to_string(),
            nome: input.nome.clone(),
            unidade: input.unidade.clone(),
            custo_unitario: input.custo_unitario,
            updated_at: now,
        })
    }

    /// Updates a material. Saved pricing records are not touched; they
    /// pick the new cost up as drift when reopened.
    pub async fn update(
        &self,
        owner: &AccountId,
        id: &str,
        input: &MaterialInput,
    ) -> DbResult<Material> {
        debug!(owner_id = %owner, id = %id, "Updating material");

        let row: MaterialRow = sqlx::query_as(
            r#"
            UPDATE materials SET nome = ?3, unidade = ?4, custo_unitario_cents = ?5, updated_at = ?6
            WHERE id = ?1 AND owner_id = ?2
            RETURNING id, owner_id, nome, unidade, custo_unitario_cents, updated_at
            "#,
        )
        .bind(id)
        .bind(owner.as_str())
        .bind(&input.nome)
        .bind(&input.unidade)
        .bind(input.custo_unitario.cents())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &input.nome))?
        .ok_or_else(|| DbError::not_found("Material", id))?;

        Ok(row.into())
    }

    pub async fn delete(&self, owner: &AccountId, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }
        Ok(())
    }

    /// The whole catalog, by name.
    pub async fn list(&self, owner: &AccountId) -> DbResult<Vec<Material>> {
        let rows: Vec<MaterialRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, nome, unidade, custo_unitario_cents, updated_at
            FROM materials
            WHERE owner_id = ?1
            ORDER BY nome COLLATE NOCASE
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Material::from).collect())
    }
}

fn name_conflict(err: sqlx::Error, nome: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("nome", nome),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn argila() -> MaterialInput {
        MaterialInput {
            nome: "Argila".to_string(),
            unidade: "kg".to_string(),
            custo_unitario: Money::from_cents(450),
        }
    }

    #[tokio::test]
    async fn test_material_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = AccountId::new("acc-1").unwrap();
        let repo = db.materials();

        let m = repo.create(&owner, &argila()).await.unwrap();
        let mut edit = argila();
        edit.custo_unitario = Money::from_cents(500);
        let updated = repo.update(&owner, &m.id, &edit).await.unwrap();
        assert_eq!(updated.custo_unitario.cents(), 500);

        assert!(matches!(
            repo.create(&owner, &argila()).await,
            Err(DbError::UniqueViolation { .. })
        ));

        let other = AccountId::new("acc-2").unwrap();
        assert!(repo.list(&other).await.unwrap().is_empty());
        assert!(repo.delete(&other, &m.id).await.is_err());

        repo.delete(&owner, &m.id).await.unwrap();
        assert!(repo.list(&owner).await.unwrap().is_empty());
    }
}
