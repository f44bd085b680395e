//! # Pricing Commands
//!
//! The pricing calculator: live recompute, saving with the zero-value
//! soft block, and re-pricing saved records against the material catalog.
//!
//! ## Re-pricing
//! ```text
//! reprice_pricing { id, confirmed }
//!      │
//!      ├── linked material deleted ───► Blocked(reasons), nothing written
//!      ├── catalog unchanged ─────────► Ok(record), nothing written
//!      ├── drift, !confirmed ─────────► NeedsConfirmation(CostDrift)
//!      └── drift, confirmed ──────────► save refreshed lines + breakdown
//! ```

use atelie_core::money::to_currency_display;
use atelie_core::pricing::{self, CostBreakdown, PricingInputs, PricingOutput};
use atelie_core::validation::validate_product_name;
use atelie_core::{AccountId, Money, Outcome, PricingRecord};
use atelie_db::PricingInput;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::stock::IdArgs;
use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::DbState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecomputeArgs {
    pub inputs: PricingInputs,
}

/// Calculator form being saved. `id` overwrites an existing record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SavePricingArgs {
    pub id: Option<String>,
    pub produto: String,
    pub inputs: PricingInputs,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepriceArgs {
    pub id: String,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingOutputView {
    #[serde(flatten)]
    pub output: PricingOutput,
    pub suggested_price_display: String,
    /// What a quote built from this price must at least charge.
    pub total_costs: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingRecordView {
    #[serde(flatten)]
    pub record: PricingRecord,
    pub preco_sugerido_display: String,
}

impl From<PricingRecord> for PricingRecordView {
    fn from(record: PricingRecord) -> Self {
        PricingRecordView {
            preco_sugerido_display: to_currency_display(Some(record.preco_sugerido)),
            record,
        }
    }
}

fn display(price: Money) -> String {
    to_currency_display(Some(price))
}

/// Recomputes the breakdown on every form edit. Writes nothing.
pub fn recompute_pricing(args: RecomputeArgs) -> Result<Reply, ApiError> {
    let output = pricing::recompute(&args.inputs);
    let view = PricingOutputView {
        suggested_price_display: display(output.suggested_price),
        total_costs: output.breakdown.total_costs(),
        output,
    };
    Reply::done(view, "")
}

pub async fn save_pricing(db: &DbState, owner: &AccountId, args: SavePricingArgs) -> Result<Reply, ApiError> {
    let produto = validate_product_name(&args.produto)?;
    let output = pricing::recompute(&args.inputs);

    if let pending @ Outcome::NeedsConfirmation { .. } = pricing::check_save(&output.breakdown, args.confirmed) {
        debug!(produto = %produto, zeroed = ?output.zeroed_fields, "Pricing save waiting on confirmation");
        return Reply::from_outcome(pending, "");
    }

    let input = PricingInput {
        produto,
        materiais: args.inputs.material_lines,
        mao_de_obra: output.breakdown.labor_cost,
        custos_indiretos: args.inputs.indirect_costs,
        margem_lucro: output.breakdown.profit_margin,
        breakdown: output.breakdown,
    };
    let record = db.inner().pricing().save(owner, args.id.as_deref(), &input).await?;

    info!(owner_id = %owner, id = %record.id, preco = %record.preco_sugerido, "Pricing saved");
    let message = format!("Precificação de {} salva: {}", record.produto, display(record.preco_sugerido));
    Reply::from_outcome(Outcome::ok(PricingRecordView::from(record)), message)
}

pub async fn get_pricing(db: &DbState, owner: &AccountId, args: IdArgs) -> Result<Reply, ApiError> {
    let record = db
        .inner()
        .pricing()
        .get(owner, &args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("PricingRecord", &args.id))?;
    Reply::done(PricingRecordView::from(record), "")
}

pub async fn list_pricing(db: &DbState, owner: &AccountId) -> Result<Reply, ApiError> {
    let records: Vec<PricingRecordView> = db
        .inner()
        .pricing()
        .list(owner)
        .await?
        .into_iter()
        .map(PricingRecordView::from)
        .collect();
    let message = format!("{} precificação(ões)", records.len());
    Reply::done(records, message)
}

pub async fn delete_pricing(db: &DbState, owner: &AccountId, args: IdArgs) -> Result<Reply, ApiError> {
    db.inner().pricing().delete(owner, &args.id).await?;
    Reply::done(serde_json::json!({ "id": args.id }), "Precificação excluída")
}

/// Re-derives a saved record from the current material costs.
pub async fn reprice_pricing(db: &DbState, owner: &AccountId, args: RepriceArgs) -> Result<Reply, ApiError> {
    let database = db.inner();
    let record = database
        .pricing()
        .get(owner, &args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("PricingRecord", &args.id))?;
    let catalog = database.materials().list(owner).await?;

    let repricing = pricing::reprice(&record, &catalog);
    let check = pricing::check_reprice(&repricing, args.confirmed);
    if !check.is_ok() {
        debug!(id = %record.id, missing = ?repricing.missing_materials, "Reprice not applied");
        return Reply::from_outcome(check, "");
    }
    let drift = match repricing.drift {
        None => {
            let message = format!("Custos de {} sem alteração", record.produto);
            return Reply::from_outcome(Outcome::ok(PricingRecordView::from(record)), message);
        }
        Some(drift) => drift,
    };

    let current: CostBreakdown = repricing.current;
    let input = PricingInput {
        produto: record.produto.clone(),
        materiais: repricing.materiais,
        mao_de_obra: record.mao_de_obra,
        custos_indiretos: record.custos_indiretos,
        margem_lucro: record.margem_lucro,
        breakdown: current,
    };
    let updated = database.pricing().save(owner, Some(&record.id), &input).await?;

    info!(
        owner_id = %owner,
        id = %updated.id,
        old_price = %drift.old_price,
        new_price = %drift.new_price,
        "Pricing repriced"
    );
    let message = format!(
        "{} repreçado: {} → {}",
        updated.produto,
        display(drift.old_price),
        display(drift.new_price)
    );
    Reply::from_outcome(Outcome::ok(PricingRecordView::from(updated)), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use atelie_core::{MaterialLine, RawAmount};
    use atelie_db::{Database, DbConfig, MaterialInput};

    async fn setup() -> (DbState, AccountId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), AccountId::new("acc-1").unwrap())
    }

    fn inputs(material_id: Option<String>) -> PricingInputs {
        PricingInputs {
            labor_cost: Some(RawAmount::from("30,00")),
            profit_margin: Some(RawAmount::from("10,00")),
            material_lines: vec![MaterialLine {
                material_id,
                descricao: "Fita".to_string(),
                quantidade_milli: 2000,
                custo_unitario: Money::from_cents(1000),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_recompute_is_pure_and_displays_price() {
        let reply = recompute_pricing(RecomputeArgs { inputs: inputs(None) }).unwrap();
        assert_eq!(reply.data["suggested_price"], 6000);
        assert_eq!(reply.data["suggested_price_display"], "R$ 60,00");
        assert_eq!(reply.data["breakdown"]["materials_cost"], 2000);
        assert_eq!(reply.data["total_costs"], 2000);
    }

    #[tokio::test]
    async fn test_zero_fields_need_confirmation() {
        let (db, owner) = setup().await;
        let mut args = SavePricingArgs {
            produto: "Laço".to_string(),
            inputs: PricingInputs {
                labor_cost: Some(RawAmount::from("30,00")),
                ..Default::default()
            },
            ..Default::default()
        };

        let reply = save_pricing(&db, &owner, args.clone()).await.unwrap();
        assert!(reply.attention);
        assert_eq!(reply.data["confirmation"]["kind"], "zero_cost_fields");
        assert!(db.inner().pricing().list(&owner).await.unwrap().is_empty());

        args.confirmed = true;
        let reply = save_pricing(&db, &owner, args).await.unwrap();
        assert_eq!(reply.data["status"], "ok");
        assert_eq!(reply.data["value"]["preco_sugerido"], 3000);
    }

    #[tokio::test]
    async fn test_blank_product_rejected() {
        let (db, owner) = setup().await;
        let err = save_pricing(
            &db,
            &owner,
            SavePricingArgs {
                produto: "   ".to_string(),
                inputs: inputs(None),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_reprice_reports_drift_then_saves() {
        let (db, owner) = setup().await;
        let materials = db.inner().materials();
        let fita = materials
            .create(
                &owner,
                &MaterialInput {
                    nome: "Fita".to_string(),
                    unidade: "m".to_string(),
                    custo_unitario: Money::from_cents(1000),
                },
            )
            .await
            .unwrap();

        let saved = save_pricing(
            &db,
            &owner,
            SavePricingArgs {
                produto: "Laço".to_string(),
                inputs: inputs(Some(fita.id.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = saved.data["value"]["id"].as_str().unwrap().to_string();

        let unchanged = reprice_pricing(&db, &owner, RepriceArgs { id: id.clone(), confirmed: false })
            .await
            .unwrap();
        assert_eq!(unchanged.data["status"], "ok");

        materials
            .update(
                &owner,
                &fita.id,
                &MaterialInput {
                    nome: "Fita".to_string(),
                    unidade: "m".to_string(),
                    custo_unitario: Money::from_cents(1500),
                },
            )
            .await
            .unwrap();

        let pending = reprice_pricing(&db, &owner, RepriceArgs { id: id.clone(), confirmed: false })
            .await
            .unwrap();
        assert!(pending.attention);
        assert_eq!(pending.data["confirmation"]["drift"]["delta"], 1000);
        let stored = db.inner().pricing().get(&owner, &id).await.unwrap().unwrap();
        assert_eq!(stored.preco_sugerido.cents(), 6000);

        let done = reprice_pricing(&db, &owner, RepriceArgs { id, confirmed: true })
            .await
            .unwrap();
        assert_eq!(done.data["value"]["preco_sugerido"], 7000);
        assert_eq!(done.data["value"]["materiais"][0]["custo_unitario"], 1500);
    }

    #[tokio::test]
    async fn test_reprice_blocked_when_material_deleted() {
        let (db, owner) = setup().await;
        let materials = db.inner().materials();
        let fita = materials
            .create(
                &owner,
                &MaterialInput {
                    nome: "Fita".to_string(),
                    unidade: "m".to_string(),
                    custo_unitario: Money::from_cents(1000),
                },
            )
            .await
            .unwrap();
        let saved = save_pricing(
            &db,
            &owner,
            SavePricingArgs {
                produto: "Laço".to_string(),
                inputs: inputs(Some(fita.id.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = saved.data["value"]["id"].as_str().unwrap().to_string();

        materials.delete(&owner, &fita.id).await.unwrap();

        let reply = reprice_pricing(&db, &owner, RepriceArgs { id: id.clone(), confirmed: true })
            .await
            .unwrap();
        assert!(reply.attention);
        assert_eq!(reply.data["status"], "blocked");
        assert!(reply.message.contains("Fita"));
        let stored = db.inner().pricing().get(&owner, &id).await.unwrap().unwrap();
        assert_eq!(stored.materiais[0].material_id.as_deref(), Some(fita.id.as_str()));
    }

    #[tokio::test]
    async fn test_get_other_account_not_found() {
        let (db, owner) = setup().await;
        let saved = save_pricing(
            &db,
            &owner,
            SavePricingArgs {
                produto: "Laço".to_string(),
                inputs: inputs(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = saved.data["value"]["id"].as_str().unwrap().to_string();

        let other = AccountId::new("acc-2").unwrap();
        let err = get_pricing(&db, &other, IdArgs { id: id.clone() }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        delete_pricing(&db, &owner, IdArgs { id }).await.unwrap();
        let reply = list_pricing(&db, &owner).await.unwrap();
        assert_eq!(reply.data, serde_json::json!([]));
    }
}
