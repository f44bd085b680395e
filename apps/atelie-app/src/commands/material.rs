//! # Material Commands
//!
//! Catalog of raw materials priced by the calculator.

use atelie_core::money::{to_currency_display, to_money};
use atelie_core::validation::validate_material_name;
use atelie_core::{AccountId, Material, RawAmount};
use atelie_db::MaterialInput;
use serde::{Deserialize, Serialize};

use super::stock::IdArgs;
use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::DbState;

fn default_unit() -> String {
    "un".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialArgs {
    pub nome: String,
    #[serde(default = "default_unit")]
    pub unidade: String,
    #[serde(default)]
    pub custo_unitario: Option<RawAmount>,
}

impl MaterialArgs {
    fn into_input(self) -> Result<MaterialInput, ApiError> {
        let unidade = match self.unidade.trim() {
            "" => default_unit(),
            unit => unit.to_string(),
        };
        Ok(MaterialInput {
            nome: validate_material_name(&self.nome)?,
            unidade,
            custo_unitario: to_money(self.custo_unitario.as_ref()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMaterialArgs {
    pub id: String,
    pub material: MaterialArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialView {
    #[serde(flatten)]
    pub material: Material,
    pub custo_unitario_display: String,
}

impl From<Material> for MaterialView {
    fn from(material: Material) -> Self {
        MaterialView {
            custo_unitario_display: to_currency_display(Some(material.custo_unitario)),
            material,
        }
    }
}

pub async fn create_material(db: &DbState, owner: &AccountId, args: MaterialArgs) -> Result<Reply, ApiError> {
    let input = args.into_input()?;
    let material = db.inner().materials().create(owner, &input).await?;
    let message = format!("Material {} cadastrado", material.nome);
    Reply::done(MaterialView::from(material), message)
}

/// Changing a cost here does not touch saved pricing records; they pick
/// it up on the next `reprice_pricing`.
pub async fn update_material(
    db: &DbState,
    owner: &AccountId,
    args: UpdateMaterialArgs,
) -> Result<Reply, ApiError> {
    let input = args.material.into_input()?;
    let material = db.inner().materials().update(owner, &args.id, &input).await?;
    Reply::done(MaterialView::from(material), "Material atualizado")
}

pub async fn delete_material(db: &DbState, owner: &AccountId, args: IdArgs) -> Result<Reply, ApiError> {
    db.inner().materials().delete(owner, &args.id).await?;
    Reply::done(serde_json::json!({ "id": args.id }), "Material excluído")
}

pub async fn list_materials(db: &DbState, owner: &AccountId) -> Result<Reply, ApiError> {
    let materials: Vec<MaterialView> = db
        .inner()
        .materials()
        .list(owner)
        .await?
        .into_iter()
        .map(MaterialView::from)
        .collect();
    let message = format!("{} material(is)", materials.len());
    Reply::done(materials, message)
}
