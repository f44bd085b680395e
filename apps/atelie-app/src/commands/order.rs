//! # Order Commands
//!
//! Quotes (orcamentos) and orders (pedidos): creation, conversion,
//! financial edits and production status.
//!
//! ## Financial Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Financial Save                                 │
//! │                                                                         │
//! │  create_order / create_quote / convert_quote / update_order_financials  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FinancialSnapshot::for_price(lines total, custos, salario, margem)     │
//! │       ├── custos + salario + margem > lines ► VALIDATION_ERROR          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  project_order(snapshot, desconto, entrada, confirmed)                  │
//! │       │                                                                 │
//! │       ├── entrada > total ──────► VALIDATION_ERROR                      │
//! │       ├── D > margem + salario, !confirmed ► NeedsConfirmation          │
//! │       │                                      (nothing saved)            │
//! │       ▼                                                                 │
//! │  OrderRepository write ──► OrderLedger::upsert ──► Outcome::Ok          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelie_core::format::display_naive_date;
use atelie_core::money::{to_currency_display, to_money};
use atelie_core::projection::{discount_shortfall, project_order, FinancialSnapshot};
use atelie_core::validation::{
    validate_client_name, validate_page_size, validate_quantity, validate_search_query,
    validate_uuid,
};
use atelie_core::{
    AccountId, CoreError, Money, OrderFinancials, OrderItem, OrderKind, OrderRecord, OrderSource,
    Outcome, ProductionStatus, RawAmount, ValidationError,
};
use atelie_db::{NewOrder, OrderFilter, Page};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::stock::IdArgs;
use crate::error::ApiError;
use crate::notifier::Reply;
use crate::state::{ConfigState, DbState, OrderLedger};

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemArgs {
    pub descricao: String,
    pub quantidade: i64,
    #[serde(default)]
    pub valor_unit: Option<RawAmount>,
}

/// Manual quote or order form.
///
/// The product lines set the price. `caixa_empresa` is whatever that
/// price leaves after cost, salary and margin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderArgs {
    pub cliente: String,
    pub produtos: Vec<OrderItemArgs>,
    pub custos_totais: Option<RawAmount>,
    pub custo_mao_de_obra: Option<RawAmount>,
    pub margem_lucro: Option<RawAmount>,
    pub desconto: Option<RawAmount>,
    pub entrada: Option<RawAmount>,
    /// `YYYY-MM-DD`
    pub data_entrega: Option<String>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConvertQuoteArgs {
    pub quote_id: String,
    /// Defaults to the quote's discount.
    pub desconto: Option<RawAmount>,
    /// Defaults to the quote's deposit.
    pub entrada: Option<RawAmount>,
    pub data_entrega: Option<String>,
    pub confirmed: bool,
}

/// Financial edit. Absent fields keep their stored value; company cash
/// is re-derived from the product lines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateFinancialsArgs {
    pub id: String,
    pub custos_totais: Option<RawAmount>,
    pub custo_mao_de_obra: Option<RawAmount>,
    pub margem_lucro: Option<RawAmount>,
    pub desconto: Option<RawAmount>,
    pub entrada: Option<RawAmount>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusArgs {
    pub id: String,
    pub status: ProductionStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListOrdersArgs {
    pub tipo: Option<OrderKind>,
    pub status: Option<ProductionStatus>,
    pub search: String,
    pub limit: Option<i64>,
    pub offset: i64,
}

// =============================================================================
// Views
// =============================================================================

/// Order as sent to the front-end, with display strings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub numero_display: String,
    pub total_display: String,
    pub restante_display: String,
    pub data_entrega_display: String,
    pub below_cost: bool,
}

impl From<OrderRecord> for OrderView {
    fn from(order: OrderRecord) -> Self {
        OrderView {
            numero_display: order.numero.to_string(),
            total_display: to_currency_display(Some(order.financeiro.total)),
            restante_display: to_currency_display(Some(order.financeiro.restante)),
            data_entrega_display: display_naive_date(order.data_entrega),
            below_cost: order.below_cost_acknowledged,
            order,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_delivery_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
            ApiError::from(ValidationError::InvalidFormat {
                field: "data_entrega".to_string(),
                reason: format!("expected YYYY-MM-DD, got '{}'", s),
            })
        }),
    }
}

fn build_items(produtos: Vec<OrderItemArgs>) -> Result<Vec<OrderItem>, ApiError> {
    produtos
        .into_iter()
        .map(|p| {
            let descricao = p.descricao.trim().to_string();
            if descricao.is_empty() {
                return Err(ApiError::from(ValidationError::Required {
                    field: "descricao".to_string(),
                }));
            }
            validate_quantity(p.quantidade)?;
            Ok(OrderItem::new(descricao, p.quantidade, to_money(p.valor_unit.as_ref())))
        })
        .collect()
}

/// `raw` if the field was sent, otherwise the stored value.
fn amount_or(raw: Option<&RawAmount>, current: Money) -> Money {
    match raw {
        Some(raw) => to_money(Some(raw)),
        None => current,
    }
}

fn lines_total(produtos: &[OrderItem]) -> Money {
    produtos.iter().map(|p| p.valor_total).sum()
}

/// Financials cleared to be written.
struct Projected {
    financeiro: OrderFinancials,
    /// The discount ran past salary and the user confirmed anyway.
    below_cost: bool,
}

/// Runs the projection and its below-cost gate.
fn gate(
    base: &FinancialSnapshot,
    desconto: Money,
    entrada: Money,
    confirmed: bool,
) -> Result<Outcome<Projected>, ApiError> {
    let shortfall = discount_shortfall(base, desconto.floor_zero());
    let outcome = project_order(base, desconto, entrada, confirmed)?;
    if let Outcome::Ok { value } = &outcome {
        if shortfall.is_positive() {
            warn!(total = %value.total, shortfall = %shortfall, "Saving below cost after confirmation");
        }
    }
    Ok(outcome.map(|financeiro| Projected {
        financeiro,
        below_cost: shortfall.is_positive(),
    }))
}

fn saved(order: OrderRecord, message: String) -> Result<Reply, ApiError> {
    Reply::from_outcome(Outcome::ok(OrderView::from(order)), message)
}

fn pending(outcome: Outcome<Projected>) -> Result<Reply, ApiError> {
    Reply::from_outcome(outcome.map(|_| ()), "")
}

// =============================================================================
// Commands
// =============================================================================

async fn create(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    tipo: OrderKind,
    args: OrderArgs,
) -> Result<Reply, ApiError> {
    let cliente = validate_client_name(&args.cliente)?;
    let produtos = build_items(args.produtos)?;
    let data_entrega = parse_delivery_date(args.data_entrega.as_deref())?;

    let base = FinancialSnapshot::for_price(
        lines_total(&produtos),
        to_money(args.custos_totais.as_ref()),
        to_money(args.custo_mao_de_obra.as_ref()),
        to_money(args.margem_lucro.as_ref()),
    )?;

    let outcome = gate(
        &base,
        to_money(args.desconto.as_ref()),
        to_money(args.entrada.as_ref()),
        args.confirmed,
    )?;
    let projected = match outcome {
        Outcome::Ok { value } => value,
        other => return pending(other),
    };

    let order = db
        .inner()
        .orders()
        .create(
            owner,
            NewOrder {
                tipo,
                cliente,
                produtos,
                base,
                below_cost_acknowledged: projected.below_cost,
                financeiro: projected.financeiro,
                origem: OrderSource::Manual,
                quote_id: None,
                stock_item_id: None,
                data_entrega,
            },
        )
        .await?;

    ledger.upsert(order.clone());
    let label = match tipo {
        OrderKind::Orcamento => "Orçamento",
        OrderKind::Pedido => "Pedido",
    };
    let message = format!("{} {} criado", label, order.numero);
    saved(order, message)
}

/// Creates a manual pedido.
pub async fn create_order(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: OrderArgs,
) -> Result<Reply, ApiError> {
    create(db, ledger, owner, OrderKind::Pedido, args).await
}

pub async fn create_quote(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: OrderArgs,
) -> Result<Reply, ApiError> {
    create(db, ledger, owner, OrderKind::Orcamento, args).await
}

/// Converts an open quote into a pedido, re-projecting its financials.
pub async fn convert_quote(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: ConvertQuoteArgs,
) -> Result<Reply, ApiError> {
    validate_uuid(&args.quote_id)?;
    let orders = db.inner().orders();
    let quote = orders
        .get(owner, &args.quote_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &args.quote_id))?;

    if quote.tipo != OrderKind::Orcamento {
        return Err(CoreError::WrongOrderKind {
            order_id: quote.id,
            expected: OrderKind::Orcamento.to_string(),
            actual: quote.tipo.to_string(),
        }
        .into());
    }

    let data_entrega = match parse_delivery_date(args.data_entrega.as_deref())? {
        Some(date) => Some(date),
        None => quote.data_entrega,
    };

    let outcome = gate(
        &quote.base,
        amount_or(args.desconto.as_ref(), quote.financeiro.desconto),
        amount_or(args.entrada.as_ref(), quote.financeiro.entrada),
        args.confirmed,
    )?;
    let projected = match outcome {
        Outcome::Ok { value } => value,
        other => return pending(other),
    };

    let pedido = orders
        .convert_quote(
            owner,
            &quote.id,
            NewOrder {
                tipo: OrderKind::Pedido,
                cliente: quote.cliente.clone(),
                produtos: quote.produtos.clone(),
                base: quote.base,
                below_cost_acknowledged: projected.below_cost,
                financeiro: projected.financeiro,
                origem: OrderSource::Quote,
                quote_id: Some(quote.id.clone()),
                stock_item_id: None,
                data_entrega,
            },
        )
        .await?;

    if let Some(converted) = orders.get(owner, &quote.id).await? {
        ledger.upsert(converted);
    }
    ledger.upsert(pedido.clone());

    let message = format!("Orçamento {} convertido no pedido {}", quote.numero, pedido.numero);
    saved(pedido, message)
}

/// Re-applies discount and deposit to an existing quote or order.
pub async fn update_order_financials(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: UpdateFinancialsArgs,
) -> Result<Reply, ApiError> {
    let orders = db.inner().orders();
    let order = orders
        .get(owner, &args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &args.id))?;

    let base = FinancialSnapshot::for_price(
        lines_total(&order.produtos),
        amount_or(args.custos_totais.as_ref(), order.base.custos_totais),
        amount_or(args.custo_mao_de_obra.as_ref(), order.base.custo_mao_de_obra),
        amount_or(args.margem_lucro.as_ref(), order.base.margem_lucro),
    )?;

    let outcome = gate(
        &base,
        amount_or(args.desconto.as_ref(), order.financeiro.desconto),
        amount_or(args.entrada.as_ref(), order.financeiro.entrada),
        args.confirmed,
    )?;
    let projected = match outcome {
        Outcome::Ok { value } => value,
        other => return pending(other),
    };

    let updated = orders
        .update_financials(owner, &order.id, &base, &projected.financeiro, projected.below_cost)
        .await?;
    ledger.upsert(updated.clone());

    let message = format!("Valores de {} atualizados", updated.numero);
    saved(updated, message)
}

/// Moves a quote or order along its status pipeline.
pub async fn update_order_status(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: UpdateStatusArgs,
) -> Result<Reply, ApiError> {
    let orders = db.inner().orders();
    let order = orders
        .get(owner, &args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &args.id))?;

    if !order.status.can_transition_to(order.tipo, args.status) {
        return Err(CoreError::InvalidStatusTransition {
            order_id: order.id,
            from: order.status.to_string(),
            to: args.status.to_string(),
        }
        .into());
    }

    let updated = orders
        .update_status(owner, &order.id, order.status, args.status)
        .await?;
    ledger.upsert(updated.clone());

    let message = format!("{} agora está {}", updated.numero, updated.status);
    Reply::done(OrderView::from(updated), message)
}

pub async fn delete_order(
    db: &DbState,
    ledger: &OrderLedger,
    owner: &AccountId,
    args: IdArgs,
) -> Result<Reply, ApiError> {
    db.inner().orders().delete(owner, &args.id).await?;
    ledger.remove(&args.id);
    Reply::done(serde_json::json!({ "id": args.id }), "Registro excluído")
}

pub async fn get_order(db: &DbState, owner: &AccountId, args: IdArgs) -> Result<Reply, ApiError> {
    let order = db
        .inner()
        .orders()
        .get(owner, &args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &args.id))?;
    Reply::done(OrderView::from(order), "")
}

/// Lists orders and loads the page into the ledger.
pub async fn list_orders(
    db: &DbState,
    ledger: &OrderLedger,
    config: &ConfigState,
    owner: &AccountId,
    args: ListOrdersArgs,
) -> Result<Reply, ApiError> {
    let search = validate_search_query(&args.search)?;
    let limit = args.limit.unwrap_or(config.page_size);
    validate_page_size(limit)?;
    debug!(search = %search, limit, offset = args.offset, "list_orders command");

    let filter = OrderFilter {
        tipo: args.tipo,
        status: args.status,
        search,
        limit,
        offset: args.offset.max(0),
    };
    let page = db.inner().orders().list(owner, &filter).await?;
    ledger.replace(page.items.clone());

    let page: Page<OrderView> = page.map(OrderView::from);
    let message = format!("{} registro(s)", page.total);
    Reply::done(page, message)
}

/// Orders currently held in memory.
pub fn get_ledger(ledger: &OrderLedger) -> Result<Reply, ApiError> {
    let orders: Vec<OrderView> = ledger.snapshot().into_iter().map(OrderView::from).collect();
    Reply::done(orders, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use atelie_db::{Database, DbConfig};
    use serde_json::Value;

    async fn setup() -> (DbState, OrderLedger, AccountId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), OrderLedger::new(), AccountId::new("acc-1").unwrap())
    }

    /// Price R$170: custos 40, salario 80, margem 50, no company cash.
    fn vaso(desconto: &str, confirmed: bool) -> OrderArgs {
        OrderArgs {
            cliente: "Ana".to_string(),
            produtos: vec![OrderItemArgs {
                descricao: "Vaso".to_string(),
                quantidade: 1,
                valor_unit: Some(RawAmount::from("170,00")),
            }],
            custos_totais: Some(RawAmount::from("40,00")),
            custo_mao_de_obra: Some(RawAmount::from("80,00")),
            margem_lucro: Some(RawAmount::from("50,00")),
            desconto: Some(RawAmount::from(desconto)),
            data_entrega: Some("2024-03-15".to_string()),
            confirmed,
            ..Default::default()
        }
    }

    fn value(reply: &Reply) -> &Value {
        &reply.data["value"]
    }

    #[tokio::test]
    async fn test_discount_spills_into_salary() {
        let (db, ledger, owner) = setup().await;
        let reply = create_order(&db, &ledger, &owner, vaso("100,00", false)).await.unwrap();

        assert!(!reply.attention);
        let order = value(&reply);
        assert_eq!(order["financeiro"]["total"], 7000);
        assert_eq!(order["financeiro"]["margem_lucro"], 0);
        assert_eq!(order["financeiro"]["custo_mao_de_obra"], 3000);
        assert_eq!(order["data_entrega_display"], "15/03/2024");
        assert_eq!(order["status"], "pendente");
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_below_cost_needs_confirmation_and_saves_nothing() {
        let (db, ledger, owner) = setup().await;

        let reply = create_order(&db, &ledger, &owner, vaso("150,00", false)).await.unwrap();
        assert!(reply.attention);
        assert_eq!(reply.data["status"], "needs_confirmation");
        assert_eq!(reply.data["confirmation"]["shortfall"], 2000);
        assert!(ledger.is_empty());

        let page = db.inner().orders().list(&owner, &OrderFilter { limit: 10, ..Default::default() }).await.unwrap();
        assert_eq!(page.total, 0);

        let reply = create_order(&db, &ledger, &owner, vaso("150,00", true)).await.unwrap();
        assert_eq!(reply.data["status"], "ok");
        let order = value(&reply);
        assert_eq!(order["below_cost_acknowledged"], true);
        assert_eq!(order["below_cost"], true);
        assert_eq!(order["financeiro"]["total"], 4000);
        assert_eq!(order["financeiro"]["desconto"], 13000);
    }

    #[tokio::test]
    async fn test_components_above_lines_rejected() {
        let (db, ledger, owner) = setup().await;
        let mut args = vaso("0", false);
        args.produtos[0].valor_unit = Some(RawAmount::from("100,00"));

        let err = create_order(&db, &ledger, &owner, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(ledger.is_empty());
        let page = db.inner().orders().list(&owner, &OrderFilter { limit: 10, ..Default::default() }).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_company_cash_is_line_remainder_and_gate_still_fires() {
        let (db, ledger, owner) = setup().await;
        let mut args = vaso("150,00", false);
        args.produtos[0].valor_unit = Some(RawAmount::from("195,00"));

        let reply = create_order(&db, &ledger, &owner, args.clone()).await.unwrap();
        assert_eq!(reply.data["status"], "needs_confirmation");
        assert_eq!(reply.data["confirmation"]["shortfall"], 2000);

        args.confirmed = true;
        let reply = create_order(&db, &ledger, &owner, args).await.unwrap();
        let f = &value(&reply)["financeiro"];
        assert_eq!(f["caixa_empresa"], 2500);
        assert_eq!(f["total"], 6500);
        let sum = ["custos_totais", "custo_mao_de_obra", "margem_lucro", "caixa_empresa"]
            .iter()
            .map(|k| f[*k].as_i64().unwrap())
            .sum::<i64>();
        assert_eq!(sum, 6500);
    }

    #[tokio::test]
    async fn test_boundary_discount_has_no_warning() {
        let (db, ledger, owner) = setup().await;
        let reply = create_order(&db, &ledger, &owner, vaso("130,00", false)).await.unwrap();
        assert_eq!(reply.data["status"], "ok");
        assert_eq!(value(&reply)["financeiro"]["total"], 4000);
    }

    #[tokio::test]
    async fn test_deposit_over_total_rejected() {
        let (db, ledger, owner) = setup().await;
        let mut args = vaso("0", false);
        args.entrada = Some(RawAmount::from("200,00"));
        let err = create_order(&db, &ledger, &owner, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_bad_delivery_date_rejected() {
        let (db, ledger, owner) = setup().await;
        let mut args = vaso("0", false);
        args.data_entrega = Some("15/03/2024".to_string());
        let err = create_order(&db, &ledger, &owner, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_convert_quote_keeps_discount_and_marks_quote() {
        let (db, ledger, owner) = setup().await;
        let quote = create_quote(&db, &ledger, &owner, vaso("30,00", false)).await.unwrap();
        let quote_id = value(&quote)["id"].as_str().unwrap().to_string();
        assert_eq!(value(&quote)["status"], "aberto");

        let reply = convert_quote(
            &db,
            &ledger,
            &owner,
            ConvertQuoteArgs {
                quote_id: quote_id.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let pedido = value(&reply);
        assert_eq!(pedido["tipo"], "pedido");
        assert_eq!(pedido["origem"], "quote");
        assert_eq!(pedido["financeiro"]["total"], 14000);
        assert_eq!(pedido["quote_id"], quote_id.as_str());

        let stored = db.inner().orders().get(&owner, &quote_id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProductionStatus::Convertido);
        assert_eq!(ledger.len(), 2);

        let err = convert_quote(
            &db,
            &ledger,
            &owner,
            ConvertQuoteArgs {
                quote_id,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_update_financials_reapplies_discount_to_base() {
        let (db, ledger, owner) = setup().await;
        let created = create_order(&db, &ledger, &owner, vaso("30,00", false)).await.unwrap();
        let id = value(&created)["id"].as_str().unwrap().to_string();

        let reply = update_order_financials(
            &db,
            &ledger,
            &owner,
            UpdateFinancialsArgs {
                id: id.clone(),
                desconto: Some(RawAmount::from("0")),
                entrada: Some(RawAmount::from("50,00")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let order = value(&reply);
        assert_eq!(order["financeiro"]["total"], 17000);
        assert_eq!(order["financeiro"]["margem_lucro"], 5000);
        assert_eq!(order["financeiro"]["restante"], 12000);
    }

    #[tokio::test]
    async fn test_update_financials_cannot_outgrow_lines() {
        let (db, ledger, owner) = setup().await;
        let created = create_order(&db, &ledger, &owner, vaso("0", false)).await.unwrap();
        let id = value(&created)["id"].as_str().unwrap().to_string();

        let err = update_order_financials(
            &db,
            &ledger,
            &owner,
            UpdateFinancialsArgs {
                id: id.clone(),
                margem_lucro: Some(RawAmount::from("90,00")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let reply = update_order_financials(
            &db,
            &ledger,
            &owner,
            UpdateFinancialsArgs {
                id,
                margem_lucro: Some(RawAmount::from("20,00")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let f = &value(&reply)["financeiro"];
        assert_eq!(f["caixa_empresa"], 3000);
        assert_eq!(f["total"], 17000);
    }

    #[tokio::test]
    async fn test_status_pipeline() {
        let (db, ledger, owner) = setup().await;
        let created = create_order(&db, &ledger, &owner, vaso("0", false)).await.unwrap();
        let id = value(&created)["id"].as_str().unwrap().to_string();

        let reply = update_order_status(
            &db,
            &ledger,
            &owner,
            UpdateStatusArgs {
                id: id.clone(),
                status: ProductionStatus::Pronto,
            },
        )
        .await
        .unwrap();
        assert_eq!(reply.data["status"], "pronto");

        let err = update_order_status(
            &db,
            &ledger,
            &owner,
            UpdateStatusArgs {
                id,
                status: ProductionStatus::Pendente,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_list_loads_ledger_and_delete_removes() {
        let (db, ledger, owner) = setup().await;
        create_order(&db, &ledger, &owner, vaso("0", false)).await.unwrap();
        create_quote(&db, &ledger, &owner, vaso("0", false)).await.unwrap();

        let fresh = OrderLedger::new();
        let reply = list_orders(
            &db,
            &fresh,
            &ConfigState::default(),
            &owner,
            ListOrdersArgs {
                tipo: Some(OrderKind::Pedido),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(reply.data["total"], 1);
        assert_eq!(fresh.len(), 1);

        let id = fresh.snapshot()[0].id.clone();
        delete_order(&db, &fresh, &owner, IdArgs { id }).await.unwrap();
        assert!(fresh.is_empty());
        assert_eq!(get_ledger(&fresh).unwrap().data, serde_json::json!([]));
    }
}
