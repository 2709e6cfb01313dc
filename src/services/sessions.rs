//! Session lifecycle: building pre-joined production contexts, computing
//! the plan, and the start transition that freezes it.
//!
//! Starting a session is the explicit state-machine step that enforces the
//! one-active-session invariant: any currently active session is
//! deactivated and the target activated in the same transaction that
//! persists both snapshot halves and decrements pulled stock. A failure
//! anywhere rolls everything back, leaving the session not started.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        blank, blank_variant,
        inventory_transaction::{self, Entity as InventoryTransaction, TransactionReason},
        line_item,
        order::{self, Entity as Order},
        print, product, product_variant,
        session::{self, Entity as Session, SessionStatus},
        session_order::{self, Entity as SessionOrder},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    production::{
        allocation::{resolve_allocation, HeldItem, UnaccountedItem},
        picking::{aggregate, build_requirements, PickLists},
        sequencing::sequence,
        snapshot::{
            serialize_assembly_plan, serialize_picking_requirements, AssemblyLineEntry,
            PickingRequirementRecord,
        },
        ExpectedFulfillment, Pretreat, PrintSpec, ProductionItem,
    },
    services::inventory::{apply_adjustment, unwrap_transaction_error, AdjustmentContext, InventoryTarget},
};

/// Everything computed for a session at plan time. The `entries` and
/// `requirements` halves are what gets frozen; the rest feeds documents
/// and operator displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPlan {
    pub entries: Vec<AssemblyLineEntry>,
    pub requirements: Vec<PickingRequirementRecord>,
    pub pick_lists: PickLists,
    pub held_items: Vec<HeldItem>,
    pub unaccounted_items: Vec<UnaccountedItem>,
}

/// Runs the pure planning pipeline over pre-joined items.
pub fn compute_plan(items: &[ProductionItem]) -> SessionPlan {
    let outcome = resolve_allocation(items);
    let entries = sequence(items, &outcome);
    let requirements = build_requirements(items, &outcome);
    let pick_lists = aggregate(items, &outcome);

    SessionPlan {
        entries,
        requirements,
        pick_lists,
        held_items: outcome.held_items,
        unaccounted_items: outcome.unaccounted_items,
    }
}

#[derive(Clone)]
pub struct SessionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SessionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a session over a set of orders, in the not-started state.
    #[instrument(skip(self, order_ids))]
    pub async fn create_session(
        &self,
        name: String,
        order_ids: Vec<Uuid>,
    ) -> Result<session::Model, ServiceError> {
        if order_ids.is_empty() {
            return Err(ServiceError::InvalidInput(
                "a session needs at least one order".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();

        let created = db
            .transaction::<_, session::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let session_id = Uuid::new_v4();
                    let created = session::ActiveModel {
                        id: Set(session_id),
                        name: Set(name),
                        status: Set(SessionStatus::NotStarted.as_str().to_string()),
                        active: Set(false),
                        assembly_plan: Set(None),
                        picking_requirements: Set(None),
                        started_at: Set(None),
                        settled_at: Set(None),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    for order_id in order_ids {
                        session_order::ActiveModel {
                            session_id: Set(session_id),
                            order_id: Set(order_id),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    }

                    Ok(created)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(session_id = %created.id, "session created");
        Ok(created)
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<session::Model, ServiceError> {
        Session::find_by_id(session_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("session {} not found", session_id)))
    }

    pub async fn list_sessions(&self) -> Result<Vec<session::Model>, ServiceError> {
        Session::find()
            .order_by_desc(session::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Computes a plan from current data without freezing anything. Used by
    /// document generation to preview pick lists and the assembly order.
    #[instrument(skip(self))]
    pub async fn plan_preview(&self, session_id: Uuid) -> Result<SessionPlan, ServiceError> {
        let db = self.db_pool.as_ref();
        self.get_session(session_id).await?;
        let items = load_production_items(db, session_id).await?;
        Ok(compute_plan(&items))
    }

    /// Starts (or restarts) a session: recomputes the plan from
    /// then-current stock and holds, freezes both snapshot halves, pulls
    /// stock through the ledger, and flips the one-active-session state,
    /// all atomically. A restart first returns the session's outstanding
    /// stock pulls to the shelf, so the resolver allocates against real
    /// availability and settlement only sums the latest pull.
    #[instrument(skip(self))]
    pub async fn start_session(&self, session_id: Uuid) -> Result<SessionPlan, ServiceError> {
        let db = self.db_pool.as_ref();

        let plan = db
            .transaction::<_, SessionPlan, ServiceError>(move |txn| {
                Box::pin(async move {
                    let target = Session::find_by_id(session_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("session {} not found", session_id))
                        })?;

                    if SessionStatus::from_str(&target.status) == Some(SessionStatus::Settled) {
                        return Err(ServiceError::InvalidOperation(format!(
                            "session {} is already settled",
                            session_id
                        )));
                    }

                    // Deactivate whichever session is currently active.
                    Session::update_many()
                        .col_expr(session::Column::Active, Expr::value(false))
                        .col_expr(
                            session::Column::Status,
                            Expr::value(SessionStatus::NotStarted.as_str()),
                        )
                        .filter(session::Column::Active.eq(true))
                        .filter(session::Column::Id.ne(session_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    release_prior_stock_pulls(txn, session_id).await?;

                    let items = load_production_items(txn, session_id).await?;
                    let plan = compute_plan(&items);

                    let assembly_json = serialize_assembly_plan(&plan.entries)?;
                    let requirements_json =
                        serialize_picking_requirements(&plan.requirements)?;

                    // Pull premade stock for every stock-classified portion.
                    for requirement in &plan.requirements {
                        if requirement.expected_fulfillment != ExpectedFulfillment::Stock {
                            continue;
                        }
                        let Some(variant_id) = requirement.product_variant_id else {
                            continue;
                        };
                        apply_adjustment(
                            txn,
                            InventoryTarget::ProductVariant(variant_id),
                            -requirement.quantity,
                            TransactionReason::StockAllocation,
                            AdjustmentContext {
                                session_id: Some(session_id),
                                line_item_id: Some(requirement.line_item_id),
                                audit_log_id: None,
                            },
                        )
                        .await?;
                    }

                    let mut active: session::ActiveModel = target.into();
                    active.status = Set(SessionStatus::Active.as_str().to_string());
                    active.active = Set(true);
                    active.assembly_plan = Set(Some(assembly_json));
                    active.picking_requirements = Set(Some(requirements_json));
                    active.started_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(plan)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        self.event_sender
            .send(Event::SessionStarted {
                session_id,
                entry_count: plan.entries.len(),
                started_at: Utc::now(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(%session_id, entries = plan.entries.len(), "session started and plan frozen");
        Ok(plan)
    }

    /// Marks a session settled after a human has reviewed the settlement
    /// report. The engine never settles on its own.
    #[instrument(skip(self))]
    pub async fn confirm_settlement(
        &self,
        session_id: Uuid,
    ) -> Result<session::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let settled = db
            .transaction::<_, session::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let target = Session::find_by_id(session_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("session {} not found", session_id))
                        })?;

                    if target.assembly_plan.is_none() || target.picking_requirements.is_none() {
                        return Err(ServiceError::InvalidOperation(format!(
                            "session {} has no frozen plan to settle",
                            session_id
                        )));
                    }
                    if SessionStatus::from_str(&target.status) != Some(SessionStatus::Active) {
                        return Err(ServiceError::InvalidOperation(format!(
                            "session {} is not active (status {})",
                            session_id, target.status
                        )));
                    }

                    let mut active: session::ActiveModel = target.into();
                    active.status = Set(SessionStatus::Settled.as_str().to_string());
                    active.active = Set(false);
                    active.settled_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        self.event_sender
            .send(Event::SessionSettled {
                session_id,
                settled_at: settled.settled_at.unwrap_or_else(Utc::now),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(settled)
    }
}

/// Restocks whatever an earlier start of this session pulled and never
/// returned. Nets the session's stock-allocation and restock rows per
/// (product variant, line item) and inserts a compensating restock row for
/// each negative balance, so the ledger for the session always sums to the
/// latest generation of pulls.
async fn release_prior_stock_pulls<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
) -> Result<(), ServiceError> {
    let rows = InventoryTransaction::find()
        .filter(inventory_transaction::Column::SessionId.eq(session_id))
        .filter(inventory_transaction::Column::Reason.is_in([
            TransactionReason::StockAllocation.as_str(),
            TransactionReason::Restock.as_str(),
        ]))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut outstanding: HashMap<(Uuid, Option<Uuid>), i32> = HashMap::new();
    for row in rows {
        let Some(variant_id) = row.product_variant_id else {
            continue;
        };
        *outstanding
            .entry((variant_id, row.line_item_id))
            .or_insert(0) += row.change_amount;
    }

    for ((variant_id, line_item_id), net) in outstanding {
        if net >= 0 {
            continue;
        }
        apply_adjustment(
            conn,
            InventoryTarget::ProductVariant(variant_id),
            -net,
            TransactionReason::Restock,
            AdjustmentContext {
                session_id: Some(session_id),
                line_item_id,
                audit_log_id: None,
            },
        )
        .await?;
    }

    Ok(())
}

/// Loads the pre-joined production contexts for a session's eligible
/// orders: cancelled and terminal orders are skipped entirely, held orders
/// stay in (the resolver reports them separately). Line items come back in
/// order-creation then line-item-id order so stock contention resolves the
/// same way on every run.
pub async fn load_production_items<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
) -> Result<Vec<ProductionItem>, ServiceError> {
    let order_ids: Vec<Uuid> = SessionOrder::find()
        .filter(session_order::Column::SessionId.eq(session_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|link| link.order_id)
        .collect();

    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let orders: Vec<order::Model> = Order::find()
        .filter(order::Column::Id.is_in(order_ids))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .filter(|o| o.is_eligible_for_production())
        .collect();

    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let eligible_order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let orders_by_id: HashMap<Uuid, order::Model> =
        orders.into_iter().map(|o| (o.id, o)).collect();

    let line_items = line_item::Entity::find()
        .filter(line_item::Column::OrderId.is_in(eligible_order_ids.clone()))
        .order_by_asc(line_item::Column::CreatedAt)
        .order_by_asc(line_item::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut order_item_counts: HashMap<Uuid, usize> = HashMap::new();
    for item in &line_items {
        *order_item_counts.entry(item.order_id).or_insert(0) += 1;
    }

    let variant_ids: Vec<Uuid> = line_items
        .iter()
        .filter_map(|i| i.product_variant_id)
        .collect();

    let product_variants: HashMap<Uuid, product_variant::Model> = product_variant::Entity::find()
        .filter(product_variant::Column::Id.is_in(variant_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let product_ids: Vec<Uuid> = product_variants.values().map(|v| v.product_id).collect();
    let products: HashMap<Uuid, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids.clone()))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let blank_variant_ids: Vec<Uuid> = product_variants
        .values()
        .filter_map(|v| v.blank_variant_id)
        .collect();
    let blank_variants: HashMap<Uuid, blank_variant::Model> = blank_variant::Entity::find()
        .filter(blank_variant::Column::Id.is_in(blank_variant_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let blank_ids: Vec<Uuid> = blank_variants.values().map(|v| v.blank_id).collect();
    let blanks: HashMap<Uuid, blank::Model> = blank::Entity::find()
        .filter(blank::Column::Id.is_in(blank_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    let mut prints_by_product: HashMap<Uuid, Vec<PrintSpec>> = HashMap::new();
    for row in print::Entity::find()
        .filter(print::Column::ProductId.is_in(product_ids))
        .order_by_asc(print::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
    {
        prints_by_product
            .entry(row.product_id)
            .or_default()
            .push(PrintSpec {
                location: row.location,
                pretreat: row.pretreat.as_deref().and_then(Pretreat::from_str),
                heat_transfer: row.heat_transfer,
                small_format: row.small_format,
            });
    }

    let mut items = Vec::with_capacity(line_items.len());
    for line_item in line_items {
        let Some(order) = orders_by_id.get(&line_item.order_id).cloned() else {
            continue;
        };
        let product_variant = line_item
            .product_variant_id
            .and_then(|id| product_variants.get(&id).cloned());
        let product = product_variant
            .as_ref()
            .and_then(|v| products.get(&v.product_id).cloned());
        let blank_variant = product_variant
            .as_ref()
            .and_then(|v| v.blank_variant_id)
            .and_then(|id| blank_variants.get(&id).cloned());
        let blank = blank_variant
            .as_ref()
            .and_then(|v| blanks.get(&v.blank_id).cloned());
        let prints = product
            .as_ref()
            .and_then(|p| prints_by_product.get(&p.id).cloned())
            .unwrap_or_default();
        let order_item_count = order_item_counts
            .get(&line_item.order_id)
            .copied()
            .unwrap_or(1);

        items.push(ProductionItem {
            line_item,
            order,
            order_item_count,
            product,
            product_variant,
            blank,
            blank_variant,
            prints,
        });
    }

    Ok(items)
}
