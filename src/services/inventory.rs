//! Inventory ledger: the only code allowed to mutate on-hand quantities.
//!
//! Every change goes through `adjust`, an atomic read-modify-write-insert:
//! the SKU's stored quantity and the appended transaction row commit
//! together or not at all, so concurrent adjustments can never lose an
//! update or break the `previous_quantity` chain.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        audit_log, blank_variant,
        inventory_transaction::{self, Entity as InventoryTransaction, TransactionReason},
        line_item::{self, CompletionStatus, Entity as LineItem},
        product_variant, session,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    production::{snapshot::parse_picking_requirements, ExpectedFulfillment},
};

/// The SKU a ledger adjustment applies to: exactly one of a blank variant
/// or a finished-product variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryTarget {
    BlankVariant(Uuid),
    ProductVariant(Uuid),
}

/// Optional traceability linkage carried on the transaction row.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustmentContext {
    pub session_id: Option<Uuid>,
    pub line_item_id: Option<Uuid>,
    pub audit_log_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct InventoryLedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryLedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Atomically adjusts the target SKU and appends the ledger row.
    /// A missing target is a hard error with nothing written.
    #[instrument(skip(self))]
    pub async fn adjust(
        &self,
        target: InventoryTarget,
        delta: i32,
        reason: TransactionReason,
        context: AdjustmentContext,
    ) -> Result<inventory_transaction::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let transaction = db
            .transaction::<_, inventory_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move { apply_adjustment(txn, target, delta, reason, context).await })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        self.event_sender
            .send(Event::InventoryAdjusted {
                transaction_id: transaction.id,
                blank_variant_id: transaction.blank_variant_id,
                product_variant_id: transaction.product_variant_id,
                change_amount: transaction.change_amount,
                new_quantity: transaction.new_quantity,
                reason: transaction.reason.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(transaction)
    }

    /// Records a completed print on the floor: consumes blanks for the
    /// print-classified quantity frozen in the session plan and marks the
    /// item printed. A split item only burns blanks for the portion not
    /// covered by premade stock.
    #[instrument(skip(self))]
    pub async fn record_print(
        &self,
        session_id: Uuid,
        line_item_id: Uuid,
    ) -> Result<inventory_transaction::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let transaction = db
            .transaction::<_, inventory_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let (item, blank_variant_id) = printable_line_item(txn, line_item_id).await?;
                    let print_quantity =
                        frozen_print_quantity(txn, session_id, line_item_id).await?;

                    let context = AdjustmentContext {
                        session_id: Some(session_id),
                        line_item_id: Some(line_item_id),
                        audit_log_id: None,
                    };
                    let transaction = apply_adjustment(
                        txn,
                        InventoryTarget::BlankVariant(blank_variant_id),
                        -print_quantity,
                        TransactionReason::AssemblyUsage,
                        context,
                    )
                    .await?;

                    let mut active: line_item::ActiveModel = item.into();
                    active.completion_status =
                        Set(CompletionStatus::Printed.as_str().to_string());
                    active.remaining_quantity = Set(0);
                    active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(transaction)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(%session_id, %line_item_id, "recorded print");
        Ok(transaction)
    }

    /// Records a spoiled print: an extra compensating blank decrement that
    /// settlement discounts. Completion status is untouched; the reprint is
    /// recorded separately.
    #[instrument(skip(self))]
    pub async fn record_misprint(
        &self,
        session_id: Uuid,
        line_item_id: Uuid,
        units: i32,
    ) -> Result<inventory_transaction::Model, ServiceError> {
        if units < 1 {
            return Err(ServiceError::InvalidInput(
                "misprint units must be at least 1".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();

        let transaction = db
            .transaction::<_, inventory_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let (item, blank_variant_id) = printable_line_item(txn, line_item_id).await?;

                    let log = audit_log::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        action: Set("misprint_recorded".to_string()),
                        detail: Set(Some(format!(
                            "{} unit(s) of '{}' spoiled on the press",
                            units, item.name
                        ))),
                        session_id: Set(Some(session_id)),
                        line_item_id: Set(Some(line_item_id)),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let context = AdjustmentContext {
                        session_id: Some(session_id),
                        line_item_id: Some(line_item_id),
                        audit_log_id: Some(log.id),
                    };
                    apply_adjustment(
                        txn,
                        InventoryTarget::BlankVariant(blank_variant_id),
                        -units,
                        TransactionReason::Misprint,
                        context,
                    )
                    .await
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        if let Some(blank_variant_id) = transaction.blank_variant_id {
            self.event_sender
                .send(Event::MisprintRecorded {
                    session_id,
                    line_item_id,
                    blank_variant_id,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(transaction)
    }

    /// All ledger rows tagged with a session, oldest first.
    pub async fn transactions_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<inventory_transaction::Model>, ServiceError> {
        use sea_orm::QueryOrder;

        InventoryTransaction::find()
            .filter(inventory_transaction::Column::SessionId.eq(session_id))
            .order_by_asc(inventory_transaction::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

/// The read-modify-write-insert core, callable inside a larger transaction
/// (session start wraps many of these in one commit).
pub async fn apply_adjustment<C: ConnectionTrait>(
    conn: &C,
    target: InventoryTarget,
    delta: i32,
    reason: TransactionReason,
    context: AdjustmentContext,
) -> Result<inventory_transaction::Model, ServiceError> {
    let (previous_quantity, blank_variant_id, product_variant_id) = match target {
        InventoryTarget::BlankVariant(id) => {
            let variant = blank_variant::Entity::find_by_id(id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::NotFound(format!("blank variant {} not found", id)))?;

            let previous = variant.quantity;
            let mut active: blank_variant::ActiveModel = variant.into();
            active.quantity = Set(previous + delta);
            active.update(conn).await.map_err(ServiceError::db_error)?;

            (previous, Some(id), None)
        }
        InventoryTarget::ProductVariant(id) => {
            let variant = product_variant::Entity::find_by_id(id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("product variant {} not found", id))
                })?;

            let previous = variant.warehouse_inventory;
            let mut active: product_variant::ActiveModel = variant.into();
            active.warehouse_inventory = Set(previous + delta);
            active.update(conn).await.map_err(ServiceError::db_error)?;

            (previous, None, Some(id))
        }
    };

    let row = inventory_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        blank_variant_id: Set(blank_variant_id),
        product_variant_id: Set(product_variant_id),
        change_amount: Set(delta),
        previous_quantity: Set(previous_quantity),
        new_quantity: Set(previous_quantity + delta),
        reason: Set(reason.as_str().to_string()),
        session_id: Set(context.session_id),
        line_item_id: Set(context.line_item_id),
        audit_log_id: Set(context.audit_log_id),
        ..Default::default()
    };

    let inserted = row.insert(conn).await.map_err(ServiceError::db_error)?;

    info!(
        target = ?target,
        delta,
        previous_quantity,
        new_quantity = previous_quantity + delta,
        reason = reason.as_str(),
        "ledger adjustment applied"
    );

    Ok(inserted)
}

/// Resolves a line item to the blank variant its product prints onto.
async fn printable_line_item<C: ConnectionTrait>(
    conn: &C,
    line_item_id: Uuid,
) -> Result<(line_item::Model, Uuid), ServiceError> {
    let item = LineItem::find_by_id(line_item_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("line item {} not found", line_item_id)))?;

    let variant_id = item.product_variant_id.ok_or_else(|| {
        ServiceError::InvalidOperation(format!(
            "line item {} has no product variant to print",
            line_item_id
        ))
    })?;

    let variant = product_variant::Entity::find_by_id(variant_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("product variant {} not found", variant_id))
        })?;

    let blank_variant_id = variant.blank_variant_id.ok_or_else(|| {
        ServiceError::InvalidOperation(format!(
            "line item {} has no blank linked for printing",
            line_item_id
        ))
    })?;

    Ok((item, blank_variant_id))
}

/// Looks up the print-classified quantity frozen for a line item when its
/// session was started. Recording a print against a session with no frozen
/// plan, or for an item the plan never routed to the press, is an error.
async fn frozen_print_quantity<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
    line_item_id: Uuid,
) -> Result<i32, ServiceError> {
    let session = session::Entity::find_by_id(session_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("session {} not found", session_id)))?;

    let raw = session.picking_requirements.ok_or_else(|| {
        ServiceError::InvalidOperation(format!(
            "session {} has no frozen plan; start it before recording prints",
            session_id
        ))
    })?;

    parse_picking_requirements(&raw)?
        .iter()
        .find(|r| {
            r.line_item_id == line_item_id && r.expected_fulfillment == ExpectedFulfillment::Print
        })
        .map(|r| r.quantity)
        .ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "line item {} is not planned for printing in session {}",
                line_item_id, session_id
            ))
        })
}

pub(crate) fn unwrap_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
