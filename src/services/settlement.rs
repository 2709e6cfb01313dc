//! Settlement: reconciling a frozen session plan against what the ledger
//! and the floor actually recorded.
//!
//! Settlement never writes. It reads the two snapshot halves back through
//! the validating parsers, lines each frozen entry up with its ledger rows,
//! and reports three independent mismatch signals per entry. Misprint rows
//! are discounted before comparing inventory movement, so a spoiled-and-
//! reprinted item that was handled correctly settles clean.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        audit_log::{self, Entity as AuditLog},
        inventory_transaction::{self, Entity as InventoryTransaction},
        line_item::{self, CompletionStatus, Entity as LineItem},
        session::Entity as Session,
    },
    errors::ServiceError,
    production::{
        snapshot::{
            parse_assembly_plan, parse_picking_requirements, AssemblyLineEntry,
            PickingRequirementRecord,
        },
        ExpectedFulfillment,
    },
};

/// One frozen entry reconciled against recorded reality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementItem {
    pub line_item_id: Uuid,
    pub item_position: u32,
    pub line_item_name: String,
    pub order_name: String,
    pub expected_fulfillment: ExpectedFulfillment,
    /// Raw stored status; `None` when the line item row no longer exists.
    pub completion_status: Option<String>,
    pub quantity: i32,
    pub expected_change: i32,
    pub actual_change: i32,
    pub misprint_change: i32,
    pub adjusted_actual_change: i32,
    /// The item was completed down the opposite path from the plan.
    pub fulfillment_mismatch: bool,
    /// Misprint-discounted ledger movement disagrees with the expectation.
    pub inventory_mismatch: bool,
    /// Completion status is neither the implied one nor the ignore override.
    pub status_mismatch: bool,
    pub transactions: Vec<inventory_transaction::Model>,
    pub audit_logs: Vec<audit_log::Model>,
}

impl SettlementItem {
    pub fn is_clean(&self) -> bool {
        !self.fulfillment_mismatch && !self.inventory_mismatch && !self.status_mismatch
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReport {
    pub session_id: Uuid,
    pub session_name: String,
    pub session_status: String,
    pub items: Vec<SettlementItem>,
    pub mismatched_item_count: usize,
}

#[derive(Clone)]
pub struct SettlementService {
    db_pool: Arc<DbPool>,
}

impl SettlementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Builds the settlement report for a session with a frozen plan.
    /// Corrupt snapshots surface as errors rather than a partial report.
    #[instrument(skip(self))]
    pub async fn settle(&self, session_id: Uuid) -> Result<SettlementReport, ServiceError> {
        let db = self.db_pool.as_ref();

        let session = Session::find_by_id(session_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("session {} not found", session_id)))?;

        let (Some(plan_raw), Some(requirements_raw)) =
            (&session.assembly_plan, &session.picking_requirements)
        else {
            return Err(ServiceError::InvalidOperation(format!(
                "session {} has never been started, nothing to settle",
                session_id
            )));
        };

        let mut entries = parse_assembly_plan(plan_raw)?;
        entries.sort_by_key(|e| e.item_position);
        let requirements = parse_picking_requirements(requirements_raw)?;

        let requirements_by_key: HashMap<(Uuid, ExpectedFulfillment), &PickingRequirementRecord> =
            requirements
                .iter()
                .map(|r| ((r.line_item_id, r.expected_fulfillment), r))
                .collect();

        let line_item_ids: Vec<Uuid> = entries.iter().map(|e| e.line_item_id).collect();
        let line_items: HashMap<Uuid, line_item::Model> = LineItem::find()
            .filter(line_item::Column::Id.is_in(line_item_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let transactions = InventoryTransaction::find()
            .filter(inventory_transaction::Column::SessionId.eq(session_id))
            .order_by_asc(inventory_transaction::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let audit_logs = AuditLog::find()
            .filter(audit_log::Column::SessionId.eq(session_id))
            .order_by_asc(audit_log::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(entries.len());
        for entry in &entries {
            let requirement = requirements_by_key
                .get(&(entry.line_item_id, entry.expected_fulfillment))
                .copied()
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "frozen plan entry for line item {} has no matching picking requirement",
                        entry.line_item_id
                    ))
                })?;

            let entry_transactions: Vec<inventory_transaction::Model> = transactions
                .iter()
                .filter(|t| t.line_item_id == Some(entry.line_item_id))
                .cloned()
                .collect();
            let entry_audit_logs: Vec<audit_log::Model> = audit_logs
                .iter()
                .filter(|l| l.line_item_id == Some(entry.line_item_id))
                .cloned()
                .collect();

            items.push(evaluate_entry(
                entry,
                requirement,
                line_items.get(&entry.line_item_id),
                entry_transactions,
                entry_audit_logs,
            ));
        }

        let mismatched_item_count = items.iter().filter(|i| !i.is_clean()).count();

        Ok(SettlementReport {
            session_id,
            session_name: session.name,
            session_status: session.status,
            items,
            mismatched_item_count,
        })
    }
}

fn implied_status(fulfillment: ExpectedFulfillment) -> CompletionStatus {
    match fulfillment {
        ExpectedFulfillment::Print => CompletionStatus::Printed,
        ExpectedFulfillment::Stock | ExpectedFulfillment::BlackLabel => CompletionStatus::InStock,
    }
}

/// The SKU column a fulfillment path moves inventory against. Black-label
/// items carry no tracked SKU, so there is nothing to reconcile.
fn ledger_target(
    fulfillment: ExpectedFulfillment,
    requirement: &PickingRequirementRecord,
) -> Option<LedgerTarget> {
    match fulfillment {
        ExpectedFulfillment::Print => requirement.blank_variant_id.map(LedgerTarget::Blank),
        ExpectedFulfillment::Stock => requirement.product_variant_id.map(LedgerTarget::Product),
        ExpectedFulfillment::BlackLabel => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum LedgerTarget {
    Blank(Uuid),
    Product(Uuid),
}

impl LedgerTarget {
    fn matches(&self, transaction: &inventory_transaction::Model) -> bool {
        match self {
            LedgerTarget::Blank(id) => transaction.blank_variant_id == Some(*id),
            LedgerTarget::Product(id) => transaction.product_variant_id == Some(*id),
        }
    }
}

/// Reconciles one frozen entry. Pure, so the mismatch rules are testable
/// without a database.
fn evaluate_entry(
    entry: &AssemblyLineEntry,
    requirement: &PickingRequirementRecord,
    line_item: Option<&line_item::Model>,
    transactions: Vec<inventory_transaction::Model>,
    audit_logs: Vec<audit_log::Model>,
) -> SettlementItem {
    let completion = line_item.and_then(|i| i.completion());
    let implied = implied_status(entry.expected_fulfillment);

    let expected_change = if completion == Some(implied) {
        -requirement.quantity
    } else {
        0
    };

    let target = ledger_target(entry.expected_fulfillment, requirement);
    let (actual_change, misprint_change) = match target {
        Some(target) => transactions
            .iter()
            .filter(|t| target.matches(t))
            .fold((0, 0), |(actual, misprint), t| {
                let misprint_part = if t.is_misprint() { t.change_amount } else { 0 };
                (actual + t.change_amount, misprint + misprint_part)
            }),
        None => (0, 0),
    };
    let adjusted_actual_change = actual_change - misprint_change;

    let fulfillment_mismatch = match entry.expected_fulfillment {
        ExpectedFulfillment::Print => completion == Some(CompletionStatus::InStock),
        ExpectedFulfillment::Stock | ExpectedFulfillment::BlackLabel => {
            completion == Some(CompletionStatus::Printed)
        }
    };

    let status_mismatch =
        !matches!(completion, Some(status) if status == implied || status == CompletionStatus::Ignore);

    // An item finished down the wrong path makes the inventory comparison
    // meaningless, so the fulfillment flag suppresses it.
    let inventory_mismatch =
        !fulfillment_mismatch && target.is_some() && adjusted_actual_change != expected_change;

    SettlementItem {
        line_item_id: entry.line_item_id,
        item_position: entry.item_position,
        line_item_name: requirement.line_item_name.clone(),
        order_name: requirement.order_name.clone(),
        expected_fulfillment: entry.expected_fulfillment,
        completion_status: line_item.map(|i| i.completion_status.clone()),
        quantity: requirement.quantity,
        expected_change,
        actual_change,
        misprint_change,
        adjusted_actual_change,
        fulfillment_mismatch,
        inventory_mismatch,
        status_mismatch,
        transactions,
        audit_logs,
    }
}
