//! Stock allocation resolver: splits each line item's quantity between
//! existing finished stock and fresh printing from blanks.
//!
//! Allocation is first-seen-first-served in input order. The resolver never
//! mutates stock; it allocates virtually against a snapshot of on-hand
//! quantities. The actual decrement happens through the inventory ledger at
//! session start.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExpectedFulfillment, ProductionItem};

/// Per-line-item allocation split. `from_stock + needs_blanks == quantity`
/// always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAllocation {
    pub line_item_id: Uuid,
    pub quantity: i32,
    pub from_stock: i32,
    pub needs_blanks: i32,
    /// Primary fulfillment tag frozen into the assembly plan. An item that
    /// needs any printing is tagged `print`; its stock portion remains
    /// visible through the picking requirements.
    pub fulfillment: ExpectedFulfillment,
    pub product_variant_id: Option<Uuid>,
    pub blank_variant_id: Option<Uuid>,
}

/// Uncapped premade-stock candidate from the first pass, used for the
/// stock pull list display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremadeCandidate {
    pub line_item_id: Uuid,
    pub product_variant_id: Uuid,
    pub quantity: i32,
    pub black_label: bool,
}

/// A line item excluded because its order carries an unresolved hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldItem {
    pub line_item_id: Uuid,
    pub line_item_name: String,
    pub order_id: Uuid,
    pub order_name: String,
    pub quantity: i32,
}

/// A line item that cannot be categorized because catalog or blank linkage
/// is missing. Not an error: surfaced for manual intervention so nothing
/// silently drops out of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaccountedItem {
    pub line_item_id: Uuid,
    pub line_item_name: String,
    pub order_id: Uuid,
    pub quantity: i32,
    pub reason: String,
}

/// Full resolver output. Every input item lands in exactly one of
/// `allocations`, `held_items`, or `unaccounted_items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub allocations: Vec<ItemAllocation>,
    pub premade_candidates: Vec<PremadeCandidate>,
    pub held_items: Vec<HeldItem>,
    pub unaccounted_items: Vec<UnaccountedItem>,
}

impl AllocationOutcome {
    pub fn allocation_for(&self, line_item_id: Uuid) -> Option<&ItemAllocation> {
        self.allocations.iter().find(|a| a.line_item_id == line_item_id)
    }
}

/// Resolves the stock-vs-print split for every item.
///
/// Two passes share a per-variant running allocation counter: the premade
/// pass collects uncapped stock/black-label candidates for display, then the
/// blank pass caps stock coverage by what is actually on hand and routes the
/// remainder to blanks.
pub fn resolve_allocation(items: &[ProductionItem]) -> AllocationOutcome {
    let mut outcome = AllocationOutcome::default();

    // Premade pass: anything with stock on the shelf, or black label, is a
    // display candidate at full requested quantity.
    for item in items {
        if item.is_held() {
            continue;
        }
        if let Some(variant) = &item.product_variant {
            if variant.warehouse_inventory > 0 || item.is_black_label() {
                outcome.premade_candidates.push(PremadeCandidate {
                    line_item_id: item.line_item.id,
                    product_variant_id: variant.id,
                    quantity: item.line_item.quantity,
                    black_label: item.is_black_label(),
                });
            }
        }
    }

    // Blank pass: cap stock coverage by remaining on-hand, first come first
    // served, and route the shortfall to blanks.
    let mut allocated: HashMap<Uuid, i32> = HashMap::new();

    for item in items {
        if item.is_held() {
            outcome.held_items.push(HeldItem {
                line_item_id: item.line_item.id,
                line_item_name: item.line_item.name.clone(),
                order_id: item.order.id,
                order_name: item.order.name.clone(),
                quantity: item.line_item.quantity,
            });
            continue;
        }

        let quantity = item.line_item.quantity;

        if item.is_black_label() {
            outcome.allocations.push(ItemAllocation {
                line_item_id: item.line_item.id,
                quantity,
                from_stock: quantity,
                needs_blanks: 0,
                fulfillment: ExpectedFulfillment::BlackLabel,
                product_variant_id: item.product_variant.as_ref().map(|v| v.id),
                blank_variant_id: None,
            });
            continue;
        }

        let Some(variant) = &item.product_variant else {
            outcome.unaccounted_items.push(UnaccountedItem {
                line_item_id: item.line_item.id,
                line_item_name: item.line_item.name.clone(),
                order_id: item.order.id,
                quantity,
                reason: "no product variant synced for this line item".to_string(),
            });
            continue;
        };

        let available = variant.warehouse_inventory;
        let used = allocated.get(&variant.id).copied().unwrap_or(0);
        let remaining = available - used;
        let from_stock = quantity.min(remaining.max(0));
        let needs_blanks = quantity - from_stock;

        if from_stock > 0 {
            *allocated.entry(variant.id).or_insert(0) += from_stock;
        }

        if needs_blanks <= 0 {
            outcome.allocations.push(ItemAllocation {
                line_item_id: item.line_item.id,
                quantity,
                from_stock,
                needs_blanks: 0,
                fulfillment: ExpectedFulfillment::Stock,
                product_variant_id: Some(variant.id),
                blank_variant_id: item.blank_variant.as_ref().map(|v| v.id),
            });
            continue;
        }

        if !item.blank_synced() {
            outcome.unaccounted_items.push(UnaccountedItem {
                line_item_id: item.line_item.id,
                line_item_name: item.line_item.name.clone(),
                order_id: item.order.id,
                quantity,
                reason: format!(
                    "{} unit(s) need printing but no blank is linked",
                    needs_blanks
                ),
            });
            continue;
        }

        outcome.allocations.push(ItemAllocation {
            line_item_id: item.line_item.id,
            quantity,
            from_stock,
            needs_blanks,
            fulfillment: ExpectedFulfillment::Print,
            product_variant_id: Some(variant.id),
            blank_variant_id: item.blank_variant.as_ref().map(|v| v.id),
        });
    }

    outcome
}
