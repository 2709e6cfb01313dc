//! Picking aggregation: turns the per-item allocation into the two pick
//! lists handed to the floor (blanks to print, stock to pull) and into the
//! per-item requirement records frozen with the session plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::allocation::AllocationOutcome;
use super::snapshot::PickingRequirementRecord;
use super::{garment_type_rank, size_rank, ExpectedFulfillment, ProductionItem};

/// One aggregated row on the blanks-to-print list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlankPick {
    pub blank_variant_id: Uuid,
    pub blank_id: Uuid,
    pub blank_name: String,
    pub blank_variant_name: String,
    pub color: String,
    pub size: String,
    pub garment_type: String,
    pub required_quantity: i32,
    pub on_hand: i32,
    /// What can actually be pulled: `min(on_hand, required_quantity)`.
    pub to_pick: i32,
}

/// One aggregated row on the stock-to-pull list. Quantities are the
/// uncapped premade candidates, so shortfalls are visible to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPick {
    pub product_variant_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_variant_name: String,
    pub is_black_label: bool,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PickLists {
    pub blank_picks: Vec<BlankPick>,
    pub stock_picks: Vec<StockPick>,
}

/// Builds the frozen per-item requirement records. A line item split across
/// stock and print yields two records with complementary quantities; the
/// display names are snapshotted here so later catalog edits cannot rewrite
/// history.
pub fn build_requirements(
    items: &[ProductionItem],
    outcome: &AllocationOutcome,
) -> Vec<PickingRequirementRecord> {
    let mut records = Vec::new();

    for item in items {
        let Some(alloc) = outcome.allocation_for(item.line_item.id) else {
            continue;
        };

        let base = PickingRequirementRecord {
            line_item_id: item.line_item.id,
            line_item_name: item.line_item.name.clone(),
            order_id: item.order.id,
            order_name: item.order.name.clone(),
            expected_fulfillment: alloc.fulfillment,
            blank_variant_id: None,
            product_variant_id: None,
            quantity: 0,
            blank_name: item.blank.as_ref().map(|b| b.name.clone()),
            blank_variant_name: item.blank_variant.as_ref().map(|v| v.name.clone()),
            product_name: item.product.as_ref().map(|p| p.name.clone()),
            product_variant_name: item.product_variant.as_ref().map(|v| v.name.clone()),
        };

        match alloc.fulfillment {
            ExpectedFulfillment::BlackLabel => {
                records.push(PickingRequirementRecord {
                    expected_fulfillment: ExpectedFulfillment::BlackLabel,
                    product_variant_id: alloc.product_variant_id,
                    quantity: alloc.quantity,
                    ..base
                });
            }
            _ => {
                if alloc.from_stock > 0 {
                    records.push(PickingRequirementRecord {
                        expected_fulfillment: ExpectedFulfillment::Stock,
                        product_variant_id: alloc.product_variant_id,
                        quantity: alloc.from_stock,
                        ..base.clone()
                    });
                }
                if alloc.needs_blanks > 0 {
                    records.push(PickingRequirementRecord {
                        expected_fulfillment: ExpectedFulfillment::Print,
                        blank_variant_id: alloc.blank_variant_id,
                        product_variant_id: alloc.product_variant_id,
                        quantity: alloc.needs_blanks,
                        ..base
                    });
                }
            }
        }
    }

    records
}

/// Aggregates the allocation into the two sorted pick lists.
pub fn aggregate(items: &[ProductionItem], outcome: &AllocationOutcome) -> PickLists {
    PickLists {
        blank_picks: blank_picks(items, outcome),
        stock_picks: stock_picks(items, outcome),
    }
}

fn blank_picks(items: &[ProductionItem], outcome: &AllocationOutcome) -> Vec<BlankPick> {
    let mut grouped: BTreeMap<Uuid, BlankPick> = BTreeMap::new();

    for item in items {
        let Some(alloc) = outcome.allocation_for(item.line_item.id) else {
            continue;
        };
        if alloc.needs_blanks <= 0 {
            continue;
        }
        let (Some(blank), Some(variant)) = (&item.blank, &item.blank_variant) else {
            continue;
        };

        let pick = grouped.entry(variant.id).or_insert_with(|| BlankPick {
            blank_variant_id: variant.id,
            blank_id: blank.id,
            blank_name: blank.name.clone(),
            blank_variant_name: variant.name.clone(),
            color: variant.color.clone(),
            size: variant.size.clone(),
            garment_type: blank.garment_type.clone(),
            required_quantity: 0,
            on_hand: variant.quantity,
            to_pick: 0,
        });
        pick.required_quantity += alloc.needs_blanks;
    }

    let mut picks: Vec<BlankPick> = grouped
        .into_values()
        .map(|mut pick| {
            pick.to_pick = pick.on_hand.min(pick.required_quantity);
            pick
        })
        .collect();

    picks.sort_by(|a, b| {
        color_rank(&a.color)
            .cmp(&color_rank(&b.color))
            .then_with(|| {
                garment_type_rank(&a.garment_type).cmp(&garment_type_rank(&b.garment_type))
            })
            .then_with(|| a.blank_name.cmp(&b.blank_name))
            .then_with(|| size_rank(&a.size).cmp(&size_rank(&b.size)))
    });
    picks
}

fn stock_picks(items: &[ProductionItem], outcome: &AllocationOutcome) -> Vec<StockPick> {
    let mut grouped: BTreeMap<Uuid, StockPick> = BTreeMap::new();

    for candidate in &outcome.premade_candidates {
        let Some(item) = items
            .iter()
            .find(|i| i.line_item.id == candidate.line_item_id)
        else {
            continue;
        };

        let pick = grouped
            .entry(candidate.product_variant_id)
            .or_insert_with(|| StockPick {
                product_variant_id: candidate.product_variant_id,
                product_id: item.product.as_ref().map(|p| p.id),
                product_name: item
                    .product
                    .as_ref()
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                product_variant_name: item
                    .product_variant
                    .as_ref()
                    .map(|v| v.name.clone())
                    .unwrap_or_default(),
                is_black_label: candidate.black_label,
                quantity: 0,
            });
        pick.quantity += candidate.quantity;
    }

    let mut picks: Vec<StockPick> = grouped.into_values().collect();
    picks.sort_by(|a, b| {
        b.is_black_label
            .cmp(&a.is_black_label)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    picks
}

/// Blank pick list color priority: black, then white, then everything else
/// alphabetically.
fn color_rank(color: &str) -> (u8, String) {
    let lowered = color.trim().to_lowercase();
    match lowered.as_str() {
        "black" => (0, lowered),
        "white" => (1, lowered),
        _ => (2, lowered),
    }
}
