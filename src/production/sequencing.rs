//! Production sequencer: one deterministic total order over the line items
//! in a session, built from a cascading chain of tie-break rules.
//!
//! Each rule is an independent `(a, b) -> Ordering` function; evaluation
//! falls through to the next rule while a rule is indecisive. The final
//! rule compares display names, so no two distinct items ever tie and the
//! output is independent of input iteration order.

use std::cmp::Ordering;

use super::allocation::AllocationOutcome;
use super::snapshot::AssemblyLineEntry;
use super::{garment_type_rank, size_rank, Pretreat, ProductionItem};

type Rule = fn(&ProductionItem, &ProductionItem) -> Ordering;

/// Tie-break rules in priority order. Earlier entries dominate.
const RULES: &[Rule] = &[
    catalog_synced_first,
    blank_synced_first,
    small_transfer_last,
    dark_pretreat_first,
    large_transfer_first,
    smaller_order_first,
    more_prints_first,
    garment_type_priority,
    size_priority,
    color_alphabetical,
    name_alphabetical,
];

/// `true` ranks earlier in the sequence.
fn first_if(a: bool, b: bool) -> Ordering {
    b.cmp(&a)
}

/// `true` ranks later in the sequence.
fn last_if(a: bool, b: bool) -> Ordering {
    a.cmp(&b)
}

fn catalog_synced_first(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    first_if(a.catalog_synced(), b.catalog_synced())
}

fn blank_synced_first(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    first_if(a.blank_synced(), b.blank_synced())
}

fn small_transfer_last(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    last_if(a.has_small_transfer(), b.has_small_transfer())
}

fn dark_pretreat_first(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    fn rank(p: Pretreat) -> u8 {
        match p {
            Pretreat::Dark => 0,
            Pretreat::Light => 1,
        }
    }
    rank(a.pretreat()).cmp(&rank(b.pretreat()))
}

fn large_transfer_first(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    first_if(a.has_large_transfer(), b.has_large_transfer())
}

fn smaller_order_first(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    a.order_item_count.cmp(&b.order_item_count)
}

fn more_prints_first(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    b.print_count().cmp(&a.print_count())
}

fn garment_type_priority(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    garment_type_rank(a.garment_type()).cmp(&garment_type_rank(b.garment_type()))
}

fn size_priority(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    size_rank(a.blank_size()).cmp(&size_rank(b.blank_size()))
}

fn color_alphabetical(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    a.blank_color()
        .to_lowercase()
        .cmp(&b.blank_color().to_lowercase())
}

fn name_alphabetical(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    a.line_item.name.cmp(&b.line_item.name)
}

/// Applies the rule chain until a rule is decisive.
pub fn compare_items(a: &ProductionItem, b: &ProductionItem) -> Ordering {
    RULES
        .iter()
        .fold(Ordering::Equal, |ord, rule| ord.then_with(|| rule(a, b)))
}

/// Sequences the allocated, shippable line items of a session into a frozen
/// assembly order annotated with 0-based positions.
///
/// Held and unaccounted items carry no fulfillment tag and are excluded; so
/// are non-shippable items (digital add-ons), which keep their database rows
/// but never enter the physical line.
pub fn sequence(items: &[ProductionItem], outcome: &AllocationOutcome) -> Vec<AssemblyLineEntry> {
    let mut line: Vec<(&ProductionItem, super::ExpectedFulfillment)> = items
        .iter()
        .filter(|item| item.line_item.requires_shipping)
        .filter_map(|item| {
            outcome
                .allocation_for(item.line_item.id)
                .map(|alloc| (item, alloc.fulfillment))
        })
        .collect();

    line.sort_by(|(a, _), (b, _)| compare_items(a, b));

    line.into_iter()
        .enumerate()
        .map(|(position, (item, fulfillment))| AssemblyLineEntry {
            line_item_id: item.line_item.id,
            item_position: position as u32,
            expected_fulfillment: fulfillment,
        })
        .collect()
}
