//! Property tests for the pure planning core: allocation conserves
//! quantities and the sequencer is a deterministic total order.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use printhouse_api::entities::{blank, blank_variant, line_item, order, product, product_variant};
use printhouse_api::production::{
    allocation::resolve_allocation, sequencing::sequence, PrintSpec, ProductionItem,
};

const COLORS: &[&str] = &["black", "white", "navy", "banana", "seafoam", "heather grey"];
const SIZES: &[&str] = &["xs", "sm", "md", "lg", "xl", "2xl"];
const GARMENTS: &[&str] = &["hoodie", "crewneck", "tee", "headwear", "poncho"];

#[derive(Debug, Clone)]
struct ItemSpec {
    quantity: i32,
    stock: i32,
    color: usize,
    size: usize,
    garment: usize,
    print_count: usize,
}

fn item_spec() -> impl Strategy<Value = ItemSpec> {
    (
        1..6i32,
        0..8i32,
        0..COLORS.len(),
        0..SIZES.len(),
        0..GARMENTS.len(),
        1..4usize,
    )
        .prop_map(|(quantity, stock, color, size, garment, print_count)| ItemSpec {
            quantity,
            stock,
            color,
            size,
            garment,
            print_count,
        })
}

/// Builds a fully joined item from a spec. Each item gets its own catalog
/// chain, so allocations cannot contend across items.
fn build_item(index: usize, spec: &ItemSpec) -> ProductionItem {
    let order_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let blank_id = Uuid::new_v4();
    let blank_variant_id = Uuid::new_v4();
    let variant_id = Uuid::new_v4();
    let name = format!("Item {:03}", index);

    ProductionItem {
        line_item: line_item::Model {
            id: Uuid::new_v4(),
            order_id,
            name: name.clone(),
            quantity: spec.quantity,
            requires_shipping: true,
            remaining_quantity: spec.quantity,
            completion_status: "not_started".to_string(),
            product_variant_id: Some(variant_id),
            created_at: Utc::now(),
            updated_at: None,
        },
        order: order::Model {
            id: order_id,
            name: format!("Order {:03}", index),
            cancelled: false,
            fulfillment_status: "unfulfilled".to_string(),
            has_active_hold: false,
            created_at: Utc::now(),
            updated_at: None,
        },
        order_item_count: 1,
        product: Some(product::Model {
            id: product_id,
            name: name.clone(),
            is_black_label: false,
            created_at: Utc::now(),
            updated_at: None,
        }),
        product_variant: Some(product_variant::Model {
            id: variant_id,
            product_id,
            name: format!("{} / {}", name, SIZES[spec.size]),
            warehouse_inventory: spec.stock,
            blank_variant_id: Some(blank_variant_id),
            created_at: Utc::now(),
            updated_at: None,
        }),
        blank: Some(blank::Model {
            id: blank_id,
            name: format!("Blank {}", GARMENTS[spec.garment]),
            garment_type: GARMENTS[spec.garment].to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }),
        blank_variant: Some(blank_variant::Model {
            id: blank_variant_id,
            blank_id,
            name: format!("Blank / {} / {}", COLORS[spec.color], SIZES[spec.size]),
            color: COLORS[spec.color].to_string(),
            size: SIZES[spec.size].to_string(),
            quantity: 100,
            created_at: Utc::now(),
            updated_at: None,
        }),
        prints: (0..spec.print_count)
            .map(|i| PrintSpec {
                location: format!("location {}", i),
                pretreat: None,
                heat_transfer: false,
                small_format: false,
            })
            .collect(),
    }
}

fn build_items(specs: &[ItemSpec]) -> Vec<ProductionItem> {
    specs
        .iter()
        .enumerate()
        .map(|(i, s)| build_item(i, s))
        .collect()
}

proptest! {
    #[test]
    fn allocation_conserves_every_item_quantity(
        specs in prop::collection::vec(item_spec(), 1..16)
    ) {
        let items = build_items(&specs);
        let outcome = resolve_allocation(&items);

        prop_assert_eq!(outcome.allocations.len(), items.len());
        for item in &items {
            let allocation = outcome
                .allocation_for(item.line_item.id)
                .expect("every synced unheld item gets an allocation");
            prop_assert!(allocation.from_stock >= 0);
            prop_assert!(allocation.needs_blanks >= 0);
            prop_assert_eq!(
                allocation.from_stock + allocation.needs_blanks,
                item.line_item.quantity
            );

            let on_hand = item
                .product_variant
                .as_ref()
                .map(|v| v.warehouse_inventory)
                .unwrap_or(0);
            prop_assert!(allocation.from_stock <= on_hand.max(0));
        }
    }

    #[test]
    fn sequencing_emits_contiguous_positions_over_all_items(
        specs in prop::collection::vec(item_spec(), 1..16)
    ) {
        let items = build_items(&specs);
        let outcome = resolve_allocation(&items);
        let entries = sequence(&items, &outcome);

        prop_assert_eq!(entries.len(), items.len());
        for (position, entry) in entries.iter().enumerate() {
            prop_assert_eq!(entry.item_position as usize, position);
        }

        let mut sequenced: Vec<Uuid> = entries.iter().map(|e| e.line_item_id).collect();
        let mut expected: Vec<Uuid> = items.iter().map(|i| i.line_item.id).collect();
        sequenced.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(sequenced, expected);
    }

    #[test]
    fn sequencing_is_invariant_under_input_permutation(
        (specs, permutation) in prop::collection::vec(item_spec(), 1..12)
            .prop_flat_map(|specs| {
                let indices: Vec<usize> = (0..specs.len()).collect();
                (Just(specs), Just(indices).prop_shuffle())
            })
    ) {
        let items = build_items(&specs);
        let shuffled: Vec<ProductionItem> =
            permutation.iter().map(|&i| items[i].clone()).collect();

        let entries = sequence(&items, &resolve_allocation(&items));
        let shuffled_entries = sequence(&shuffled, &resolve_allocation(&shuffled));

        prop_assert_eq!(entries, shuffled_entries);
    }

    #[test]
    fn sequencing_is_idempotent(
        specs in prop::collection::vec(item_spec(), 1..12)
    ) {
        let items = build_items(&specs);
        let outcome = resolve_allocation(&items);
        prop_assert_eq!(sequence(&items, &outcome), sequence(&items, &outcome));
    }
}
