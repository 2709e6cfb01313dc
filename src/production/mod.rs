//! Pure production-planning core: stock allocation, assembly-line
//! sequencing, and picking aggregation.
//!
//! Everything in this tree is synchronous and side-effect free. Callers
//! fetch catalog data once up front and hand it in as pre-joined
//! [`ProductionItem`]s; the only component that touches shared mutable
//! state is the inventory ledger service, which lives elsewhere.

pub mod allocation;
pub mod picking;
pub mod sequencing;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::entities::{blank, blank_variant, line_item, order, product, product_variant};

/// How a line-item quantity is expected to be fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedFulfillment {
    /// Covered by existing finished inventory.
    Stock,
    /// Must be printed onto a raw blank.
    Print,
    /// Always sourced pre-made from a vendor, no blank involved.
    BlackLabel,
}

impl ExpectedFulfillment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpectedFulfillment::Stock => "stock",
            ExpectedFulfillment::Print => "print",
            ExpectedFulfillment::BlackLabel => "black_label",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pretreat {
    Light,
    Dark,
}

impl Pretreat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Pretreat::Light),
            "dark" => Some(Pretreat::Dark),
            _ => None,
        }
    }
}

/// One print location on a product, with the metadata the sequencer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintSpec {
    pub location: String,
    /// Explicit pretreat override; inferred from blank color when absent.
    pub pretreat: Option<Pretreat>,
    pub heat_transfer: bool,
    pub small_format: bool,
}

/// A line item joined with everything the planning core needs: its order,
/// catalog linkage, blank linkage, and print metadata. Built once by the
/// session service; missing links stay `None` and are classified as
/// unaccounted rather than erroring.
#[derive(Debug, Clone)]
pub struct ProductionItem {
    pub line_item: line_item::Model,
    pub order: order::Model,
    /// Total line items on the parent order; small orders sort earlier.
    pub order_item_count: usize,
    pub product: Option<product::Model>,
    pub product_variant: Option<product_variant::Model>,
    pub blank: Option<blank::Model>,
    pub blank_variant: Option<blank_variant::Model>,
    pub prints: Vec<PrintSpec>,
}

impl ProductionItem {
    /// Product and variant both resolvable.
    pub fn catalog_synced(&self) -> bool {
        self.product.is_some() && self.product_variant.is_some()
    }

    /// Blank and blank variant both resolvable.
    pub fn blank_synced(&self) -> bool {
        self.blank.is_some() && self.blank_variant.is_some()
    }

    pub fn is_black_label(&self) -> bool {
        self.product.as_ref().map(|p| p.is_black_label).unwrap_or(false)
    }

    pub fn is_held(&self) -> bool {
        self.order.has_active_hold
    }

    pub fn blank_color(&self) -> &str {
        self.blank_variant.as_ref().map(|v| v.color.as_str()).unwrap_or("")
    }

    pub fn blank_size(&self) -> &str {
        self.blank_variant.as_ref().map(|v| v.size.as_str()).unwrap_or("")
    }

    pub fn garment_type(&self) -> &str {
        self.blank.as_ref().map(|b| b.garment_type.as_str()).unwrap_or("")
    }

    pub fn print_count(&self) -> usize {
        self.prints.len()
    }

    pub fn has_small_transfer(&self) -> bool {
        self.prints.iter().any(|p| p.heat_transfer && p.small_format)
    }

    pub fn has_large_transfer(&self) -> bool {
        self.prints.iter().any(|p| p.heat_transfer && !p.small_format)
    }

    /// Pretreat for this item: the first explicit per-print value wins,
    /// otherwise inferred from the blank's color.
    pub fn pretreat(&self) -> Pretreat {
        self.prints
            .iter()
            .find_map(|p| p.pretreat)
            .unwrap_or_else(|| infer_pretreat(self.blank_color()))
    }
}

/// Colors printed with light pretreat. Anything else is treated as dark.
const LIGHT_COLORS: &[&str] = &[
    "white",
    "natural",
    "bone",
    "cream",
    "ivory",
    "light yellow",
    "banana",
    "yellow",
    "seafoam",
];

pub fn is_light_color(color: &str) -> bool {
    let color = color.trim().to_lowercase();
    LIGHT_COLORS.contains(&color.as_str())
}

pub fn infer_pretreat(color: &str) -> Pretreat {
    if is_light_color(color) {
        Pretreat::Light
    } else {
        Pretreat::Dark
    }
}

/// Garment handling order on the floor. Unlisted types rank last.
const GARMENT_TYPE_PRIORITY: &[&str] = &[
    "hoodie",
    "crewneck",
    "longsleeve",
    "tee",
    "shorts",
    "sweatpants",
    "headwear",
    "accessory",
    "jacket",
    "coat",
];

/// Size run order. Unlisted sizes rank last.
const SIZE_PRIORITY: &[&str] = &[
    "xs", "sm", "md", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "os",
];

pub fn garment_type_rank(garment_type: &str) -> usize {
    let gt = garment_type.trim().to_lowercase();
    GARMENT_TYPE_PRIORITY
        .iter()
        .position(|g| *g == gt)
        .unwrap_or(GARMENT_TYPE_PRIORITY.len())
}

pub fn size_rank(size: &str) -> usize {
    let size = size.trim().to_lowercase();
    SIZE_PRIORITY
        .iter()
        .position(|s| *s == size)
        .unwrap_or(SIZE_PRIORITY.len())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builders for fully joined production items used across the pure-core
    //! unit tests.

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::entities::line_item::CompletionStatus;
    use crate::entities::order::FulfillmentStatus;

    pub(crate) fn order_model(name: &str, held: bool) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            cancelled: false,
            fulfillment_status: FulfillmentStatus::Unfulfilled.as_str().to_string(),
            has_active_hold: held,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Fully synced, blank-linked item: black tee, medium, one non-transfer
    /// print, alone on its order, no premade stock.
    pub(crate) fn item(name: &str, quantity: i32) -> ProductionItem {
        let order = order_model(&format!("Order for {}", name), false);
        let product_id = Uuid::new_v4();
        let blank_id = Uuid::new_v4();
        let blank_variant_id = Uuid::new_v4();
        let variant_id = Uuid::new_v4();

        ProductionItem {
            line_item: line_item::Model {
                id: Uuid::new_v4(),
                order_id: order.id,
                name: name.to_string(),
                quantity,
                requires_shipping: true,
                remaining_quantity: quantity,
                completion_status: CompletionStatus::NotStarted.as_str().to_string(),
                product_variant_id: Some(variant_id),
                created_at: Utc::now(),
                updated_at: None,
            },
            order,
            order_item_count: 1,
            product: Some(product::Model {
                id: product_id,
                name: format!("{} Product", name),
                is_black_label: false,
                created_at: Utc::now(),
                updated_at: None,
            }),
            product_variant: Some(product_variant::Model {
                id: variant_id,
                product_id,
                name: format!("{} / md", name),
                warehouse_inventory: 0,
                blank_variant_id: Some(blank_variant_id),
                created_at: Utc::now(),
                updated_at: None,
            }),
            blank: Some(blank::Model {
                id: blank_id,
                name: "Heavyweight Tee".to_string(),
                garment_type: "tee".to_string(),
                created_at: Utc::now(),
                updated_at: None,
            }),
            blank_variant: Some(blank_variant::Model {
                id: blank_variant_id,
                blank_id,
                name: "Heavyweight Tee / black / md".to_string(),
                color: "black".to_string(),
                size: "md".to_string(),
                quantity: 100,
                created_at: Utc::now(),
                updated_at: None,
            }),
            prints: vec![PrintSpec {
                location: "front".to_string(),
                pretreat: None,
                heat_transfer: false,
                small_format: false,
            }],
        }
    }

    /// Item whose product variant (shared `variant_id`) has `on_hand`
    /// finished units in the warehouse.
    pub(crate) fn stocked_item(
        name: &str,
        quantity: i32,
        variant_id: Uuid,
        on_hand: i32,
    ) -> ProductionItem {
        let mut it = item(name, quantity);
        let variant = it.product_variant.as_mut().unwrap();
        variant.id = variant_id;
        variant.warehouse_inventory = on_hand;
        it.line_item.product_variant_id = Some(variant_id);
        it
    }

    pub(crate) fn held_item(name: &str, quantity: i32) -> ProductionItem {
        let mut it = item(name, quantity);
        it.order.has_active_hold = true;
        it
    }

    /// No catalog or blank linkage at all.
    pub(crate) fn unsynced_item(name: &str, quantity: i32) -> ProductionItem {
        let mut it = item(name, quantity);
        it.line_item.product_variant_id = None;
        it.product = None;
        it.product_variant = None;
        it.blank = None;
        it.blank_variant = None;
        it.prints.clear();
        it
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_colors_are_case_insensitive() {
        assert!(is_light_color("White"));
        assert!(is_light_color("SEAFOAM"));
        assert!(is_light_color(" light yellow "));
        assert!(!is_light_color("black"));
        assert!(!is_light_color("navy"));
    }

    #[test]
    fn unknown_color_is_dark() {
        assert_eq!(infer_pretreat("heather grey"), Pretreat::Dark);
        assert_eq!(infer_pretreat(""), Pretreat::Dark);
    }

    #[test]
    fn garment_priority_ranks_hoodie_first_and_unknown_last() {
        assert_eq!(garment_type_rank("hoodie"), 0);
        assert!(garment_type_rank("tee") < garment_type_rank("coat"));
        assert_eq!(garment_type_rank("poncho"), GARMENT_TYPE_PRIORITY.len());
    }

    #[test]
    fn size_priority_runs_small_to_large() {
        assert!(size_rank("xs") < size_rank("5xl"));
        assert!(size_rank("os") < size_rank("38x32"));
    }
}
