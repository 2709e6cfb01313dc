//! Shared setup for integration tests: an in-memory database with the full
//! schema applied, plus seed helpers for catalog, orders, and line items.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use printhouse_api::db::{self, DbPool};
use printhouse_api::entities::{
    blank, blank_variant, line_item, order, print, product, product_variant,
};
use printhouse_api::events::{self, EventSender};

pub async fn setup_db() -> Arc<DbPool> {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");
    db::run_migrations(&pool)
        .await
        .expect("migrations should apply cleanly");
    Arc::new(pool)
}

pub fn event_sender() -> Arc<EventSender> {
    let (tx, rx) = events::channel(64);
    events::spawn_event_logger(rx);
    Arc::new(tx)
}

/// Ids of one fully linked catalog chain: blank, blank variant, product,
/// product variant, and a single front print.
pub struct Catalog {
    pub blank_id: Uuid,
    pub blank_variant_id: Uuid,
    pub product_id: Uuid,
    pub product_variant_id: Uuid,
}

pub struct CatalogSpec<'a> {
    pub product_name: &'a str,
    pub color: &'a str,
    pub size: &'a str,
    pub blank_quantity: i32,
    pub stock: i32,
    pub is_black_label: bool,
}

impl Default for CatalogSpec<'_> {
    fn default() -> Self {
        Self {
            product_name: "Tour Tee",
            color: "black",
            size: "md",
            blank_quantity: 50,
            stock: 0,
            is_black_label: false,
        }
    }
}

pub async fn seed_catalog(db: &DbPool, spec: CatalogSpec<'_>) -> Catalog {
    let blank_id = Uuid::new_v4();
    blank::ActiveModel {
        id: Set(blank_id),
        name: Set("Heavyweight Tee".to_string()),
        garment_type: Set("tee".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("blank insert");

    let blank_variant_id = Uuid::new_v4();
    blank_variant::ActiveModel {
        id: Set(blank_variant_id),
        blank_id: Set(blank_id),
        name: Set(format!("Heavyweight Tee / {} / {}", spec.color, spec.size)),
        color: Set(spec.color.to_string()),
        size: Set(spec.size.to_string()),
        quantity: Set(spec.blank_quantity),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("blank variant insert");

    let product_id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(product_id),
        name: Set(spec.product_name.to_string()),
        is_black_label: Set(spec.is_black_label),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("product insert");

    let product_variant_id = Uuid::new_v4();
    product_variant::ActiveModel {
        id: Set(product_variant_id),
        product_id: Set(product_id),
        name: Set(format!("{} / {}", spec.product_name, spec.size)),
        warehouse_inventory: Set(spec.stock),
        blank_variant_id: Set(Some(blank_variant_id)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("product variant insert");

    print::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        location: Set("front".to_string()),
        pretreat: Set(None),
        heat_transfer: Set(false),
        small_format: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("print insert");

    Catalog {
        blank_id,
        blank_variant_id,
        product_id,
        product_variant_id,
    }
}

pub async fn seed_order(db: &DbPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    order::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        cancelled: Set(false),
        fulfillment_status: Set("unfulfilled".to_string()),
        has_active_hold: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("order insert");
    id
}

pub async fn seed_line_item(
    db: &DbPool,
    order_id: Uuid,
    name: &str,
    quantity: i32,
    product_variant_id: Option<Uuid>,
) -> Uuid {
    seed_line_item_at(db, order_id, name, quantity, product_variant_id, Utc::now()).await
}

/// Variant with an explicit creation timestamp, for tests that depend on
/// line-item ordering.
pub async fn seed_line_item_at(
    db: &DbPool,
    order_id: Uuid,
    name: &str,
    quantity: i32,
    product_variant_id: Option<Uuid>,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    line_item::ActiveModel {
        id: Set(id),
        order_id: Set(order_id),
        name: Set(name.to_string()),
        quantity: Set(quantity),
        requires_shipping: Set(true),
        remaining_quantity: Set(quantity),
        completion_status: Set("not_started".to_string()),
        product_variant_id: Set(product_variant_id),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("line item insert");
    id
}
