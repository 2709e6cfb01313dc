mod common;

use assert_matches::assert_matches;
use sea_orm::EntityTrait;
use sea_orm::{ColumnTrait, QueryFilter};
use uuid::Uuid;

use printhouse_api::entities::{
    inventory_transaction::{self, Entity as InventoryTransaction},
    product_variant::Entity as ProductVariant,
    session::Entity as Session,
};
use printhouse_api::errors::ServiceError;
use printhouse_api::production::ExpectedFulfillment;
use printhouse_api::services::sessions::SessionService;

use common::{seed_catalog, seed_line_item, seed_order, CatalogSpec};

#[tokio::test]
async fn start_freezes_plan_and_pulls_stock() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let catalog = seed_catalog(
        &db,
        CatalogSpec {
            stock: 3,
            ..Default::default()
        },
    )
    .await;
    let order_id = seed_order(&db, "#1001").await;
    seed_line_item(&db, order_id, "Tour Tee", 2, Some(catalog.product_variant_id)).await;

    let session = service
        .create_session("friday run".to_string(), vec![order_id])
        .await
        .unwrap();
    let plan = service.start_session(session.id).await.unwrap();

    assert_eq!(plan.entries.len(), 1);
    assert_eq!(
        plan.entries[0].expected_fulfillment,
        ExpectedFulfillment::Stock
    );
    assert_eq!(plan.requirements.len(), 1);
    assert_eq!(plan.requirements[0].quantity, 2);

    let stored = Session::find_by_id(session.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.active);
    assert_eq!(stored.status, "active");
    assert!(stored.assembly_plan.is_some());
    assert!(stored.picking_requirements.is_some());
    assert!(stored.started_at.is_some());

    let variant = ProductVariant::find_by_id(catalog.product_variant_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.warehouse_inventory, 1);

    let transactions = InventoryTransaction::find()
        .filter(inventory_transaction::Column::SessionId.eq(session.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].change_amount, -2);
    assert_eq!(transactions[0].previous_quantity, 3);
    assert_eq!(transactions[0].new_quantity, 1);
    assert_eq!(transactions[0].reason, "stock_allocation");
}

#[tokio::test]
async fn contended_stock_splits_across_requirements() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let catalog = seed_catalog(
        &db,
        CatalogSpec {
            stock: 3,
            ..Default::default()
        },
    )
    .await;
    let first_order = seed_order(&db, "#2001").await;
    let second_order = seed_order(&db, "#2002").await;
    let base = chrono::Utc::now();
    let first_item = common::seed_line_item_at(
        &db,
        first_order,
        "Tour Tee",
        2,
        Some(catalog.product_variant_id),
        base,
    )
    .await;
    let second_item = common::seed_line_item_at(
        &db,
        second_order,
        "Tour Tee",
        4,
        Some(catalog.product_variant_id),
        base + chrono::Duration::seconds(5),
    )
    .await;

    let session = service
        .create_session("split run".to_string(), vec![first_order, second_order])
        .await
        .unwrap();
    let plan = service.start_session(session.id).await.unwrap();

    let stock_for = |id: Uuid| {
        plan.requirements
            .iter()
            .filter(|r| r.line_item_id == id)
            .filter(|r| r.expected_fulfillment == ExpectedFulfillment::Stock)
            .map(|r| r.quantity)
            .sum::<i32>()
    };
    let print_for = |id: Uuid| {
        plan.requirements
            .iter()
            .filter(|r| r.line_item_id == id)
            .filter(|r| r.expected_fulfillment == ExpectedFulfillment::Print)
            .map(|r| r.quantity)
            .sum::<i32>()
    };

    assert_eq!(stock_for(first_item), 2);
    assert_eq!(print_for(first_item), 0);
    assert_eq!(stock_for(second_item), 1);
    assert_eq!(print_for(second_item), 3);

    let variant = ProductVariant::find_by_id(catalog.product_variant_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.warehouse_inventory, 0);
}

#[tokio::test]
async fn starting_a_second_session_deactivates_the_first() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let catalog = seed_catalog(&db, CatalogSpec::default()).await;
    let first_order = seed_order(&db, "#3001").await;
    seed_line_item(&db, first_order, "Tour Tee", 1, Some(catalog.product_variant_id)).await;
    let second_order = seed_order(&db, "#3002").await;
    seed_line_item(&db, second_order, "Tour Tee", 1, Some(catalog.product_variant_id)).await;

    let first = service
        .create_session("first".to_string(), vec![first_order])
        .await
        .unwrap();
    let second = service
        .create_session("second".to_string(), vec![second_order])
        .await
        .unwrap();

    service.start_session(first.id).await.unwrap();
    service.start_session(second.id).await.unwrap();

    let first = service.get_session(first.id).await.unwrap();
    let second = service.get_session(second.id).await.unwrap();
    assert!(!first.active);
    assert_eq!(first.status, "not_started");
    assert!(second.active);
    assert_eq!(second.status, "active");
}

#[tokio::test]
async fn restarting_a_session_releases_its_earlier_stock_pulls() {
    use printhouse_api::entities::line_item;
    use printhouse_api::services::settlement::SettlementService;
    use sea_orm::{ActiveModelTrait, Set};

    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let catalog = seed_catalog(
        &db,
        CatalogSpec {
            stock: 3,
            ..Default::default()
        },
    )
    .await;
    let order_id = seed_order(&db, "#8001").await;
    let item_id = seed_line_item(&db, order_id, "Tour Tee", 2, Some(catalog.product_variant_id)).await;
    let other_order = seed_order(&db, "#8002").await;

    let session = service
        .create_session("restarted run".to_string(), vec![order_id])
        .await
        .unwrap();
    let other = service
        .create_session("displacing run".to_string(), vec![other_order])
        .await
        .unwrap();

    service.start_session(session.id).await.unwrap();
    service.start_session(other.id).await.unwrap();
    service.start_session(session.id).await.unwrap();

    // The restart returned the first pull before pulling again, so the
    // shelf shows one generation of the pull, not two.
    let variant = ProductVariant::find_by_id(catalog.product_variant_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(variant.warehouse_inventory, 1);

    let rows = InventoryTransaction::find()
        .filter(inventory_transaction::Column::SessionId.eq(session.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().any(|r| r.reason == "restock"));
    assert_eq!(rows.iter().map(|r| r.change_amount).sum::<i32>(), -2);

    let mut done: line_item::ActiveModel = line_item::Entity::find_by_id(item_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap()
        .into();
    done.completion_status = Set("in_stock".to_string());
    done.update(db.as_ref()).await.unwrap();

    let report = SettlementService::new(db.clone())
        .settle(session.id)
        .await
        .unwrap();
    let entry = &report.items[0];
    assert_eq!(entry.expected_change, -2);
    assert_eq!(entry.actual_change, -2);
    assert!(entry.is_clean());
}

#[tokio::test]
async fn settled_sessions_cannot_be_restarted() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let catalog = seed_catalog(&db, CatalogSpec::default()).await;
    let order_id = seed_order(&db, "#4001").await;
    seed_line_item(&db, order_id, "Tour Tee", 1, Some(catalog.product_variant_id)).await;

    let session = service
        .create_session("done run".to_string(), vec![order_id])
        .await
        .unwrap();
    service.start_session(session.id).await.unwrap();
    let settled = service.confirm_settlement(session.id).await.unwrap();
    assert_eq!(settled.status, "settled");
    assert!(!settled.active);
    assert!(settled.settled_at.is_some());

    assert_matches!(
        service.start_session(session.id).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_matches!(
        service.confirm_settlement(session.id).await,
        Err(ServiceError::InvalidOperation(_))
    );
}

#[tokio::test]
async fn settlement_cannot_be_confirmed_without_a_frozen_plan() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let order_id = seed_order(&db, "#5001").await;
    let session = service
        .create_session("never started".to_string(), vec![order_id])
        .await
        .unwrap();

    assert_matches!(
        service.confirm_settlement(session.id).await,
        Err(ServiceError::InvalidOperation(_))
    );
}

#[tokio::test]
async fn sessions_need_at_least_one_order() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    assert_matches!(
        service.create_session("empty".to_string(), Vec::new()).await,
        Err(ServiceError::InvalidInput(_))
    );
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    assert_matches!(
        service.start_session(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn cancelled_orders_are_excluded_from_the_plan() {
    use printhouse_api::entities::order;
    use sea_orm::{ActiveModelTrait, Set};

    let db = common::setup_db().await;
    let service = SessionService::new(db.clone(), common::event_sender());

    let catalog = seed_catalog(&db, CatalogSpec::default()).await;
    let kept_order = seed_order(&db, "#6001").await;
    seed_line_item(&db, kept_order, "Tour Tee", 1, Some(catalog.product_variant_id)).await;
    let cancelled_order = seed_order(&db, "#6002").await;
    seed_line_item(&db, cancelled_order, "Tour Tee", 1, Some(catalog.product_variant_id)).await;

    let mut cancel: order::ActiveModel = printhouse_api::entities::order::Entity::find_by_id(
        cancelled_order,
    )
    .one(db.as_ref())
    .await
    .unwrap()
    .unwrap()
    .into();
    cancel.cancelled = Set(true);
    cancel.update(db.as_ref()).await.unwrap();

    let session = service
        .create_session("filtered".to_string(), vec![kept_order, cancelled_order])
        .await
        .unwrap();
    let plan = service.start_session(session.id).await.unwrap();

    assert_eq!(plan.entries.len(), 1);
    assert!(plan
        .requirements
        .iter()
        .all(|r| r.order_id == kept_order));
}
