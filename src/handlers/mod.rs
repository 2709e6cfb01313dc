//! HTTP surface. Thin translation between requests and the services;
//! everything interesting happens below this layer.

pub mod inventory;
pub mod sessions;

use std::sync::Arc;

use axum::Router;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        inventory::InventoryLedgerService, sessions::SessionService,
        settlement::SettlementService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub session_service: SessionService,
    pub settlement_service: SettlementService,
    pub inventory_service: InventoryLedgerService,
}

impl AppState {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db: db_pool.clone(),
            session_service: SessionService::new(db_pool.clone(), event_sender.clone()),
            settlement_service: SettlementService::new(db_pool.clone()),
            inventory_service: InventoryLedgerService::new(db_pool, event_sender),
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", sessions::router())
        .nest("/inventory", inventory::router())
}
