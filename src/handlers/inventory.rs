use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    entities::inventory_transaction::TransactionReason,
    errors::ServiceError,
    services::inventory::{AdjustmentContext, InventoryTarget},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustInventoryRequest {
    pub blank_variant_id: Option<Uuid>,
    pub product_variant_id: Option<Uuid>,
    pub change_amount: i32,
    pub reason: String,
    pub session_id: Option<Uuid>,
    pub line_item_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPrintRequest {
    pub session_id: Uuid,
    pub line_item_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RecordMisprintRequest {
    pub session_id: Uuid,
    pub line_item_id: Uuid,
    pub units: i32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(adjust_inventory))
        .route("/prints", post(record_print))
        .route("/misprints", post(record_misprint))
}

/// Manual ledger adjustment against exactly one SKU.
async fn adjust_inventory(
    State(state): State<AppState>,
    Json(payload): Json<AdjustInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let target = match (payload.blank_variant_id, payload.product_variant_id) {
        (Some(id), None) => InventoryTarget::BlankVariant(id),
        (None, Some(id)) => InventoryTarget::ProductVariant(id),
        _ => {
            return Err(ServiceError::InvalidInput(
                "exactly one of blank_variant_id or product_variant_id is required".to_string(),
            ))
        }
    };

    let reason = TransactionReason::from_str(&payload.reason).ok_or_else(|| {
        ServiceError::InvalidInput(format!("unknown adjustment reason '{}'", payload.reason))
    })?;

    let transaction = state
        .inventory_service
        .adjust(
            target,
            payload.change_amount,
            reason,
            AdjustmentContext {
                session_id: payload.session_id,
                line_item_id: payload.line_item_id,
                audit_log_id: None,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": transaction })),
    ))
}

async fn record_print(
    State(state): State<AppState>,
    Json(payload): Json<RecordPrintRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state
        .inventory_service
        .record_print(payload.session_id, payload.line_item_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": transaction })),
    ))
}

async fn record_misprint(
    State(state): State<AppState>,
    Json(payload): Json<RecordMisprintRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state
        .inventory_service
        .record_misprint(payload.session_id, payload.line_item_id, payload.units)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": transaction })),
    ))
}
