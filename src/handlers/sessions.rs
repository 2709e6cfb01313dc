use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::production::snapshot::{parse_assembly_plan, parse_picking_requirements};

use super::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, message = "session name must not be empty"))]
    pub name: String,
    pub order_ids: Vec<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", get(get_session))
        .route("/:id/plan", get(plan_preview))
        .route("/:id/start", post(start_session))
        .route("/:id/settlement", get(settlement_report))
        .route("/:id/settle", post(confirm_settlement))
        .route("/:id/transactions", get(session_transactions))
}

async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let session = state
        .session_service
        .create_session(payload.name, payload.order_ids)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": session })),
    ))
}

async fn list_sessions(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let sessions = state.session_service.list_sessions().await?;
    Ok(Json(json!({ "success": true, "data": sessions })))
}

/// Returns the session row with its frozen snapshots parsed back into
/// structured form when present.
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let session = state.session_service.get_session(id).await?;

    let frozen_plan = session
        .assembly_plan
        .as_deref()
        .map(parse_assembly_plan)
        .transpose()?;
    let frozen_requirements = session
        .picking_requirements
        .as_deref()
        .map(parse_picking_requirements)
        .transpose()?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "session": session,
            "frozen_plan": frozen_plan,
            "frozen_requirements": frozen_requirements,
        }
    })))
}

/// Non-freezing preview of the plan as it would be computed right now.
async fn plan_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let plan = state.session_service.plan_preview(id).await?;
    Ok(Json(json!({ "success": true, "data": plan })))
}

async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let plan = state.session_service.start_session(id).await?;
    Ok(Json(json!({ "success": true, "data": plan })))
}

async fn settlement_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.settlement_service.settle(id).await?;
    Ok(Json(json!({ "success": true, "data": report })))
}

async fn confirm_settlement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let session = state.session_service.confirm_settlement(id).await?;
    Ok(Json(json!({ "success": true, "data": session })))
}

async fn session_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let transactions = state.inventory_service.transactions_for_session(id).await?;
    Ok(Json(json!({ "success": true, "data": transactions })))
}
