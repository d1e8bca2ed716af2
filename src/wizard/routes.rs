//! REST endpoints driving a wizard session.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiError, AppState, AuthUser};
use crate::notify::Notification;
use crate::payment::{OrderStatus, PaymentOrder};

use super::manager::Transition;
use super::model::SelectionsUpdate;
use super::session::{Confirmation, SessionStatus};
use super::stage::Stage;

#[derive(Debug, Deserialize)]
struct JumpRequest {
    stage_index: usize,
}

#[derive(Debug, Serialize)]
struct OrderConfirmed {
    order_id: String,
    status: OrderStatus,
}

/// POST /api/wizard
async fn create_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> impl IntoResponse {
    let status = state.wizard.create(&user).await;
    (StatusCode::CREATED, Json(status))
}

/// GET /api/wizard/{id}
async fn get_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatus>, ApiError> {
    Ok(Json(state.wizard.status(id, &user).await?))
}

/// DELETE /api/wizard/{id}
async fn abandon_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.wizard.abandon(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/wizard/{id}/selections
async fn update_selections(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<SelectionsUpdate>,
) -> Result<Json<SessionStatus>, ApiError> {
    Ok(Json(state.wizard.update_selections(id, &user, update).await?))
}

/// POST /api/wizard/{id}/selections/reset
async fn reset_selections(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatus>, ApiError> {
    Ok(Json(state.wizard.reset_selections(id, &user).await?))
}

/// POST /api/wizard/{id}/advance
async fn advance(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Transition>, ApiError> {
    Ok(Json(state.wizard.advance(id, &user).await?))
}

/// POST /api/wizard/{id}/retreat
async fn retreat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Transition>, ApiError> {
    Ok(Json(state.wizard.retreat(id, &user).await?))
}

/// POST /api/wizard/{id}/jump
async fn jump(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<JumpRequest>,
) -> Result<Json<Transition>, ApiError> {
    let stage = Stage::from_index(req.stage_index).ok_or_else(|| ApiError::Invalid {
        message: format!(
            "Stage index {} is out of range (0..{})",
            req.stage_index,
            Stage::COUNT
        ),
        fields: Vec::new(),
    })?;
    Ok(Json(state.wizard.jump_to(id, &user, stage).await?))
}

/// POST /api/wizard/{id}/submit
async fn submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Confirmation>, ApiError> {
    let confirmation = state.wizard.submit(id, &user).await?;
    info!(uid = %user.uid, domain = %confirmation.domain_name, "Website submitted for approval");
    Ok(Json(confirmation))
}

/// GET /api/wizard/{id}/notifications
async fn notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.wizard.notifications(id, &user).await?))
}

/// DELETE /api/wizard/{id}/notifications/{notification_id}
async fn dismiss_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, notification_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    if state
        .wizard
        .dismiss_notification(id, &user, notification_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "Notification not found: {notification_id}"
        )))
    }
}

/// POST /api/wizard/{id}/payment/orders
async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentOrder>, ApiError> {
    Ok(Json(state.wizard.create_payment_order(id, &user).await?))
}

/// POST /api/wizard/{id}/payment/orders/{order_id}/confirm
async fn confirm_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, order_id)): Path<(Uuid, String)>,
) -> Result<Json<OrderConfirmed>, ApiError> {
    let status = state
        .wizard
        .confirm_payment_order(id, &user, &order_id)
        .await?;
    Ok(Json(OrderConfirmed { order_id, status }))
}

/// Build the wizard REST routes. State is supplied by the caller.
pub fn wizard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wizard", post(create_session))
        .route("/api/wizard/{id}", get(get_session).delete(abandon_session))
        .route("/api/wizard/{id}/selections", patch(update_selections))
        .route("/api/wizard/{id}/selections/reset", post(reset_selections))
        .route("/api/wizard/{id}/advance", post(advance))
        .route("/api/wizard/{id}/retreat", post(retreat))
        .route("/api/wizard/{id}/jump", post(jump))
        .route("/api/wizard/{id}/submit", post(submit))
        .route("/api/wizard/{id}/notifications", get(notifications))
        .route(
            "/api/wizard/{id}/notifications/{notification_id}",
            delete(dismiss_notification),
        )
        .route("/api/wizard/{id}/payment/orders", post(create_order))
        .route(
            "/api/wizard/{id}/payment/orders/{order_id}/confirm",
            post(confirm_order),
        )
}
