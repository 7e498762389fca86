use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{booking_error, to_api_error, ApiError, ApiResult};
use crate::booking::{FlowSnapshot, SessionGuard};
use crate::error::BookingError;
use crate::middleware::CurrentUser;
use crate::models::{BookingConfirmation, PaymentMethod, SeatId, SeatStatus};
use crate::AppContext;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/booking/sessions", post(create_session))
        .route(
            "/booking/sessions/{id}",
            get(get_session).delete(discard_session),
        )
        .route("/booking/sessions/{id}/showtime", post(select_showtime))
        .route("/booking/sessions/{id}/seats/toggle", post(toggle_seat))
        .route("/booking/sessions/{id}/payment", post(advance_to_payment))
        .route("/booking/sessions/{id}/payment-method", put(choose_payment_method))
        .route("/booking/sessions/{id}/back", post(go_back))
        .route("/booking/sessions/{id}/submit", post(submit))
}

/* ---------- helpers ---------- */

fn checkout(ctx: &AppContext, id: Uuid, user: &CurrentUser) -> ApiResult<SessionGuard> {
    ctx.sessions
        .checkout(id, user.subject())
        .map_err(booking_error)
}

// Дефект вызывающей стороны фатален только для этой сессии: выбрасываем её
fn fail(
    ctx: &AppContext,
    id: Uuid,
    user: &CurrentUser,
    err: BookingError,
) -> (StatusCode, Json<ApiError>) {
    if matches!(err, BookingError::InvalidTransition { .. }) {
        let _ = ctx.sessions.discard(id, user.subject());
    }
    booking_error(err)
}

/* ---------- SESSIONS ---------- */

// POST /api/booking/sessions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    movie_id: String,
}

async fn create_session(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.movie_id.trim().is_empty() {
        return Err(to_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_request",
            "movieId must not be empty",
        ));
    }

    let id = ctx.sessions.create(req.movie_id, user.0.clone());
    let flow = checkout(&ctx, id, &user)?;
    Ok((StatusCode::CREATED, Json(flow.snapshot())))
}

// GET /api/booking/sessions/{id}
async fn get_session(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FlowSnapshot>> {
    let flow = checkout(&ctx, id, &user)?;
    Ok(Json(flow.snapshot()))
}

// DELETE /api/booking/sessions/{id} - пользователь ушёл со страницы
async fn discard_session(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.sessions
        .discard(id, user.subject())
        .map_err(booking_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- STEPS ---------- */

// POST /api/booking/sessions/{id}/showtime
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectShowtimeRequest {
    showtime_id: String,
}

async fn select_showtime(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectShowtimeRequest>,
) -> ApiResult<Json<FlowSnapshot>> {
    let mut flow = checkout(&ctx, id, &user)?;
    flow.select_showtime_by_id(&req.showtime_id)
        .await
        .map_err(|e| fail(&ctx, id, &user, e))?;
    Ok(Json(flow.snapshot()))
}

// POST /api/booking/sessions/{id}/seats/toggle
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleSeatRequest {
    seat_id: SeatId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleSeatResponse {
    seat_id: SeatId,
    status: SeatStatus,
    session: FlowSnapshot,
}

async fn toggle_seat(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleSeatRequest>,
) -> ApiResult<Json<ToggleSeatResponse>> {
    let mut flow = checkout(&ctx, id, &user)?;
    let status = flow
        .toggle_seat(&req.seat_id)
        .map_err(|e| fail(&ctx, id, &user, e))?;
    Ok(Json(ToggleSeatResponse {
        seat_id: req.seat_id,
        status,
        session: flow.snapshot(),
    }))
}

// POST /api/booking/sessions/{id}/payment
async fn advance_to_payment(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FlowSnapshot>> {
    let mut flow = checkout(&ctx, id, &user)?;
    flow.advance_to_payment()
        .map_err(|e| fail(&ctx, id, &user, e))?;
    Ok(Json(flow.snapshot()))
}

// PUT /api/booking/sessions/{id}/payment-method
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentMethodRequest {
    method: PaymentMethod,
    #[serde(default)]
    promotion_code: Option<String>,
}

async fn choose_payment_method(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentMethodRequest>,
) -> ApiResult<Json<FlowSnapshot>> {
    let mut flow = checkout(&ctx, id, &user)?;
    flow.choose_payment_method(req.method)
        .and_then(|_| flow.apply_promotion_code(req.promotion_code))
        .map_err(|e| fail(&ctx, id, &user, e))?;
    Ok(Json(flow.snapshot()))
}

// POST /api/booking/sessions/{id}/back
async fn go_back(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FlowSnapshot>> {
    let mut flow = checkout(&ctx, id, &user)?;
    flow.go_back().map_err(|e| fail(&ctx, id, &user, e))?;
    Ok(Json(flow.snapshot()))
}

// POST /api/booking/sessions/{id}/submit
async fn submit(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BookingConfirmation>> {
    let mut flow = checkout(&ctx, id, &user)?;
    let confirmation = flow
        .submit()
        .await
        .map_err(|e| fail(&ctx, id, &user, e))?;

    // Бронь принята - сессия больше не нужна
    drop(flow);
    let _ = ctx.sessions.discard(id, user.subject());
    Ok(Json(confirmation))
}
