pub mod booking;
pub mod catalog;

use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{BookingError, ClientError};
use crate::AppContext;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .merge(catalog::routes())
        .merge(booking::routes())
}

/// Полный роутер сервиса.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", routes())
        .with_state(ctx)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// --- Ошибки API ---

#[derive(Debug, Serialize)]
pub struct ApiError {
    success: bool,
    code: &'static str,
    message: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn to_api_error(
    status: StatusCode,
    code: &'static str,
    message: &str,
) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            success: false,
            code,
            message: message.to_string(),
        }),
    )
}

pub fn status_for(err: &BookingError) -> StatusCode {
    match err {
        BookingError::InvalidTransition { .. } => StatusCode::CONFLICT,
        BookingError::UnknownSeat(_) | BookingError::UnknownShowtime(_) => StatusCode::NOT_FOUND,
        BookingError::SeatUnavailable(_) => StatusCode::CONFLICT,
        BookingError::EmptySelection | BookingError::InvalidRequest(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingError::CollaboratorFailure(ClientError::CircuitOpen) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        BookingError::CollaboratorFailure(_) => StatusCode::BAD_GATEWAY,
        BookingError::Cancelled => StatusCode::GONE,
        BookingError::Busy => StatusCode::TOO_MANY_REQUESTS,
        BookingError::SessionNotFound => StatusCode::NOT_FOUND,
        BookingError::Forbidden => StatusCode::FORBIDDEN,
    }
}

pub fn booking_error(err: BookingError) -> (StatusCode, Json<ApiError>) {
    to_api_error(status_for(&err), err.code(), &err.to_string())
}

pub fn catalog_error(err: ClientError) -> (StatusCode, Json<ApiError>) {
    match err {
        ClientError::Status { status: 404, .. } => {
            to_api_error(StatusCode::NOT_FOUND, "not_found", &err.to_string())
        }
        other => booking_error(BookingError::CollaboratorFailure(other)),
    }
}
