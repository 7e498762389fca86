use thiserror::Error;

use crate::booking::BookingStep;
use crate::models::SeatId;

/// Ошибки обращения к внешнему бэкенду (каталог, бронирования).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("circuit breaker is open - backend temporarily unavailable")]
    CircuitOpen,
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("booking rejected: {reason}")]
    Rejected { reason: String },
    #[error("seat inventory rejected: {0}")]
    InvalidInventory(String),
}

impl ClientError {
    /// Сбои, которые считает Circuit Breaker. Отказ бэкенда по бизнес-причине сюда не входит.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{operation} is not allowed while {step}")]
    InvalidTransition {
        operation: &'static str,
        step: BookingStep,
    },
    #[error("seat {0} does not exist for this showtime")]
    UnknownSeat(SeatId),
    #[error("showtime {0} is not scheduled for this movie")]
    UnknownShowtime(String),
    #[error("seat {0} is already booked")]
    SeatUnavailable(SeatId),
    #[error("select at least one seat before paying")]
    EmptySelection,
    #[error("booking request is invalid: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),
    #[error(transparent)]
    CollaboratorFailure(#[from] ClientError),
    #[error("booking session was cancelled")]
    Cancelled,
    #[error("another operation on this booking session is still running")]
    Busy,
    #[error("booking session not found")]
    SessionNotFound,
    #[error("booking session belongs to another user")]
    Forbidden,
}

impl BookingError {
    /// Короткий код для UI, по нему показывается подсказка.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::UnknownSeat(_) => "unknown_seat",
            BookingError::UnknownShowtime(_) => "unknown_showtime",
            BookingError::SeatUnavailable(_) => "seat_unavailable",
            BookingError::EmptySelection => "empty_selection",
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::CollaboratorFailure(_) => "collaborator_failure",
            BookingError::Cancelled => "cancelled",
            BookingError::Busy => "busy",
            BookingError::SessionNotFound => "session_not_found",
            BookingError::Forbidden => "forbidden",
        }
    }

    /// Дефекты вызывающей стороны: UI не должен был позволить такой вызов.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            BookingError::InvalidTransition { .. } | BookingError::UnknownSeat(_)
        )
    }

    /// Ожидаемые ошибки, после которых сессия продолжает жить без изменений.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BookingError::SeatUnavailable(_)
                | BookingError::EmptySelection
                | BookingError::InvalidRequest(_)
                | BookingError::UnknownShowtime(_)
                | BookingError::CollaboratorFailure(_)
                | BookingError::Busy
        )
    }
}
