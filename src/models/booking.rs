use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

use super::SeatId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Momo,
    Vnpay,
    Card,
}

/// Заявка на бронирование, уходит в бэкенд на шаге оплаты.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[validate(length(min = 1))]
    pub showtime_id: String,
    #[validate(length(min = 1), custom(function = "distinct_seats"))]
    pub seat_ids: Vec<SeatId>,
    #[validate(range(min = 1))]
    pub total_price: u64,
    pub payment_method: PaymentMethod,
    /// Промокод применяет бэкенд, здесь только передаём его дальше.
    #[validate(length(min = 1, max = 32))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
}

fn distinct_seats(seat_ids: &[SeatId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(seat_ids.len());
    if seat_ids.iter().all(|id| seen.insert(id)) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_seat"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: Option<String>,
    pub message: Option<String>,
    pub showtime_id: String,
    pub seat_ids: Vec<SeatId>,
    pub total_price: u64,
}
