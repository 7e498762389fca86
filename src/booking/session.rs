//! session.rs
//!
//! Состояние одного прохода по сценарию покупки билета:
//! выбор сеанса -> выбор мест -> оплата.
//!
//! Модуль чистый: никакого I/O, никаких часов. Схема мест приходит снаружи
//! (см. `flow.rs`), здесь только переходы между шагами и учёт выбранных мест.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

use crate::error::{BookingError, ClientError};
use crate::models::{
    BookingRequest, PaymentMethod, Seat, SeatCounts, SeatId, SeatPricing, SeatStatus, Showtime,
};

/// Шаги сценария. Порядок важен: переходы только на соседний шаг.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    SelectingShowtime,
    SelectingSeats,
    Paying,
}

impl BookingStep {
    /// Номер шага для индикатора прогресса (1..=3).
    pub fn number(self) -> u8 {
        match self {
            BookingStep::SelectingShowtime => 1,
            BookingStep::SelectingSeats => 2,
            BookingStep::Paying => 3,
        }
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStep::SelectingShowtime => "selecting showtime",
            BookingStep::SelectingSeats => "selecting seats",
            BookingStep::Paying => "paying",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct BookingSession {
    step: BookingStep,
    pricing: SeatPricing,
    showtime: Option<Showtime>,
    /// Текущая схема зала, меняется только через `toggle_seat`.
    seats: Vec<Seat>,
    /// Схема в том виде, в котором её отдал каталог.
    pristine: Vec<Seat>,
    /// Выбранные места в порядке выбора.
    selected: Vec<SeatId>,
    payment_method: PaymentMethod,
    promotion_code: Option<String>,
}

impl BookingSession {
    pub fn new(pricing: SeatPricing) -> Self {
        Self {
            step: BookingStep::SelectingShowtime,
            pricing,
            showtime: None,
            seats: Vec::new(),
            pristine: Vec::new(),
            selected: Vec::new(),
            payment_method: PaymentMethod::default(),
            promotion_code: None,
        }
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn pricing(&self) -> &SeatPricing {
        &self.pricing
    }

    pub fn selected_showtime(&self) -> Option<&Showtime> {
        self.showtime.as_ref()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, seat_id: &SeatId) -> Option<&Seat> {
        self.seats.iter().find(|seat| &seat.id == seat_id)
    }

    pub fn selected_seats(&self) -> &[SeatId] {
        &self.selected
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub(crate) fn expect_step(
        &self,
        expected: BookingStep,
        operation: &'static str,
    ) -> Result<(), BookingError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(BookingError::InvalidTransition {
                operation,
                step: self.step,
            })
        }
    }

    /// Шаг 1 -> 2. `inventory` - схема зала от каталога для этого сеанса.
    pub fn select_showtime(
        &mut self,
        showtime: Showtime,
        inventory: Vec<Seat>,
    ) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingShowtime, "select_showtime")?;
        check_inventory(&inventory)?;

        self.showtime = Some(showtime);
        self.pristine = inventory.clone();
        self.seats = inventory;
        self.selected.clear();
        self.step = BookingStep::SelectingSeats;
        Ok(())
    }

    /// Переключает место и возвращает его новый статус.
    pub fn toggle_seat(&mut self, seat_id: &SeatId) -> Result<SeatStatus, BookingError> {
        self.expect_step(BookingStep::SelectingSeats, "toggle_seat")?;

        let seat = self
            .seats
            .iter_mut()
            .find(|seat| &seat.id == seat_id)
            .ok_or_else(|| BookingError::UnknownSeat(seat_id.clone()))?;

        match seat.status {
            SeatStatus::Booked => Err(BookingError::SeatUnavailable(seat_id.clone())),
            SeatStatus::Available => {
                seat.status = SeatStatus::Selected;
                self.selected.push(seat_id.clone());
                Ok(SeatStatus::Selected)
            }
            SeatStatus::Selected => {
                seat.status = SeatStatus::Available;
                self.selected.retain(|id| id != seat_id);
                Ok(SeatStatus::Available)
            }
        }
    }

    /// Шаг 2 -> 3.
    pub fn advance_to_payment(&mut self) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingSeats, "advance_to_payment")?;
        if self.selected.is_empty() {
            return Err(BookingError::EmptySelection);
        }
        self.step = BookingStep::Paying;
        Ok(())
    }

    /// Шаг назад. С выбора мест - полный сброс выбора, с оплаты - выбор сохраняется.
    pub fn go_back(&mut self) -> Result<BookingStep, BookingError> {
        match self.step {
            BookingStep::SelectingShowtime => Err(BookingError::InvalidTransition {
                operation: "go_back",
                step: self.step,
            }),
            BookingStep::SelectingSeats => {
                self.seats = self.pristine.clone();
                self.selected.clear();
                self.step = BookingStep::SelectingShowtime;
                Ok(self.step)
            }
            BookingStep::Paying => {
                self.step = BookingStep::SelectingSeats;
                Ok(self.step)
            }
        }
    }

    pub fn choose_payment_method(&mut self, method: PaymentMethod) -> Result<(), BookingError> {
        self.expect_step(BookingStep::Paying, "choose_payment_method")?;
        self.payment_method = method;
        Ok(())
    }

    /// Промокод к заявке. Пустая строка снимает код.
    pub fn apply_promotion_code(&mut self, code: Option<String>) -> Result<(), BookingError> {
        self.expect_step(BookingStep::Paying, "apply_promotion_code")?;
        self.promotion_code = code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(())
    }

    /// Сумма по категориям выбранных мест.
    pub fn total_price(&self) -> u64 {
        self.selected
            .iter()
            .filter_map(|id| self.seat(id))
            .map(|seat| self.pricing.price_of(seat.category))
            .sum()
    }

    pub fn seat_counts(&self) -> SeatCounts {
        SeatCounts::tally(&self.seats)
    }

    /// Собирает и валидирует заявку. Только на шаге оплаты.
    pub fn booking_request(&self) -> Result<BookingRequest, BookingError> {
        self.expect_step(BookingStep::Paying, "submit")?;
        let showtime = self.showtime.as_ref().ok_or(BookingError::InvalidTransition {
            operation: "submit",
            step: self.step,
        })?;

        let request = BookingRequest {
            showtime_id: showtime.id.clone(),
            seat_ids: self.selected.clone(),
            total_price: self.total_price(),
            payment_method: self.payment_method,
            promotion_code: self.promotion_code.clone(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            step: self.step,
            step_number: self.step.number(),
            showtime: self.showtime.clone(),
            seats: self.seats.clone(),
            selected_seats: self.selected.clone(),
            counts: self.seat_counts(),
            total_price: self.total_price(),
            payment_method: self.payment_method,
            promotion_code: self.promotion_code.clone(),
        }
    }
}

// Каталог обещает только available/booked и уникальные id
fn check_inventory(inventory: &[Seat]) -> Result<(), ClientError> {
    let mut seen = HashSet::with_capacity(inventory.len());
    for seat in inventory {
        if !seen.insert(&seat.id) {
            return Err(ClientError::InvalidInventory(format!(
                "duplicate seat {}",
                seat.id
            )));
        }
        if seat.status == SeatStatus::Selected {
            return Err(ClientError::InvalidInventory(format!(
                "seat {} arrived already selected",
                seat.id
            )));
        }
    }
    Ok(())
}

/// То, что отдаётся UI для отрисовки текущего шага.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub step: BookingStep,
    pub step_number: u8,
    pub showtime: Option<Showtime>,
    pub seats: Vec<Seat>,
    pub selected_seats: Vec<SeatId>,
    pub counts: SeatCounts,
    pub total_price: u64,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
}
