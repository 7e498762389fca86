//! flow.rs
//!
//! Асинхронная обвязка вокруг `BookingSession`.
//!
//! Сессия переходит на шаг выбора мест только после того, как схема зала
//! загружена. Пока загрузка идёт, сессию может отменить пользователь (ушёл со
//! страницы) - тогда ответ каталога выбрасывается и состояние не трогается.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::session::{BookingSession, BookingStep, SessionSnapshot};
use crate::auth::AuthSession;
use crate::error::BookingError;
use crate::models::{
    BookingConfirmation, BookingRequest, PaymentMethod, Seat, SeatId, SeatPricing, SeatStatus,
    Showtime,
};
use crate::services::{BookingGateway, CatalogService};

/// Внешние сервисы, нужные сценарию бронирования.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogService>,
    pub gateway: Arc<dyn BookingGateway>,
}

pub struct BookingFlow {
    id: Uuid,
    movie_id: String,
    session: BookingSession,
    collaborators: Collaborators,
    auth: Option<AuthSession>,
    /// Жизнь сессии: отменён - значит пользователь ушёл.
    cancel: CancellationToken,
    finished: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub session_id: Uuid,
    pub movie_id: String,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

impl BookingFlow {
    pub fn new(
        movie_id: impl Into<String>,
        pricing: SeatPricing,
        collaborators: Collaborators,
        auth: Option<AuthSession>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            movie_id: movie_id.into(),
            session: BookingSession::new(pricing),
            collaborators,
            auth,
            cancel,
            finished: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &BookingSession {
        &self.session
    }

    pub fn auth(&self) -> Option<&AuthSession> {
        self.auth.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Пользователь ушёл: всё, что ещё в полёте, будет выброшено.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            session_id: self.id,
            movie_id: self.movie_id.clone(),
            session: self.session.snapshot(),
        }
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), BookingError> {
        if self.cancel.is_cancelled() {
            return Err(BookingError::Cancelled);
        }
        if self.finished {
            return Err(BookingError::InvalidTransition {
                operation,
                step: self.session.step(),
            });
        }
        Ok(())
    }

    // Логируем по тяжести: дефекты - error, подсказки - warn
    fn observe<T>(
        &self,
        operation: &str,
        result: Result<T, BookingError>,
    ) -> Result<T, BookingError> {
        if let Err(e) = &result {
            let step = self.session.step();
            if e.is_defect() {
                error!(session = %self.id, step = %step, "{} rejected: {}", operation, e);
            } else {
                warn!(session = %self.id, step = %step, "{} failed: {}", operation, e);
            }
        }
        result
    }

    /// Шаг 1 -> 2 по идентификатору сеанса: ищем сеанс в расписании фильма.
    pub async fn select_showtime_by_id(&mut self, showtime_id: &str) -> Result<(), BookingError> {
        let result = self.resolve_showtime(showtime_id).await;
        let showtime = self.observe("select_showtime", result)?;
        self.select_showtime(showtime).await
    }

    async fn resolve_showtime(&self, showtime_id: &str) -> Result<Showtime, BookingError> {
        self.ensure_live("select_showtime")?;
        self.session
            .expect_step(BookingStep::SelectingShowtime, "select_showtime")?;

        let catalog = &self.collaborators.catalog;
        let showtimes = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(BookingError::Cancelled),
            res = catalog.list_showtimes(&self.movie_id, self.auth.as_ref()) => res?,
        };

        showtimes
            .into_iter()
            .find(|s| s.id == showtime_id)
            .ok_or_else(|| BookingError::UnknownShowtime(showtime_id.to_string()))
    }

    /// Шаг 1 -> 2: загружает схему зала и переходит к выбору мест.
    pub async fn select_showtime(&mut self, showtime: Showtime) -> Result<(), BookingError> {
        let result = self.load_inventory(&showtime).await;
        let inventory = self.observe("select_showtime", result)?;

        let result = self.session.select_showtime(showtime, inventory);
        self.observe("select_showtime", result)?;

        let counts = self.session.seat_counts();
        info!(
            session = %self.id,
            "Showtime selected, {} seats available, {} booked",
            counts.available, counts.booked
        );
        Ok(())
    }

    async fn load_inventory(&self, showtime: &Showtime) -> Result<Vec<Seat>, BookingError> {
        self.ensure_live("select_showtime")?;
        // Проверяем шаг до похода в каталог, а не после
        self.session
            .expect_step(BookingStep::SelectingShowtime, "select_showtime")?;

        let catalog = &self.collaborators.catalog;
        let inventory = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(BookingError::Cancelled),
            res = catalog.seat_inventory(&showtime.id, self.auth.as_ref()) => res,
        };

        // Ответ пришёл, но сессию уже бросили - выкидываем его
        if self.cancel.is_cancelled() {
            debug!(
                session = %self.id,
                "Dropping stale seat inventory for showtime {}", showtime.id
            );
            return Err(BookingError::Cancelled);
        }

        Ok(inventory?)
    }

    pub fn toggle_seat(&mut self, seat_id: &SeatId) -> Result<SeatStatus, BookingError> {
        let result = self
            .ensure_live("toggle_seat")
            .and_then(|_| self.session.toggle_seat(seat_id));
        let status = self.observe("toggle_seat", result)?;
        debug!(session = %self.id, seat = %seat_id, "Seat is now {:?}", status);
        Ok(status)
    }

    pub fn advance_to_payment(&mut self) -> Result<(), BookingError> {
        let result = self
            .ensure_live("advance_to_payment")
            .and_then(|_| self.session.advance_to_payment());
        self.observe("advance_to_payment", result)?;
        info!(
            session = %self.id,
            "Proceeding to payment with {} seats, total {}",
            self.session.selected_seats().len(),
            self.session.total_price()
        );
        Ok(())
    }

    pub fn go_back(&mut self) -> Result<BookingStep, BookingError> {
        let result = self
            .ensure_live("go_back")
            .and_then(|_| self.session.go_back());
        let step = self.observe("go_back", result)?;
        debug!(session = %self.id, "Went back to {}", step);
        Ok(step)
    }

    pub fn choose_payment_method(&mut self, method: PaymentMethod) -> Result<(), BookingError> {
        let result = self
            .ensure_live("choose_payment_method")
            .and_then(|_| self.session.choose_payment_method(method));
        self.observe("choose_payment_method", result)
    }

    pub fn apply_promotion_code(&mut self, code: Option<String>) -> Result<(), BookingError> {
        let result = self
            .ensure_live("apply_promotion_code")
            .and_then(|_| self.session.apply_promotion_code(code));
        self.observe("apply_promotion_code", result)
    }

    /// Отправляет заявку. При успехе сессия закрыта и вызывающий её выбрасывает,
    /// при ошибке остаёмся на шаге оплаты с тем же выбором. Повторов нет.
    pub async fn submit(&mut self) -> Result<BookingConfirmation, BookingError> {
        let result = self.send_booking().await;
        let confirmation = self.observe("submit", result)?;

        self.finished = true;
        info!(
            session = %self.id,
            "Booking accepted: {:?}",
            confirmation.booking_id
        );
        Ok(confirmation)
    }

    async fn send_booking(&self) -> Result<BookingConfirmation, BookingError> {
        self.ensure_live("submit")?;
        let request = self.session.booking_request()?;
        let key = idempotency_key(self.id, &request);

        let gateway = &self.collaborators.gateway;
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(BookingError::Cancelled),
            res = gateway.submit_booking(&request, &key, self.auth.as_ref()) => res,
        };

        if self.cancel.is_cancelled() {
            return Err(BookingError::Cancelled);
        }

        Ok(result?)
    }
}

/// Ключ идемпотентности: одна и та же заявка из одной сессии даёт один ключ.
pub fn idempotency_key(session_id: Uuid, request: &BookingRequest) -> String {
    let seats: Vec<&str> = request.seat_ids.iter().map(SeatId::as_str).collect();
    let token_string = format!(
        "{}|{}|{}|{}|{}",
        session_id,
        request.showtime_id,
        seats.join(","),
        request.total_price,
        request.promotion_code.as_deref().unwrap_or("")
    );
    let mut hasher = Sha256::new();
    hasher.update(token_string.as_bytes());
    format!("{:x}", hasher.finalize())
}
