pub mod backend;
pub mod circuit_breaker;

use async_trait::async_trait;

use crate::auth::AuthSession;
use crate::error::ClientError;
use crate::models::{BookingConfirmation, BookingRequest, Movie, Seat, Showtime, Theater};

/// Каталог: фильмы, кинотеатры, сеансы и схема зала.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_movies(&self, auth: Option<&AuthSession>) -> Result<Vec<Movie>, ClientError>;

    async fn get_movie(
        &self,
        movie_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Movie, ClientError>;

    async fn list_theaters(&self, auth: Option<&AuthSession>) -> Result<Vec<Theater>, ClientError>;

    async fn list_showtimes(
        &self,
        movie_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<Showtime>, ClientError>;

    /// Схема зала на момент запроса. Статусы только `available` и `booked`.
    async fn seat_inventory(
        &self,
        showtime_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<Seat>, ClientError>;
}

/// Приём заявки на бронирование и оплату.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn submit_booking(
        &self,
        request: &BookingRequest,
        idempotency_key: &str,
        auth: Option<&AuthSession>,
    ) -> Result<BookingConfirmation, ClientError>;
}
