//! backend.rs
//!
//! HTTP-клиент к REST бэкенду кинотеатра.
//!
//! 1.  Каталог: фильмы, кинотеатры, сеансы фильма, схема зала для сеанса.
//! 2.  Приём бронирований: `POST /bookings` с ключом идемпотентности.
//!
//! Все вызовы проходят через `CircuitBreaker`; токен пользователя
//! пробрасывается из `AuthSession`, если он есть.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitState};
use super::{BookingGateway, CatalogService};
use crate::auth::AuthSession;
use crate::config::{BackendConfig, CircuitBreakerConfig};
use crate::error::ClientError;
use crate::models::{BookingConfirmation, BookingRequest, Movie, Seat, Showtime, Theater};

/// Ответ бэкенда на заявку.
#[derive(Debug, Deserialize)]
struct BookingSubmitResponse {
    success: bool,
    #[serde(rename = "bookingId", alias = "booking_id")]
    booking_id: Option<String>,
    message: Option<String>,
}

/// Тело ошибки, которое бэкенд отдаёт на 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    /// Базовый URL, например `http://localhost:5000/api`.
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl BackendClient {
    pub fn from_config(
        config: &BackendConfig,
        breaker: &CircuitBreakerConfig,
    ) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                Duration::from_secs(breaker.timeout_seconds),
            )),
        })
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(request: RequestBuilder, auth: Option<&AuthSession>) -> RequestBuilder {
        match auth {
            Some(auth) => {
                request.header(reqwest::header::AUTHORIZATION, auth.authorization_header())
            }
            None => request,
        }
    }

    /// Выполняет операцию, пропуская её через Circuit Breaker.
    async fn execute_with_circuit_breaker<F, T>(&self, operation: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking backend request");
            return Err(ClientError::CircuitOpen);
        }

        match operation.await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) if e.is_transient() => {
                error!("Backend request failed: {}", e);
                self.circuit_breaker.record_failure();
                Err(e)
            }
            // Бэкенд ответил осмысленно, значит он жив
            Err(e) => {
                self.circuit_breaker.record_success();
                Err(e)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: Option<&AuthSession>,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        let operation = async {
            let response = Self::authorize(self.http_client.get(&url), auth)
                .send()
                .await?;
            error_for_status(response)
                .await?
                .json::<T>()
                .await
                .map_err(ClientError::from)
        };

        self.execute_with_circuit_breaker(operation).await
    }
}

// Превращает не-2xx ответ в `ClientError::Status` с сообщением бэкенда
async fn error_for_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CatalogService for BackendClient {
    async fn list_movies(&self, auth: Option<&AuthSession>) -> Result<Vec<Movie>, ClientError> {
        self.get_json("movie/get-all-movies", auth).await
    }

    async fn get_movie(
        &self,
        movie_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Movie, ClientError> {
        self.get_json(&format!("movie/{}", movie_id), auth).await
    }

    async fn list_theaters(&self, auth: Option<&AuthSession>) -> Result<Vec<Theater>, ClientError> {
        self.get_json("theaters", auth).await
    }

    async fn list_showtimes(
        &self,
        movie_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<Showtime>, ClientError> {
        self.get_json(&format!("showtimes/movie/{}", movie_id), auth)
            .await
    }

    async fn seat_inventory(
        &self,
        showtime_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<Seat>, ClientError> {
        info!("Loading seat inventory for showtime {}", showtime_id);
        self.get_json(&format!("showtimes/{}/seats", showtime_id), auth)
            .await
    }
}

#[async_trait]
impl BookingGateway for BackendClient {
    async fn submit_booking(
        &self,
        request: &BookingRequest,
        idempotency_key: &str,
        auth: Option<&AuthSession>,
    ) -> Result<BookingConfirmation, ClientError> {
        info!(
            "Submitting booking: showtime={}, seats={}, total={}",
            request.showtime_id,
            request.seat_ids.len(),
            request.total_price
        );
        info!("Circuit breaker state: {:?}", self.circuit_breaker.state());

        let url = self.url("bookings");
        let operation = async {
            let response = Self::authorize(self.http_client.post(&url), auth)
                .header("Idempotency-Key", idempotency_key)
                .json(request)
                .send()
                .await?;
            error_for_status(response)
                .await?
                .json::<BookingSubmitResponse>()
                .await
                .map_err(ClientError::from)
        };

        let response = self.execute_with_circuit_breaker(operation).await?;
        if !response.success {
            return Err(ClientError::Rejected {
                reason: response
                    .message
                    .unwrap_or_else(|| "booking was not accepted".to_string()),
            });
        }

        Ok(BookingConfirmation {
            booking_id: response.booking_id,
            message: response.message,
            showtime_id: request.showtime_id.clone(),
            seat_ids: request.seat_ids.clone(),
            total_price: request.total_price,
        })
    }
}
