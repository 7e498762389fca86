#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cinema_booking::auth::AuthSession;
use cinema_booking::booking::Collaborators;
use cinema_booking::config::{
    AppConfig, BackendConfig, CircuitBreakerConfig, Config, FeatureFlags, JwtConfig, RedisConfig,
    SessionConfig,
};
use cinema_booking::error::ClientError;
use cinema_booking::models::{
    BookingConfirmation, BookingRequest, Movie, Seat, SeatCategory, SeatPricing, SeatStatus,
    Showtime, Theater,
};
use cinema_booking::services::{BookingGateway, CatalogService};

pub fn showtime(id: &str, day: u32, hour: u32) -> Showtime {
    Showtime {
        id: id.to_string(),
        movie_id: Some("m1".to_string()),
        theater_id: Some("t1".to_string()),
        date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
        time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
    }
}

/// Маленький зал: A1-A3 стандарт (A3 занято), D4 VIP, H1 парное.
pub fn hall() -> Vec<Seat> {
    vec![
        Seat::new("A1", SeatCategory::Standard, SeatStatus::Available),
        Seat::new("A2", SeatCategory::Standard, SeatStatus::Available),
        Seat::new("A3", SeatCategory::Standard, SeatStatus::Booked),
        Seat::new("D4", SeatCategory::Vip, SeatStatus::Available),
        Seat::new("H1", SeatCategory::Couple, SeatStatus::Available),
    ]
}

/// Бэкенд в памяти: отвечает заранее заданными данными и запоминает заявки.
pub struct FakeBackend {
    pub showtimes: Vec<Showtime>,
    pub inventory: Vec<Seat>,
    pub inventory_delay: Duration,
    pub submit_delay: Duration,
    pub reject_with: Option<String>,
    pub submitted: Mutex<Vec<(BookingRequest, String)>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            showtimes: vec![showtime("S1", 4, 18), showtime("S2", 4, 13), showtime("S3", 5, 10)],
            inventory: hall(),
            inventory_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            reject_with: None,
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            catalog: self.clone(),
            gateway: self.clone(),
        }
    }

    pub fn submissions(&self) -> Vec<(BookingRequest, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogService for FakeBackend {
    async fn list_movies(&self, _: Option<&AuthSession>) -> Result<Vec<Movie>, ClientError> {
        Ok(vec![
            Movie {
                id: "m1".to_string(),
                title: "Dune".to_string(),
                poster: None,
                release_date: None,
                duration: Some(155),
            },
            // Далёкая премьера, всегда в "скоро"
            Movie {
                id: "m2".to_string(),
                title: "Dune: Messiah".to_string(),
                poster: None,
                release_date: NaiveDate::from_ymd_opt(2099, 12, 18),
                duration: None,
            },
        ])
    }

    async fn get_movie(&self, id: &str, auth: Option<&AuthSession>) -> Result<Movie, ClientError> {
        self.list_movies(auth)
            .await?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: "Movie not found".to_string(),
            })
    }

    async fn list_theaters(&self, _: Option<&AuthSession>) -> Result<Vec<Theater>, ClientError> {
        Ok(vec![Theater {
            id: "t1".to_string(),
            name: "My Cinema Quận 1".to_string(),
            address: "123 Lê Lợi".to_string(),
            image: None,
            facilities: vec!["IMAX".to_string()],
        }])
    }

    async fn list_showtimes(
        &self,
        _: &str,
        _: Option<&AuthSession>,
    ) -> Result<Vec<Showtime>, ClientError> {
        Ok(self.showtimes.clone())
    }

    async fn seat_inventory(
        &self,
        _: &str,
        _: Option<&AuthSession>,
    ) -> Result<Vec<Seat>, ClientError> {
        if !self.inventory_delay.is_zero() {
            tokio::time::sleep(self.inventory_delay).await;
        }
        Ok(self.inventory.clone())
    }
}

#[async_trait]
impl BookingGateway for FakeBackend {
    async fn submit_booking(
        &self,
        request: &BookingRequest,
        idempotency_key: &str,
        _: Option<&AuthSession>,
    ) -> Result<BookingConfirmation, ClientError> {
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        self.submitted
            .lock()
            .unwrap()
            .push((request.clone(), idempotency_key.to_string()));

        if let Some(reason) = &self.reject_with {
            return Err(ClientError::Rejected {
                reason: reason.clone(),
            });
        }

        Ok(BookingConfirmation {
            booking_id: Some("B-1".to_string()),
            message: None,
            showtime_id: request.showtime_id.clone(),
            seat_ids: request.seat_ids.clone(),
            total_price: request.total_price,
        })
    }
}

pub fn test_config(backend_url: &str, enable_auth: bool) -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            rust_log: "info".to_string(),
            log_format: "text".to_string(),
        },
        backend: BackendConfig {
            base_url: backend_url.to_string(),
            timeout_seconds: 5,
        },
        redis: RedisConfig {
            url: None,
            catalog_ttl_seconds: 60,
        },
        jwt: JwtConfig {
            secret: Some("test-secret".to_string()),
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 3,
            timeout_seconds: 60,
        },
        sessions: SessionConfig {
            idle_ttl_seconds: 900,
            sweep_interval_seconds: 60,
        },
        pricing: SeatPricing::default(),
        features: FeatureFlags {
            enable_auth,
            enable_catalog_cache: false,
        },
    }
}

pub fn token(sub: &str, secret: &str) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &serde_json::json!({ "sub": sub, "exp": 4_102_444_800_i64 }),
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
