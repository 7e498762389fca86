use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::models::SeatPricing;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub backend: BackendConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub sessions: SessionConfig,
    pub pricing: SeatPricing,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `json` включает структурированные логи, всё остальное - обычный fmt.
    pub log_format: String,
}

// REST бэкенд кинотеатра (каталог + бронирования)
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки Redis (кеш каталога, опционально)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub catalog_ttl_seconds: u64,
}

// Настройки JWT
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Без секрета подпись не проверяется, токен проверит сам бэкенд.
    pub secret: Option<String>,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

// Время жизни брошенных сессий бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub idle_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_auth: bool,
    pub enable_catalog_cache: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("JWT_SECRET must be set when ENABLE_AUTH is on")]
    MissingJwtSecret,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(key, default);
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = SeatPricing::default();

        let config = Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_or("PORT", "8000")?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "cinema_booking=debug,tower_http=debug"),
                log_format: var_or("LOG_FORMAT", "pretty"),
            },
            backend: BackendConfig {
                base_url: var_or("BACKEND_URL", "http://localhost:5000/api")
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds: parse_or("BACKEND_TIMEOUT_SECONDS", "10")?,
            },
            redis: RedisConfig {
                url: optional("REDIS_URL"),
                catalog_ttl_seconds: parse_or("CATALOG_CACHE_TTL_SECONDS", "3600")?,
            },
            jwt: JwtConfig {
                secret: optional("JWT_SECRET"),
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse_or("CIRCUIT_BREAKER_FAILURE_THRESHOLD", "5")?,
                timeout_seconds: parse_or("CIRCUIT_BREAKER_TIMEOUT_SECONDS", "60")?,
            },
            sessions: SessionConfig {
                idle_ttl_seconds: parse_or("SESSION_IDLE_TTL_SECONDS", "900")?,
                sweep_interval_seconds: parse_or("SESSION_SWEEP_INTERVAL_SECONDS", "60")?,
            },
            pricing: SeatPricing {
                standard: parse_or("PRICE_STANDARD", &defaults.standard.to_string())?,
                vip: parse_or("PRICE_VIP", &defaults.vip.to_string())?,
                couple: parse_or("PRICE_COUPLE", &defaults.couple.to_string())?,
            },
            features: FeatureFlags {
                enable_auth: parse_or("ENABLE_AUTH", "true")?,
                enable_catalog_cache: parse_or("ENABLE_CATALOG_CACHE", "true")?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Владелец сессии берётся из `sub`, поэтому с включённой авторизацией
    /// подпись токена обязана проверяться.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.enable_auth && self.jwt.secret.is_none() {
            return Err(ConfigError::MissingJwtSecret);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}
