//! Кеш каталога в Redis.
//!
//! Кешируются только списки фильмов, кинотеатров и сеансов. Схема зала всегда
//! идёт напрямую в каталог: статусы мест должны быть актуальны на момент входа
//! на шаг выбора мест.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::AuthSession;
use crate::error::ClientError;
use crate::models::{Movie, Seat, Showtime, Theater};
use crate::redis_client::RedisClient;
use crate::services::CatalogService;

pub fn movies_key() -> String {
    "catalog:movies".to_string()
}

pub fn movie_key(movie_id: &str) -> String {
    format!("catalog:movie:{}", movie_id)
}

pub fn theaters_key() -> String {
    "catalog:theaters".to_string()
}

pub fn showtimes_key(movie_id: &str) -> String {
    format!("catalog:showtimes:{}", movie_id)
}

/// Хранилище строковых значений с TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> redis::RedisResult<()>;
}

#[async_trait]
impl CacheStore for RedisClient {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl_seconds).await
    }
}

#[derive(Clone)]
pub struct CachedCatalog {
    inner: Arc<dyn CatalogService>,
    store: Arc<dyn CacheStore>,
    ttl_seconds: u64,
}

impl CachedCatalog {
    pub fn new(
        inner: Arc<dyn CatalogService>,
        store: Arc<dyn CacheStore>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            inner,
            store,
            ttl_seconds,
        }
    }

    // Сначала пробуем кеш, если кеш не работает - идём в каталог
    async fn cached<T, F>(&self, key: String, load: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, ClientError>>,
    {
        if let Some(hit) = self.read::<T>(&key).await {
            debug!("Catalog cache HIT {}", key);
            return Ok(hit);
        }

        let value = load.await?;
        self.write(&key, &value).await;
        Ok(value)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = match self.store.get(key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Catalog cache read failed for {}: {}", key, e);
                return None;
            }
        };
        data.and_then(|raw| serde_json::from_str(&raw).ok())
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(data) = serde_json::to_string(value) else {
            return;
        };
        if let Err(e) = self.store.set_ex(key, data, self.ttl_seconds).await {
            warn!("Catalog cache write failed for {}: {}", key, e);
        }
    }
}

#[async_trait]
impl CatalogService for CachedCatalog {
    async fn list_movies(&self, auth: Option<&AuthSession>) -> Result<Vec<Movie>, ClientError> {
        self.cached(movies_key(), self.inner.list_movies(auth)).await
    }

    async fn get_movie(
        &self,
        movie_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Movie, ClientError> {
        self.cached(movie_key(movie_id), self.inner.get_movie(movie_id, auth))
            .await
    }

    async fn list_theaters(&self, auth: Option<&AuthSession>) -> Result<Vec<Theater>, ClientError> {
        self.cached(theaters_key(), self.inner.list_theaters(auth)).await
    }

    async fn list_showtimes(
        &self,
        movie_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<Showtime>, ClientError> {
        self.cached(
            showtimes_key(movie_id),
            self.inner.list_showtimes(movie_id, auth),
        )
        .await
    }

    async fn seat_inventory(
        &self,
        showtime_id: &str,
        auth: Option<&AuthSession>,
    ) -> Result<Vec<Seat>, ClientError> {
        self.inner.seat_inventory(showtime_id, auth).await
    }
}
