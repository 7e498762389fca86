pub mod auth;
pub mod booking;
pub mod cache;
pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use booking::{Collaborators, SessionRegistry};
use services::{backend::BackendClient, CatalogService};

// Shared state для всего приложения
pub struct AppContext {
    pub config: config::Config,
    pub catalog: Arc<dyn CatalogService>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppContext {
    /// Поднимает клиента бэкенда и, если настроен Redis, кеш каталога.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let backend = Arc::new(BackendClient::from_config(
            &config.backend,
            &config.circuit_breaker,
        )?);

        let mut catalog: Arc<dyn CatalogService> = backend.clone();
        match (&config.redis.url, config.features.enable_catalog_cache) {
            (Some(url), true) => match redis_client::RedisClient::connect(url).await {
                Ok(redis) => {
                    catalog = Arc::new(cache::CachedCatalog::new(
                        catalog,
                        Arc::new(redis),
                        config.redis.catalog_ttl_seconds,
                    ));
                    info!("Catalog cache enabled");
                }
                // Без кеша работаем, просто медленнее
                Err(e) => warn!("Redis unavailable, catalog cache disabled: {}", e),
            },
            _ => info!("Catalog cache disabled"),
        }

        let collaborators = Collaborators {
            catalog,
            gateway: backend,
        };
        Ok(Self::from_parts(config, collaborators))
    }

    pub fn from_parts(config: config::Config, collaborators: Collaborators) -> Arc<Self> {
        let catalog = collaborators.catalog.clone();
        let sessions = Arc::new(SessionRegistry::new(collaborators, config.pricing));
        Arc::new(Self {
            config,
            catalog,
            sessions,
        })
    }

    /// Фоновая чистка брошенных сессий.
    pub fn spawn_session_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let sessions = self.sessions.clone();
        let ttl = Duration::from_secs(self.config.sessions.idle_ttl_seconds);
        let every = Duration::from_secs(self.config.sessions.sweep_interval_seconds.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = sessions.evict_idle(ttl);
                if evicted > 0 {
                    info!("Evicted {} idle booking sessions", evicted);
                }
            }
        })
    }

    /// Завершение работы: все живые сессии отменяются.
    pub fn teardown(&self) {
        self.sessions.shutdown();
    }
}
