//! Хранилище живых сессий бронирования.
//!
//! Каждая сессия принадлежит одному пользователю и одному сценарию. Операции над
//! одной сессией строго последовательны: пока предыдущая (например, загрузка схемы
//! зала) не завершилась, следующая получает `Busy`, а не встаёт в очередь.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use super::flow::{BookingFlow, Collaborators};
use crate::auth::AuthSession;
use crate::error::BookingError;
use crate::models::SeatPricing;

struct Entry {
    owner: Option<String>,
    flow: Arc<Mutex<BookingFlow>>,
    cancel: CancellationToken,
    last_used: Instant,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    collaborators: Collaborators,
    pricing: SeatPricing,
    /// Родитель всех токенов сессий, отменяется при остановке сервиса.
    root: CancellationToken,
}

pub type SessionGuard = OwnedMutexGuard<BookingFlow>;

impl SessionRegistry {
    pub fn new(collaborators: Collaborators, pricing: SeatPricing) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            collaborators,
            pricing,
            root: CancellationToken::new(),
        }
    }

    /// Новая сессия для фильма. Владелец - проверенный субъект токена, если он есть.
    pub fn create(&self, movie_id: impl Into<String>, auth: Option<AuthSession>) -> Uuid {
        let owner = auth.as_ref().and_then(AuthSession::owner).map(str::to_string);
        let cancel = self.root.child_token();
        let flow = BookingFlow::new(
            movie_id,
            self.pricing,
            self.collaborators.clone(),
            auth,
            cancel.clone(),
        );
        let id = flow.id();

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Entry {
                    owner,
                    flow: Arc::new(Mutex::new(flow)),
                    cancel,
                    last_used: Instant::now(),
                },
            );

        info!("Booking session {} created", id);
        id
    }

    /// Эксклюзивный доступ к сессии на время одной операции.
    pub fn checkout(&self, id: Uuid, owner: Option<&str>) -> Result<SessionGuard, BookingError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(&id).ok_or(BookingError::SessionNotFound)?;
        check_owner(entry, owner)?;

        let guard = entry
            .flow
            .clone()
            .try_lock_owned()
            .map_err(|_| BookingError::Busy)?;
        entry.last_used = Instant::now();
        Ok(guard)
    }

    /// Пользователь ушёл или сессия закончилась: убираем и отменяем всё в полёте.
    pub fn discard(&self, id: Uuid, owner: Option<&str>) -> Result<(), BookingError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get(&id).ok_or(BookingError::SessionNotFound)?;
        check_owner(entry, owner)?;

        if let Some(entry) = sessions.remove(&id) {
            entry.cancel.cancel();
            info!("Booking session {} discarded", id);
        }
        Ok(())
    }

    /// Удаляет сессии, к которым не обращались дольше `ttl`.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();

        sessions.retain(|id, entry| {
            let alive = entry.last_used.elapsed() < ttl;
            if !alive {
                entry.cancel.cancel();
                info!("Booking session {} evicted after inactivity", id);
            }
            alive
        });

        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Остановка сервиса: отменяем все сессии разом.
    pub fn shutdown(&self) {
        self.root.cancel();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        info!("Shutting down {} booking sessions", sessions.len());
        sessions.clear();
    }
}

fn check_owner(entry: &Entry, owner: Option<&str>) -> Result<(), BookingError> {
    match entry.owner.as_deref() {
        Some(expected) if owner != Some(expected) => Err(BookingError::Forbidden),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::models::{
        BookingConfirmation, BookingRequest, Movie, Seat, SeatCategory, SeatStatus, Showtime,
        Theater,
    };
    use crate::services::{BookingGateway, CatalogService};
    use async_trait::async_trait;

    struct EmptyBackend;

    #[async_trait]
    impl CatalogService for EmptyBackend {
        async fn list_movies(&self, _: Option<&AuthSession>) -> Result<Vec<Movie>, ClientError> {
            Ok(Vec::new())
        }

        async fn get_movie(&self, id: &str, _: Option<&AuthSession>) -> Result<Movie, ClientError> {
            Err(ClientError::Status { status: 404, message: format!("movie {id}") })
        }

        async fn list_theaters(
            &self,
            _: Option<&AuthSession>,
        ) -> Result<Vec<Theater>, ClientError> {
            Ok(Vec::new())
        }

        async fn list_showtimes(
            &self,
            _: &str,
            _: Option<&AuthSession>,
        ) -> Result<Vec<Showtime>, ClientError> {
            Ok(Vec::new())
        }

        async fn seat_inventory(
            &self,
            _: &str,
            _: Option<&AuthSession>,
        ) -> Result<Vec<Seat>, ClientError> {
            Ok(vec![Seat::new("A1", SeatCategory::Standard, SeatStatus::Available)])
        }
    }

    #[async_trait]
    impl BookingGateway for EmptyBackend {
        async fn submit_booking(
            &self,
            _: &BookingRequest,
            _: &str,
            _: Option<&AuthSession>,
        ) -> Result<BookingConfirmation, ClientError> {
            Err(ClientError::Rejected { reason: "closed".to_string() })
        }
    }

    fn registry() -> SessionRegistry {
        let backend = Arc::new(EmptyBackend);
        SessionRegistry::new(
            Collaborators { catalog: backend.clone(), gateway: backend },
            SeatPricing::default(),
        )
    }

    #[tokio::test]
    async fn second_checkout_while_busy_is_rejected() {
        let registry = registry();
        let id = registry.create("m1", None);

        let guard = registry.checkout(id, None).unwrap();
        assert!(matches!(registry.checkout(id, None), Err(BookingError::Busy)));

        drop(guard);
        assert!(registry.checkout(id, None).is_ok());
    }

    fn auth(sub: &str) -> AuthSession {
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({ "sub": sub }),
            &jsonwebtoken::EncodingKey::from_secret(b"test"),
        )
        .unwrap();
        AuthSession::from_token(token, Some("test")).unwrap()
    }

    #[tokio::test]
    async fn sessions_are_private_to_their_owner() {
        let registry = registry();
        let id = registry.create("m1", Some(auth("alice")));

        assert!(matches!(registry.checkout(id, Some("bob")), Err(BookingError::Forbidden)));
        assert!(matches!(registry.checkout(id, None), Err(BookingError::Forbidden)));
        assert!(matches!(registry.discard(id, Some("bob")), Err(BookingError::Forbidden)));

        let guard = registry.checkout(id, Some("alice")).unwrap();
        assert_eq!(guard.auth().map(|a| a.subject()), Some("alice"));
    }

    #[tokio::test]
    async fn unverified_token_does_not_claim_ownership() {
        let registry = registry();
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({ "sub": "alice" }),
            &jsonwebtoken::EncodingKey::from_secret(b"made-up"),
        )
        .unwrap();
        let id = registry.create("m1", Some(AuthSession::from_token(token, None).unwrap()));

        // Сессия без владельца: подпись не проверена, `sub` ничего не доказывает
        assert!(registry.checkout(id, Some("bob")).is_ok());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.checkout(Uuid::new_v4(), None),
            Err(BookingError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn discard_cancels_outstanding_flow() {
        let registry = registry();
        let id = registry.create("m1", None);
        let guard = registry.checkout(id, None).unwrap();

        registry.discard(id, None).unwrap();
        assert!(guard.is_cancelled());
        assert!(registry.is_empty());
        assert!(matches!(registry.discard(id, None), Err(BookingError::SessionNotFound)));
    }

    #[tokio::test]
    async fn evicts_only_idle_sessions() {
        let registry = registry();
        registry.create("m1", None);
        registry.create("m2", None);

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.evict_idle(Duration::ZERO), 2);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn shutdown_cancels_everything() {
        let registry = registry();
        let id = registry.create("m1", None);
        let guard = registry.checkout(id, None).unwrap();

        registry.shutdown();
        assert!(guard.is_cancelled());
        assert_eq!(registry.len(), 0);
    }
}
