use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::AuthSession;
use crate::AppContext;

/// Пользователь текущего запроса.
///
/// При `ENABLE_AUTH=true` без валидного Bearer токена запрос отклоняется с 401.
/// При выключенной авторизации токен опционален.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<AuthSession>);

impl CurrentUser {
    /// Владелец для проверки доступа к сессиям: только проверенный `sub`.
    pub fn subject(&self) -> Option<&str> {
        self.0.as_ref().and_then(AuthSession::owner)
    }

    pub fn auth(&self) -> Option<&AuthSession> {
        self.0.as_ref()
    }
}

// Bearer auth extractor
impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let required = state.config.features.enable_auth;

        // Получаем заголовок Authorization
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return if required {
                Err(StatusCode::UNAUTHORIZED)
            } else {
                Ok(CurrentUser(None))
            };
        };

        match AuthSession::from_token(token, state.config.jwt.secret.as_deref()) {
            // Без секрета подпись не проверить, а авторизация обязательна
            Ok(session) if required && !session.is_verified() => {
                debug!("Rejecting unverifiable bearer token for {}", session.subject());
                Err(StatusCode::UNAUTHORIZED)
            }
            Ok(session) => Ok(CurrentUser(Some(session))),
            Err(e) if required => {
                debug!("Rejecting bearer token: {}", e);
                Err(StatusCode::UNAUTHORIZED)
            }
            Err(_) => Ok(CurrentUser(None)),
        }
    }
}
