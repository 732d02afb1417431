use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use super::AppState;
use crate::error::AppError;

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header against the session store
///
/// Keeps the session explicit per request instead of ambient global state;
/// handlers that take this extractor are the protected surface.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub uid: String,
    pub token: String,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Autentificare necesară".to_string()))?
            .to_string();

        let uid = state.auth.authenticate(&token).await?;
        Ok(CurrentUser { uid, token })
    }
}
