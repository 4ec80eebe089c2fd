//! Bearer token authentication.
//!
//! Clients send `Authorization: Bearer <token>`. The server stores only the
//! SHA-256 of each token; [`AuthUser`] hashes the presented token, looks the
//! user up and hands handlers an [`Actor`]. Issuing and revoking tokens is
//! out of scope: tokens are provisioned directly in the `users` table.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, AppError> {
//!     Ok(Json(state.users.me(&user.actor).await?))
//! }
//! ```

use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use estate_core::Actor;
use estate_web::{AppError, BearerToken};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of an API token, as stored in `users.api_token_hash`.
#[must_use]
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Authenticated user.
///
/// Rejects with 401 when the token is missing or unknown.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// Identity passed to the services
    pub actor: Actor,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        match state.users.authenticate(&hash_token(&token)).await? {
            Some(actor) => Ok(Self { actor }),
            None => {
                tracing::debug!("Rejected unknown API token");
                Err(AppError::unauthorized("Invalid API token"))
            }
        }
    }
}
