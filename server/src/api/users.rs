//! Profile of the calling user.
//!
//! - GET /api/users/me
//! - PUT /api/users/me - `{"name": "..."}`

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{Json, extract::State};
use estate_core::inputs::UpdateProfileInput;
use estate_core::types::User;
use estate_web::{AppError, JsonBody};

/// The caller's profile.
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.me(&user.actor).await?))
}

/// Rename the caller.
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(input): JsonBody<UpdateProfileInput>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.update_me(&user.actor, input).await?))
}
