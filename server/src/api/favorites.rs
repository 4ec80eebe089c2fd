//! Favorites of the calling user.
//!
//! - GET /api/favorites
//! - POST /api/favorites/:property_id - Idempotent
//! - DELETE /api/favorites/:property_id

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use estate_core::types::{Favorite, PropertyId};
use estate_web::AppError;
use uuid::Uuid;

/// The caller's favorites, newest first.
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Favorite>>, AppError> {
    Ok(Json(state.favorites.list(&user.actor).await?))
}

/// Mark a property as favorite. Repeating the call returns the same favorite.
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Favorite>), AppError> {
    let favorite = state
        .favorites
        .add(&user.actor, PropertyId::from_uuid(property_id))
        .await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Remove a favorite.
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .favorites
        .remove(&user.actor, PropertyId::from_uuid(property_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
