//! Review endpoints.
//!
//! - GET /api/properties/:id/reviews - Reviews and rating summary (public)
//! - POST /api/properties/:id/reviews - One review per user and property
//! - PUT /api/reviews/:id - Author, within the edit window
//! - DELETE /api/reviews/:id - Author within the edit window, or admin

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use estate_core::inputs::{CreateReviewInput, UpdateReviewInput};
use estate_core::services::PropertyReviews;
use estate_core::types::{PropertyId, Review, ReviewId};
use estate_web::{AppError, JsonBody};
use uuid::Uuid;

/// Reviews of a property with `{count, average}`.
///
/// Response:
/// ```json
/// { "data": [ ... ], "summary": { "count": 2, "average": 4.5 } }
/// ```
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<PropertyReviews>, AppError> {
    let reviews = state
        .reviews
        .list_for_property(PropertyId::from_uuid(property_id))
        .await?;
    Ok(Json(reviews))
}

/// Review a property.
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
    JsonBody(input): JsonBody<CreateReviewInput>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state
        .reviews
        .create(&user.actor, PropertyId::from_uuid(property_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Change rating or comment.
pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(input): JsonBody<UpdateReviewInput>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .reviews
        .update(&user.actor, ReviewId::from_uuid(id), input)
        .await?;
    Ok(Json(review))
}

/// Delete a review.
pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .reviews
        .delete(&user.actor, ReviewId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
