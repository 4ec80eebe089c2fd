//! Property catalogue endpoints.
//!
//! - GET /api/properties - Search (public)
//! - POST /api/properties - Create, owned by the caller
//! - GET /api/properties/:id - Details (public)
//! - PUT /api/properties/:id - Partial update (owner or admin)
//! - DELETE /api/properties/:id - Soft delete (owner or admin)

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use estate_core::inputs::{CreatePropertyInput, UpdatePropertyInput};
use estate_core::store::{Page, Paged, PropertyFilter};
use estate_core::types::{Money, Property, PropertyId, PropertyStatus, UserId};
use estate_web::{AppError, JsonBody, QueryParams};
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Request Types
// ============================================================================

/// Search filters and pagination.
#[derive(Debug, Default, Deserialize)]
pub struct PropertyQuery {
    /// Case-insensitive city substring
    pub city: Option<String>,
    /// Minimum nightly price
    pub min_price: Option<Money>,
    /// Maximum nightly price
    pub max_price: Option<Money>,
    /// Minimum bedrooms
    pub min_bedrooms: Option<u32>,
    /// Exact status
    pub status: Option<PropertyStatus>,
    /// Only properties of this owner
    pub owner_id: Option<Uuid>,
    /// 1-based page
    pub page: Option<u32>,
    /// Page size, at most 100
    pub per_page: Option<u32>,
}

impl PropertyQuery {
    fn into_parts(self) -> (PropertyFilter, Page) {
        let page = Page::new(self.page, self.per_page);
        let filter = PropertyFilter {
            city: self.city.filter(|c| !c.trim().is_empty()),
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
            status: self.status,
            owner_id: self.owner_id.map(UserId::from_uuid),
        };
        (filter, page)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Search properties.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8080/api/properties?city=lis&max_price=150.00&page=2&per_page=10'
/// ```
pub async fn list_properties(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PropertyQuery>,
) -> Result<Json<Paged<Property>>, AppError> {
    let (filter, page) = query.into_parts();
    Ok(Json(state.properties.list(&filter, page).await?))
}

/// Create a property owned by the caller.
pub async fn create_property(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(input): JsonBody<CreatePropertyInput>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    let property = state.properties.create(&user.actor, input).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// Property details.
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(state.properties.get(PropertyId::from_uuid(id)).await?))
}

/// Update the given fields of a property.
pub async fn update_property(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(input): JsonBody<UpdatePropertyInput>,
) -> Result<Json<Property>, AppError> {
    let property = state
        .properties
        .update(&user.actor, PropertyId::from_uuid(id), input)
        .await?;
    Ok(Json(property))
}

/// Soft-delete a property.
pub async fn delete_property(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .properties
        .delete(&user.actor, PropertyId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
