//! Persistence traits implemented by the PostgreSQL and in-memory stores.
//!
//! Reads of soft-deleted rows return [`StoreError::NotFound`]. The two
//! reservation writes that can break the no-overlap invariant
//! ([`ReservationStore::insert_if_available`] and
//! [`ReservationStore::update_if_available`]) perform the availability check
//! and the write as one atomic step.

use crate::availability::StayDates;
use crate::error::StoreError;
use crate::types::{
    Favorite, Money, Property, PropertyId, PropertyStatus, Reservation, ReservationId,
    ReservationStatus, Review, ReviewId, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Page request for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl Page {
    /// Largest accepted page size
    pub const MAX_PER_PAGE: u32 = 100;

    /// Build a page request, clamping to sane bounds.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(15).clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Rows to skip
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Property search filters; all optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    /// Minimum nightly price (inclusive)
    pub min_price: Option<Money>,
    /// Maximum nightly price (inclusive)
    pub max_price: Option<Money>,
    /// Minimum number of bedrooms
    pub min_bedrooms: Option<u32>,
    /// Exact status
    pub status: Option<PropertyStatus>,
    /// Only properties of this owner
    pub owner_id: Option<UserId>,
}

impl PropertyFilter {
    /// Whether `property` matches every set filter (soft-deleted never match).
    #[must_use]
    pub fn matches(&self, property: &Property) -> bool {
        property.deleted_at.is_none()
            && self.city.as_ref().is_none_or(|city| {
                property.city.to_lowercase().contains(&city.to_lowercase())
            })
            && self.min_price.is_none_or(|min| property.price >= min)
            && self.max_price.is_none_or(|max| property.price <= max)
            && self.min_bedrooms.is_none_or(|min| property.bedrooms >= min)
            && self.status.is_none_or(|status| property.status == status)
            && self.owner_id.is_none_or(|owner| property.owner_id == owner)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Total number of matching items
    pub total: u64,
    /// Page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent; [`StoreError::Database`] on failure.
    async fn get(&self, id: UserId) -> StoreResult<User>;

    /// Resolve a user from the SHA-256 hex digest of their API token.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no user holds the token.
    async fn find_by_token_hash(&self, token_hash: &str) -> StoreResult<User>;

    /// Create a user with the given token hash.
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if the email is taken.
    async fn insert(&self, user: &User, token_hash: &str) -> StoreResult<()>;

    /// Change a user's display name.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent.
    async fn update_name(&self, id: UserId, name: &str) -> StoreResult<User>;
}

/// Property listings.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Get a live property by ID.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent or soft-deleted.
    async fn get(&self, id: PropertyId) -> StoreResult<Property>;

    /// Search live properties, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn list(&self, filter: &PropertyFilter, page: Page) -> StoreResult<Paged<Property>>;

    /// Insert a new property.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn insert(&self, property: &Property) -> StoreResult<()>;

    /// Overwrite a live property.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent or soft-deleted.
    async fn update(&self, property: &Property) -> StoreResult<()>;

    /// Soft-delete a property.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent or already deleted.
    async fn soft_delete(&self, id: PropertyId, at: DateTime<Utc>) -> StoreResult<()>;
}

/// Reservations with an atomic availability guarantee.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Get a live (not soft-deleted) reservation by ID.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent or soft-deleted.
    async fn get(&self, id: ReservationId) -> StoreResult<Reservation>;

    /// Non-deleted reservations of a property whose stay overlaps `stay`,
    /// any status.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn overlapping(&self, property_id: PropertyId, stay: &StayDates) -> StoreResult<Vec<Reservation>>;

    /// Non-deleted reservations made by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Reservation>>;

    /// Non-deleted reservations of `property_id`, by check-in date.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn list_for_property(&self, property_id: PropertyId) -> StoreResult<Vec<Reservation>>;

    /// Insert `reservation` unless a live reservation of the same property
    /// overlaps it; check and insert are atomic.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] on overlap.
    async fn insert_if_available(&self, reservation: &Reservation) -> StoreResult<()>;

    /// Write the dates, guests, notes and price of `reservation` unless another
    /// live reservation of the same property overlaps the new dates; the
    /// reservation itself is excluded from the check. The stored row must
    /// still be `pending`; its status is never written. Atomic.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] on overlap, [`StoreError::NotPending`] if the
    /// status moved on, [`StoreError::NotFound`] if gone.
    async fn update_if_available(&self, reservation: &Reservation) -> StoreResult<()>;

    /// Set the status of a reservation, only if it is currently `expected`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent or no longer in `expected`.
    async fn set_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Reservation>;

    /// Soft-delete a reservation.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent or already deleted.
    async fn soft_delete(&self, id: ReservationId, at: DateTime<Utc>) -> StoreResult<()>;

    /// Mark every confirmed reservation with `check_out <= today` completed.
    ///
    /// Returns the number of reservations changed.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn complete_elapsed(&self, today: NaiveDate, at: DateTime<Utc>) -> StoreResult<u64>;
}

/// Property reviews; one per (user, property).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent.
    async fn get(&self, id: ReviewId) -> StoreResult<Review>;

    /// Reviews of a property, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn list_for_property(&self, property_id: PropertyId) -> StoreResult<Vec<Review>>;

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if the user already reviewed the property.
    async fn insert(&self, review: &Review) -> StoreResult<()>;

    /// Overwrite rating/comment of a review.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent.
    async fn update(&self, review: &Review) -> StoreResult<()>;

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if absent.
    async fn delete(&self, id: ReviewId) -> StoreResult<()>;
}

/// Saved properties.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Save a property; returns the existing favorite if already saved.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn add(&self, favorite: &Favorite) -> StoreResult<Favorite>;

    /// Remove a saved property.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if it was not saved.
    async fn remove(&self, user_id: UserId, property_id: PropertyId) -> StoreResult<()>;

    /// A user's favorites, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on failure.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Favorite>>;
}
