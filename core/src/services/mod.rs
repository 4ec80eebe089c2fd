//! Application services: one per aggregate, each taking the acting
//! [`Actor`](crate::actor::Actor) explicitly.
//!
//! Services own the authorization and business rules; stores only persist.

mod favorites;
mod properties;
mod reservations;
mod reviews;
mod users;

pub use favorites::FavoriteService;
pub use properties::PropertyService;
pub use reservations::{AvailabilityQuote, ReservationService};
pub use reviews::{PropertyReviews, ReviewService};
pub use users::UserService;

use crate::error::{DomainError, Result, StoreError};

/// Attach the resource name and id to a store `NotFound`.
pub(crate) trait StoreResultExt<T> {
    /// Map [`StoreError::NotFound`] to [`DomainError::NotFound`] for `resource`.
    fn or_not_found(self, resource: &'static str, id: impl ToString) -> Result<T>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, StoreError> {
    fn or_not_found(self, resource: &'static str, id: impl ToString) -> Result<T> {
        self.map_err(|err| match err {
            StoreError::NotFound => DomainError::not_found(resource, id),
            other => other.into(),
        })
    }
}
