//! The authenticated identity passed explicitly into every operation.

use crate::error::DomainError;
use crate::types::{Property, Reservation, Role, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who is performing an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Authenticated user
    pub user_id: UserId,
    /// Role of that user
    pub role: Role,
}

impl Actor {
    /// Create an actor
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether the actor is an administrator
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the actor is `owner` or an administrator
    #[must_use]
    pub fn owns_or_admin(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id == owner
    }

    /// Require ownership of `property` or the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] otherwise.
    pub fn require_property_owner(&self, property: &Property) -> Result<(), DomainError> {
        if self.owns_or_admin(property.owner_id) {
            Ok(())
        } else {
            Err(DomainError::forbidden("Only the property owner or an admin can do this"))
        }
    }

    /// Require being the guest of `reservation` or the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Forbidden`] otherwise.
    pub fn require_guest(&self, reservation: &Reservation) -> Result<(), DomainError> {
        if self.owns_or_admin(reservation.user_id) {
            Ok(())
        } else {
            Err(DomainError::forbidden("Only the guest or an admin can do this"))
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.role.as_str(), self.user_id)
    }
}
