//! Error types for domain operations and persistence.

use crate::types::ReservationStatus;
use thiserror::Error;
use validator::ValidationErrors;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Message returned when requested dates collide with a live reservation.
pub const UNAVAILABLE_MESSAGE: &str = "Property is not available for the selected dates";

/// Failure modes of the domain services.
///
/// Variants are grouped the way the HTTP layer maps them: input problems,
/// business-rule rejections, authorization, lookup failures, infrastructure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ═══════════════════════════════════════════════════════════
    // Input
    // ═══════════════════════════════════════════════════════════
    /// Field-level validation failures.
    #[error("Validation failed")]
    Validation(ValidationErrors),

    // ═══════════════════════════════════════════════════════════
    // Business rules
    // ═══════════════════════════════════════════════════════════
    /// Requested dates overlap a live reservation.
    #[error("Property is not available for the selected dates")]
    Unavailable,

    /// Property is rented, sold or deleted.
    #[error("Property is not accepting reservations")]
    PropertyNotBookable,

    /// Status change not allowed by the lifecycle.
    #[error("Cannot change reservation status from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: ReservationStatus,
        /// Requested status
        to: ReservationStatus,
    },

    /// Only pending reservations may be edited or deleted.
    #[error("Only pending reservations can be modified (status: {status})")]
    NotEditable {
        /// Current status
        status: ReservationStatus,
    },

    /// Confirmed reservation is too close to check-in to cancel.
    #[error("Confirmed reservations can only be cancelled more than {lead_time_hours} hours before check-in")]
    CancellationWindowClosed {
        /// Configured lead time
        lead_time_hours: i64,
    },

    /// Review can no longer be changed by its author.
    #[error("Reviews can only be changed within {window_hours} hours of posting")]
    EditWindowClosed {
        /// Configured edit window
        window_hours: i64,
    },

    /// User already reviewed this property.
    #[error("You have already reviewed this property")]
    DuplicateReview,

    /// Total price does not fit the money representation.
    #[error("Total price is out of range")]
    PriceOverflow,

    // ═══════════════════════════════════════════════════════════
    // Authorization & lookup
    // ═══════════════════════════════════════════════════════════
    /// Actor may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced resource does not exist (or is soft-deleted).
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Resource kind
        resource: &'static str,
        /// Requested identifier
        id: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════
    /// Persistence layer failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Convenience constructor for [`DomainError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`DomainError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Failure modes of the store implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Row does not exist.
    #[error("Record not found")]
    NotFound,

    /// Write would create overlapping live reservations.
    #[error("Reservation dates conflict with an existing reservation")]
    Conflict,

    /// Reservation left `pending` before a date edit could be written.
    #[error("Reservation is no longer pending (status: {status})")]
    NotPending {
        /// Status found in the store
        status: ReservationStatus,
    },

    /// Unique constraint violated.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Unavailable,
            StoreError::NotPending { status } => Self::NotEditable { status },
            StoreError::NotFound => Self::NotFound {
                resource: "Record",
                id: String::new(),
            },
            StoreError::Duplicate(what) | StoreError::Database(what) => Self::Storage(what),
        }
    }
}
