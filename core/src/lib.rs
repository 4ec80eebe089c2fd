//! # Estate Core
//!
//! Domain model and services for a property listing and reservation system.
//!
//! ## Core Concepts
//!
//! - **Availability**: stays are half-open date intervals `[check_in, check_out)`;
//!   a property is free when no live reservation overlaps the requested stay
//! - **Pricing**: nightly price × nights, in integer cents
//! - **Lifecycle**: `pending → {confirmed, cancelled}`, `confirmed → {completed, cancelled}`,
//!   applied by a [`Reducer`](reducer::Reducer) over reservation actions
//! - **Actor**: every operation receives the authenticated user explicitly
//! - **Stores**: persistence traits whose check-and-write for reservations is atomic
//!
//! ## Example
//!
//! ```
//! use estate_core::availability::{StayDates, is_available};
//! use chrono::NaiveDate;
//!
//! let june = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
//! let stay = StayDates::new(june(10), june(12)).unwrap();
//! assert_eq!(stay.nights(), 2);
//! assert!(is_available([], &stay, None));
//! ```

pub mod actor;
pub mod availability;
pub mod environment;
pub mod error;
pub mod inputs;
pub mod lifecycle;
pub mod pricing;
pub mod reducer;
pub mod services;
pub mod store;
pub mod types;

/// In-memory stores for tests and local runs
#[cfg(feature = "test-utils")]
pub mod memory;

// Re-export commonly used types
pub use actor::Actor;
pub use chrono::{DateTime, NaiveDate, Utc};
pub use error::{DomainError, Result, StoreError};
pub use types::{
    Favorite, Money, Property, PropertyId, PropertyStatus, RatingSummary, Reservation,
    ReservationId, ReservationStatus, Review, ReviewId, Role, User, UserId,
};
