//! # Estate Testing
//!
//! Testing utilities and fixtures for Estate.
//!
//! This crate provides:
//! - A controllable [`FixedClock`](mocks::FixedClock)
//! - Entity builders with sensible defaults
//! - `proptest` strategies for stays and booking requests
//! - [`TestWorld`]: every service wired to one in-memory store
//!
//! ## Example
//!
//! ```ignore
//! use estate_testing::{TestWorld, june};
//!
//! #[tokio::test]
//! async fn test_booking() {
//!     let world = TestWorld::new().await;
//!     let booking = world
//!         .reservations
//!         .create(&world.guest, world.booking(june(10), june(12)))
//!         .await
//!         .unwrap();
//!     assert_eq!(booking.total_price.to_string(), "200.00");
//! }
//! ```

mod world;

pub use world::TestWorld;

use chrono::NaiveDate;

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use estate_core::environment::Clock;
    use std::sync::{Arc, PoisonError, RwLock};

    /// Deterministic clock for tests
    ///
    /// Returns the same time until moved with [`advance`](Self::advance) or
    /// [`set`](Self::set). Clones share the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use estate_testing::mocks::FixedClock;
    /// use estate_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let before = clock.now();
    /// clock.advance(Duration::hours(1));
    /// assert_eq!(clock.now() - before, Duration::hours(1));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a clock stopped at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock to `time`
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.write().unwrap_or_else(PoisonError::into_inner) = time;
        }

        /// Move the clock forward by `by`
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.write().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create the default test clock (2024-05-01 09:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Entity builders with defaults suitable for most tests.
pub mod helpers {
    use estate_core::inputs::{CreatePropertyInput, CreateReservationInput};
    use estate_core::types::{
        Money, Property, PropertyId, PropertyStatus, Reservation, ReservationId,
        ReservationStatus, Role, User, UserId,
    };
    use estate_core::{DateTime, NaiveDate, Utc};

    /// A user with the given role.
    #[must_use]
    pub fn user(name: &str, role: Role, created_at: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            name: name.to_string(),
            email: format!("{}@estate.test", name.to_lowercase()),
            role,
            created_at,
        }
    }

    /// Input for an available flat at `price_units` per night.
    #[must_use]
    pub fn property_input(title: &str, city: &str, price_units: u64) -> CreatePropertyInput {
        CreatePropertyInput {
            title: title.to_string(),
            description: format!("{title} in {city}"),
            address: "1 Harbour Road".to_string(),
            city: city.to_string(),
            price: Money::checked_from_units(price_units).unwrap_or(Money::ZERO),
            bedrooms: 2,
            bathrooms: 1,
            area: 80,
            status: PropertyStatus::Available,
        }
    }

    /// A stored property owned by `owner_id`.
    #[must_use]
    pub fn property(owner_id: UserId, price: Money, created_at: DateTime<Utc>) -> Property {
        Property {
            id: PropertyId::new(),
            owner_id,
            title: "Sea View Flat".to_string(),
            description: String::new(),
            address: "1 Harbour Road".to_string(),
            city: "Lisbon".to_string(),
            price,
            bedrooms: 2,
            bathrooms: 1,
            area: 80,
            status: PropertyStatus::Available,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    /// Booking request for `guests` = 2 and no special requests.
    #[must_use]
    pub const fn booking(
        property_id: PropertyId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> CreateReservationInput {
        CreateReservationInput {
            property_id,
            check_in_date: check_in,
            check_out_date: check_out,
            guests: 2,
            special_requests: None,
        }
    }

    /// A stored reservation in `status`.
    #[must_use]
    pub fn reservation(
        property: &Property,
        user_id: UserId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: ReservationStatus,
    ) -> Reservation {
        let nights = u64::try_from((check_out - check_in).num_days()).unwrap_or(0);
        let now = property.created_at;
        Reservation {
            id: ReservationId::new(),
            property_id: property.id,
            user_id,
            check_in,
            check_out,
            guests: 2,
            special_requests: None,
            status,
            total_price: property.price.checked_mul(nights).unwrap_or(Money::ZERO),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Property-based testing strategies.
pub mod properties {
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    /// Check-in offset (days after `base`) and length (nights) of a stay.
    ///
    /// Offsets fall within `horizon` days so random stays collide often.
    pub fn stay_offsets(horizon: i64, max_nights: i64) -> impl Strategy<Value = (i64, i64)> {
        (0..horizon, 1..=max_nights)
    }

    /// Concrete `(check_in, check_out)` dates from offsets.
    #[must_use]
    pub fn dates_from(base: NaiveDate, (offset, nights): (i64, i64)) -> (NaiveDate, NaiveDate) {
        let check_in = base + Duration::days(offset);
        (check_in, check_in + Duration::days(nights))
    }
}

/// Day of June 2024, the month most fixtures book into.
///
/// # Panics
///
/// Panics if `day` is not a valid day of June.
#[must_use]
#[allow(clippy::expect_used)]
pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).expect("valid day of June 2024")
}

/// Install a test subscriber that honours `RUST_LOG`; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use estate_core::environment::Clock;

    #[test]
    fn test_fixed_clock_is_stable_and_shared() {
        let clock = test_clock();
        let shared = clock.clone();
        assert_eq!(clock.now(), clock.now());

        shared.advance(Duration::days(1));
        // 2024-05-01 + 1 day
        assert_eq!(clock.today(), june(1) - Duration::days(30));
    }
}
