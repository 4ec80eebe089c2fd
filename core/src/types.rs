//! Domain types for the Estate listing and reservation system.
//!
//! Identifiers, the [`Money`] value object, status enums and the persisted
//! entities (users, properties, reservations, reviews, favorites).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user
    UserId
);
define_id!(
    /// Unique identifier for a property listing
    PropertyId
);
define_id!(
    /// Unique identifier for a reservation
    ReservationId
);
define_id!(
    /// Unique identifier for a review
    ReviewId
);

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Fixed-precision monetary amount, stored as integer cents.
///
/// Serializes as a decimal string with two fraction digits (`"300.00"`).
/// Deserializes from either a decimal string or a JSON number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole units, `None` on overflow
    #[must_use]
    pub const fn checked_from_units(units: u64) -> Option<Self> {
        match units.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a quantity, `None` on overflow
    #[must_use]
    pub const fn checked_mul(self, quantity: u64) -> Option<Self> {
        match self.0.checked_mul(quantity) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Error returned when a decimal amount cannot be parsed into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid monetary amount: {0}")]
pub struct ParseMoneyError(String);

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMoneyError(s.to_string());
        let trimmed = s.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: u64 = whole.parse().map_err(|_| invalid())?;
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        Self::checked_from_units(units)
            .and_then(|m| m.checked_add(Self(cents)))
            .ok_or_else(invalid)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal amount with at most two fraction digits")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                Money::checked_from_units(v).ok_or_else(|| E::custom("amount too large"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                let units = u64::try_from(v).map_err(|_| E::custom("amount must not be negative"))?;
                self.visit_u64(units)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                // Shortest round-trip text form: 19.99 stays 1999 cents, 19.999 is rejected
                self.visit_str(&v.to_string())
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Role of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user: lists properties, books stays, writes reviews
    User,
    /// Administrator: may act on any resource
    Admin,
}

impl Role {
    /// Database/string form of the role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Market status of a property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    /// Open for reservations
    #[default]
    Available,
    /// Let out long term
    Rented,
    /// Sold
    Sold,
}

impl PropertyStatus {
    /// Database/string form of the status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Sold => "sold",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            "sold" => Ok(Self::Sold),
            other => Err(format!("unknown property status: {other}")),
        }
    }
}

/// Reservation lifecycle status.
///
/// ```text
/// Pending ──→ Confirmed ──→ Completed
///    │            │
///    └────────────┴──→ Cancelled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting confirmation by the property owner
    Pending,
    /// Accepted by the property owner
    Confirmed,
    /// Cancelled (terminal)
    Cancelled,
    /// Stay finished (terminal)
    Completed,
}

impl ReservationStatus {
    /// Database/string form of the status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Whether a reservation in this status blocks the dates it covers
    #[must_use]
    pub const fn blocks_dates(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Role
    pub role: Role,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// A property listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property ID
    pub id: PropertyId,
    /// Owning user
    pub owner_id: UserId,
    /// Listing title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Nightly price
    pub price: Money,
    /// Number of bedrooms
    pub bedrooms: u32,
    /// Number of bathrooms
    pub bathrooms: u32,
    /// Floor area in square metres
    pub area: u32,
    /// Market status
    pub status: PropertyStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Property {
    /// Whether the property is open for new reservations
    #[must_use]
    pub fn accepts_reservations(&self) -> bool {
        self.deleted_at.is_none() && self.status == PropertyStatus::Available
    }
}

/// A stay booked on a property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID
    pub id: ReservationId,
    /// Reserved property
    pub property_id: PropertyId,
    /// Guest who made the reservation
    pub user_id: UserId,
    /// First night
    #[serde(rename = "check_in_date")]
    pub check_in: NaiveDate,
    /// Departure day (not a night of the stay)
    #[serde(rename = "check_out_date")]
    pub check_out: NaiveDate,
    /// Number of guests
    pub guests: u32,
    /// Optional notes for the owner
    pub special_requests: Option<String>,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Nightly price × nights
    pub total_price: Money,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Live reservations occupy their dates: not cancelled and not deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted_at.is_none() && self.status.blocks_dates()
    }
}

/// A guest review of a property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Reviewed property
    pub property_id: PropertyId,
    /// Author
    pub user_id: UserId,
    /// Rating from 1 to 5
    pub rating: u8,
    /// Review text
    pub comment: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Aggregate rating of a property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of reviews
    pub count: u32,
    /// Mean rating, `None` without reviews
    pub average: Option<f64>,
}

impl RatingSummary {
    /// Summarise a set of reviews.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }
        let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        #[allow(clippy::cast_possible_truncation)] // review counts fit in u32
        let count = reviews.len() as u32;
        Self {
            count,
            average: Some(f64::from(total) / f64::from(count)),
        }
    }
}

/// A property bookmarked by a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    /// User who saved the property
    pub user_id: UserId,
    /// Saved property
    pub property_id: PropertyId,
    /// When it was saved
    pub created_at: DateTime<Utc>,
}
