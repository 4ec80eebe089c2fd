//! Row types and conversions between SQL columns and domain types.

use chrono::{DateTime, NaiveDate, Utc};
use estate_core::error::StoreError;
use estate_core::types::{
    Favorite, Money, Property, PropertyId, Reservation, ReservationId, Review, ReviewId, User,
    UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

type Result<T> = std::result::Result<T, StoreError>;

pub(crate) fn corrupt(what: impl std::fmt::Display) -> StoreError {
    StoreError::Database(format!("Corrupt row: {what}"))
}

pub(crate) fn money_from_cents(cents: i64) -> Result<Money> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| corrupt(format!("negative amount {cents}")))
}

pub(crate) fn cents(money: Money) -> Result<i64> {
    i64::try_from(money.cents()).map_err(|_| StoreError::Database(format!("Amount {money} out of range")))
}

pub(crate) fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::Database(format!("Value {value} out of range")))
}

fn from_i32(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| corrupt(format!("negative count {value}")))
}

pub(crate) const USER_COLUMNS: &str = "id, name, email, role, created_at";

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            role: row.role.parse().map_err(corrupt)?,
            created_at: row.created_at,
        })
    }
}

pub(crate) const PROPERTY_COLUMNS: &str = "id, owner_id, title, description, address, city, price_cents, \
     bedrooms, bathrooms, area, status, created_at, updated_at, deleted_at";

#[derive(Debug, FromRow)]
pub(crate) struct PropertyRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    address: String,
    city: String,
    price_cents: i64,
    bedrooms: i32,
    bathrooms: i32,
    area: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<PropertyRow> for Property {
    type Error = StoreError;

    fn try_from(row: PropertyRow) -> Result<Self> {
        Ok(Self {
            id: PropertyId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            title: row.title,
            description: row.description,
            address: row.address,
            city: row.city,
            price: money_from_cents(row.price_cents)?,
            bedrooms: from_i32(row.bedrooms)?,
            bathrooms: from_i32(row.bathrooms)?,
            area: from_i32(row.area)?,
            status: row.status.parse().map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

pub(crate) const RESERVATION_COLUMNS: &str = "id, property_id, user_id, check_in, check_out, guests, \
     special_requests, status, total_price_cents, created_at, updated_at, deleted_at";

#[derive(Debug, FromRow)]
pub(crate) struct ReservationRow {
    id: Uuid,
    property_id: Uuid,
    user_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
    special_requests: Option<String>,
    status: String,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self> {
        Ok(Self {
            id: ReservationId::from_uuid(row.id),
            property_id: PropertyId::from_uuid(row.property_id),
            user_id: UserId::from_uuid(row.user_id),
            check_in: row.check_in,
            check_out: row.check_out,
            guests: from_i32(row.guests)?,
            special_requests: row.special_requests,
            status: row.status.parse().map_err(corrupt)?,
            total_price: money_from_cents(row.total_price_cents)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

pub(crate) const REVIEW_COLUMNS: &str = "id, property_id, user_id, rating, comment, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct ReviewRow {
    id: Uuid,
    property_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self> {
        Ok(Self {
            id: ReviewId::from_uuid(row.id),
            property_id: PropertyId::from_uuid(row.property_id),
            user_id: UserId::from_uuid(row.user_id),
            rating: u8::try_from(row.rating).map_err(|_| corrupt(format!("rating {}", row.rating)))?,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct FavoriteRow {
    user_id: Uuid,
    property_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            property_id: PropertyId::from_uuid(row.property_id),
            created_at: row.created_at,
        }
    }
}

/// Convert a batch of rows, failing on the first corrupt one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_columns_reject_negative_cents() {
        assert!(money_from_cents(-1).is_err());
        assert_eq!(money_from_cents(12_345).ok(), Some(Money::from_cents(12_345)));
        assert_eq!(cents(Money::from_cents(u64::MAX)).ok(), None);
    }
}
