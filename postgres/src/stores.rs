//! Store trait implementations for [`PostgresStore`].

use crate::rows::{
    FavoriteRow, PROPERTY_COLUMNS, PropertyRow, RESERVATION_COLUMNS, REVIEW_COLUMNS, ReservationRow,
    ReviewRow, USER_COLUMNS, UserRow, cents, convert_all, to_i32,
};
use crate::{PostgresStore, db_error};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use estate_core::availability::StayDates;
use estate_core::error::StoreError;
use estate_core::store::{
    FavoriteStore, Page, Paged, PropertyFilter, PropertyStore, ReservationStore, ReviewStore,
    StoreResult, UserStore,
};
use estate_core::types::{
    Favorite, Property, PropertyId, Reservation, ReservationId, ReservationStatus, Review,
    ReviewId, User, UserId,
};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

#[async_trait]
impl UserStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: UserId) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        row.try_into()
    }

    #[tracing::instrument(skip_all)]
    async fn find_by_token_hash(&self, token_hash: &str) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE api_token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    #[tracing::instrument(skip(self, token_hash), fields(user_id = %user.id))]
    async fn insert(&self, user: &User, token_hash: &str) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, role, api_token_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(token_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_name(&self, id: UserId, name: &str) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "UPDATE users SET name = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Escape `LIKE` wildcards in user input.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PropertyFilter) -> StoreResult<()> {
    if let Some(city) = &filter.city {
        qb.push(" AND city ILIKE ").push_bind(like_pattern(city));
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price_cents >= ").push_bind(cents(min)?);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price_cents <= ").push_bind(cents(max)?);
    }
    if let Some(min) = filter.min_bedrooms {
        qb.push(" AND bedrooms >= ").push_bind(to_i32(min)?);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(owner) = filter.owner_id {
        qb.push(" AND owner_id = ").push_bind(*owner.as_uuid());
    }
    Ok(())
}

#[async_trait]
impl PropertyStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: PropertyId) -> StoreResult<Property> {
        let row: PropertyRow = sqlx::query_as(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(*id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: &PropertyFilter, page: Page) -> StoreResult<Paged<Property>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM properties WHERE deleted_at IS NULL");
        push_filters(&mut count, filter)?;
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let offset = i64::try_from(page.offset())
            .map_err(|_| StoreError::Database("Page offset out of range".to_string()))?;
        let mut select = QueryBuilder::new(format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE deleted_at IS NULL"
        ));
        push_filters(&mut select, filter)?;
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(page.per_page))
            .push(" OFFSET ")
            .push_bind(offset);
        let rows: Vec<PropertyRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(Paged {
            data: convert_all(rows)?,
            total: u64::try_from(total).unwrap_or_default(),
            page: page.page,
            per_page: page.per_page,
        })
    }

    #[tracing::instrument(skip(self, property), fields(property_id = %property.id))]
    async fn insert(&self, property: &Property) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO properties (
                id, owner_id, title, description, address, city, price_cents,
                bedrooms, bathrooms, area, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(*property.id.as_uuid())
        .bind(*property.owner_id.as_uuid())
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.city)
        .bind(cents(property.price)?)
        .bind(to_i32(property.bedrooms)?)
        .bind(to_i32(property.bathrooms)?)
        .bind(to_i32(property.area)?)
        .bind(property.status.as_str())
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, property), fields(property_id = %property.id))]
    async fn update(&self, property: &Property) -> StoreResult<()> {
        let result = sqlx::query(
            r"
            UPDATE properties
            SET title = $2, description = $3, address = $4, city = $5, price_cents = $6,
                bedrooms = $7, bathrooms = $8, area = $9, status = $10, updated_at = $11
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(*property.id.as_uuid())
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.city)
        .bind(cents(property.price)?)
        .bind(to_i32(property.bedrooms)?)
        .bind(to_i32(property.bathrooms)?)
        .bind(to_i32(property.area)?)
        .bind(property.status.as_str())
        .bind(property.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn soft_delete(&self, id: PropertyId, at: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE properties SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(*id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Reservations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WriteOutcome {
    Written,
    Conflict,
    Missing,
    /// Update target exists but is no longer `pending`
    NotPending(ReservationStatus),
}

impl PostgresStore {
    /// One attempt at the check-then-write transaction.
    ///
    /// Runs at `SERIALIZABLE`; a concurrent overlapping writer either makes
    /// this transaction fail with `40001` (retried by the caller) or trips
    /// the exclusion constraint (`23P01`, mapped to a conflict).
    async fn write_reservation(
        &self,
        reservation: &Reservation,
        guests: i32,
        total_price_cents: i64,
        mode: WriteMode,
    ) -> Result<WriteOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        if mode == WriteMode::Update {
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT status FROM reservations WHERE id = $1 AND deleted_at IS NULL")
                    .bind(*reservation.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
            match existing {
                None => return Ok(WriteOutcome::Missing),
                Some((status,)) if status != ReservationStatus::Pending.as_str() => {
                    let status = status
                        .parse()
                        .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
                    return Ok(WriteOutcome::NotPending(status));
                }
                Some(_) => {}
            }
        }

        let conflict: Option<(Uuid,)> = sqlx::query_as(
            r"
            SELECT id FROM reservations
            WHERE property_id = $1
              AND id <> $2
              AND status <> 'cancelled'
              AND deleted_at IS NULL
              AND check_in < $4
              AND $3 < check_out
            LIMIT 1
            ",
        )
        .bind(*reservation.property_id.as_uuid())
        .bind(*reservation.id.as_uuid())
        .bind(reservation.check_in)
        .bind(reservation.check_out)
        .fetch_optional(&mut *tx)
        .await?;
        if conflict.is_some() {
            return Ok(WriteOutcome::Conflict);
        }

        match mode {
            WriteMode::Insert => {
                sqlx::query(
                    r"
                    INSERT INTO reservations (
                        id, property_id, user_id, check_in, check_out, guests,
                        special_requests, status, total_price_cents, created_at, updated_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    ",
                )
                .bind(*reservation.id.as_uuid())
                .bind(*reservation.property_id.as_uuid())
                .bind(*reservation.user_id.as_uuid())
                .bind(reservation.check_in)
                .bind(reservation.check_out)
                .bind(guests)
                .bind(&reservation.special_requests)
                .bind(reservation.status.as_str())
                .bind(total_price_cents)
                .bind(reservation.created_at)
                .bind(reservation.updated_at)
                .execute(&mut *tx)
                .await?;
            }
            WriteMode::Update => {
                sqlx::query(
                    r"
                    UPDATE reservations
                    SET check_in = $2, check_out = $3, guests = $4, special_requests = $5,
                        total_price_cents = $6, updated_at = $7
                    WHERE id = $1 AND status = 'pending' AND deleted_at IS NULL
                    ",
                )
                .bind(*reservation.id.as_uuid())
                .bind(reservation.check_in)
                .bind(reservation.check_out)
                .bind(guests)
                .bind(&reservation.special_requests)
                .bind(total_price_cents)
                .bind(reservation.updated_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(WriteOutcome::Written)
    }

    async fn write_if_available(&self, reservation: &Reservation, mode: WriteMode) -> StoreResult<()> {
        let guests = to_i32(reservation.guests)?;
        let total = cents(reservation.total_price)?;
        let operation = match mode {
            WriteMode::Insert => "insert_reservation",
            WriteMode::Update => "update_reservation",
        };

        let outcome = self
            .retry
            .run(operation, || self.write_reservation(reservation, guests, total, mode))
            .await
            .map_err(db_error)?;

        match outcome {
            WriteOutcome::Written => Ok(()),
            WriteOutcome::Conflict => Err(StoreError::Conflict),
            WriteOutcome::Missing => Err(StoreError::NotFound),
            WriteOutcome::NotPending(status) => Err(StoreError::NotPending { status }),
        }
    }

    async fn fetch_reservations(&self, sql: &str, id: Uuid) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        convert_all(rows)
    }
}

#[async_trait]
impl ReservationStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: ReservationId) -> StoreResult<Reservation> {
        let row: ReservationRow = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(*id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn overlapping(&self, property_id: PropertyId, stay: &StayDates) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            r"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE property_id = $1 AND deleted_at IS NULL AND check_in < $3 AND $2 < check_out
            ORDER BY check_in
            "
        ))
        .bind(*property_id.as_uuid())
        .bind(stay.check_in())
        .bind(stay.check_out())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        convert_all(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Reservation>> {
        self.fetch_reservations(
            &format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations \
                 WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC"
            ),
            *user_id.as_uuid(),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_for_property(&self, property_id: PropertyId) -> StoreResult<Vec<Reservation>> {
        self.fetch_reservations(
            &format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations \
                 WHERE property_id = $1 AND deleted_at IS NULL ORDER BY check_in"
            ),
            *property_id.as_uuid(),
        )
        .await
    }

    #[tracing::instrument(skip(self, reservation), fields(reservation_id = %reservation.id, property_id = %reservation.property_id))]
    async fn insert_if_available(&self, reservation: &Reservation) -> StoreResult<()> {
        self.write_if_available(reservation, WriteMode::Insert).await
    }

    #[tracing::instrument(skip(self, reservation), fields(reservation_id = %reservation.id, property_id = %reservation.property_id))]
    async fn update_if_available(&self, reservation: &Reservation) -> StoreResult<()> {
        self.write_if_available(reservation, WriteMode::Update).await
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Reservation> {
        let row: ReservationRow = sqlx::query_as(&format!(
            r"
            UPDATE reservations SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2 AND deleted_at IS NULL
            RETURNING {RESERVATION_COLUMNS}
            "
        ))
        .bind(*id.as_uuid())
        .bind(expected.as_str())
        .bind(status.as_str())
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        row.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn soft_delete(&self, id: ReservationId, at: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE reservations SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(*id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn complete_elapsed(&self, today: NaiveDate, at: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE reservations SET status = 'completed', updated_at = $2
            WHERE status = 'confirmed' AND deleted_at IS NULL AND check_out <= $1
            ",
        )
        .bind(today)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[async_trait]
impl ReviewStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: ReviewId) -> StoreResult<Review> {
        let row: ReviewRow = sqlx::query_as(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        row.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn list_for_property(&self, property_id: PropertyId) -> StoreResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE property_id = $1 ORDER BY created_at DESC"
        ))
        .bind(*property_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        convert_all(rows)
    }

    #[tracing::instrument(skip(self, review), fields(review_id = %review.id))]
    async fn insert(&self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO reviews (id, property_id, user_id, rating, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(*review.id.as_uuid())
        .bind(*review.property_id.as_uuid())
        .bind(*review.user_id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, review), fields(review_id = %review.id))]
    async fn update(&self, review: &Review) -> StoreResult<()> {
        let result = sqlx::query("UPDATE reviews SET rating = $2, comment = $3, updated_at = $4 WHERE id = $1")
            .bind(*review.id.as_uuid())
            .bind(i16::from(review.rating))
            .bind(&review.comment)
            .bind(review.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Favorites
// ============================================================================

#[async_trait]
impl FavoriteStore for PostgresStore {
    #[tracing::instrument(skip(self, favorite), fields(user_id = %favorite.user_id, property_id = %favorite.property_id))]
    async fn add(&self, favorite: &Favorite) -> StoreResult<Favorite> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let row: FavoriteRow = sqlx::query_as(
            r"
            INSERT INTO favorites (user_id, property_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, property_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, property_id, created_at
            ",
        )
        .bind(*favorite.user_id.as_uuid())
        .bind(*favorite.property_id.as_uuid())
        .bind(favorite.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, user_id: UserId, property_id: PropertyId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND property_id = $2")
            .bind(*user_id.as_uuid())
            .bind(*property_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Favorite>> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(
            "SELECT user_id, property_id, created_at FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }
}
