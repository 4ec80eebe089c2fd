//! In-memory implementation of every store trait.
//!
//! All tables live behind one async mutex, so the availability check and the
//! write of [`ReservationStore::insert_if_available`] happen under the same
//! lock and concurrent overlapping bookings serialize.

use crate::availability::{StayDates, find_conflict};
use crate::error::StoreError;
use crate::store::{
    FavoriteStore, Page, Paged, PropertyFilter, PropertyStore, ReservationStore, ReviewStore,
    StoreResult, UserStore,
};
use crate::types::{
    Favorite, Property, PropertyId, Reservation, ReservationId, ReservationStatus, Review,
    ReviewId, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, (User, String)>,
    properties: HashMap<PropertyId, Property>,
    reservations: HashMap<ReservationId, Reservation>,
    reviews: HashMap<ReviewId, Review>,
    favorites: Vec<Favorite>,
}

impl Tables {
    fn live_reservations_of(&self, property_id: PropertyId) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .values()
            .filter(move |r| r.property_id == property_id && r.deleted_at.is_none())
    }
}

/// HashMap-backed store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every reservation, including cancelled and deleted ones.
    pub async fn all_reservations(&self) -> Vec<Reservation> {
        self.tables.lock().await.reservations.values().cloned().collect()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get(&self, id: UserId) -> StoreResult<User> {
        let tables = self.tables.lock().await;
        tables.users.get(&id).map(|(u, _)| u.clone()).ok_or(StoreError::NotFound)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> StoreResult<User> {
        let tables = self.tables.lock().await;
        tables
            .users
            .values()
            .find(|(_, hash)| hash == token_hash)
            .map(|(u, _)| u.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: &User, token_hash: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        tables.users.insert(user.id, (user.clone(), token_hash.to_string()));
        Ok(())
    }

    async fn update_name(&self, id: UserId, name: &str) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        let (user, _) = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.name = name.to_string();
        Ok(user.clone())
    }
}

#[async_trait]
impl PropertyStore for InMemoryStore {
    async fn get(&self, id: PropertyId) -> StoreResult<Property> {
        let tables = self.tables.lock().await;
        tables
            .properties
            .get(&id)
            .filter(|p| p.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &PropertyFilter, page: Page) -> StoreResult<Paged<Property>> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<Property> = tables
            .properties
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.per_page as usize)
            .collect();
        Ok(Paged {
            data,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn insert(&self, property: &Property) -> StoreResult<()> {
        self.tables.lock().await.properties.insert(property.id, property.clone());
        Ok(())
    }

    async fn update(&self, property: &Property) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.properties.get_mut(&property.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                *existing = property.clone();
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn soft_delete(&self, id: PropertyId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.properties.get_mut(&id) {
            Some(existing) if existing.deleted_at.is_none() => {
                existing.deleted_at = Some(at);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn get(&self, id: ReservationId) -> StoreResult<Reservation> {
        let tables = self.tables.lock().await;
        tables
            .reservations
            .get(&id)
            .filter(|r| r.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn overlapping(&self, property_id: PropertyId, stay: &StayDates) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .live_reservations_of(property_id)
            .filter(|r| StayDates::from(*r).overlaps(stay))
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && r.deleted_at.is_none())
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn list_for_property(&self, property_id: PropertyId) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Reservation> = tables.live_reservations_of(property_id).cloned().collect();
        list.sort_by_key(|r| r.check_in);
        Ok(list)
    }

    async fn insert_if_available(&self, reservation: &Reservation) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let stay = StayDates::from(reservation);
        if find_conflict(tables.live_reservations_of(reservation.property_id), &stay, None).is_some() {
            return Err(StoreError::Conflict);
        }
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update_if_available(&self, reservation: &Reservation) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.reservations.get(&reservation.id) {
            Some(r) if r.deleted_at.is_none() && r.status == ReservationStatus::Pending => {}
            Some(r) if r.deleted_at.is_none() => {
                return Err(StoreError::NotPending { status: r.status });
            }
            _ => return Err(StoreError::NotFound),
        }
        let stay = StayDates::from(reservation);
        if find_conflict(
            tables.live_reservations_of(reservation.property_id),
            &stay,
            Some(reservation.id),
        )
        .is_some()
        {
            return Err(StoreError::Conflict);
        }
        let stored = tables
            .reservations
            .get_mut(&reservation.id)
            .ok_or(StoreError::NotFound)?;
        stored.check_in = reservation.check_in;
        stored.check_out = reservation.check_out;
        stored.guests = reservation.guests;
        stored.special_requests.clone_from(&reservation.special_requests);
        stored.total_price = reservation.total_price;
        stored.updated_at = reservation.updated_at;
        Ok(())
    }

    async fn set_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Reservation> {
        let mut tables = self.tables.lock().await;
        match tables.reservations.get_mut(&id) {
            Some(r) if r.deleted_at.is_none() && r.status == expected => {
                r.status = status;
                r.updated_at = at;
                Ok(r.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn soft_delete(&self, id: ReservationId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        match tables.reservations.get_mut(&id) {
            Some(r) if r.deleted_at.is_none() => {
                r.deleted_at = Some(at);
                r.updated_at = at;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn complete_elapsed(&self, today: NaiveDate, at: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut completed = 0;
        for r in tables.reservations.values_mut() {
            if r.deleted_at.is_none()
                && r.status == ReservationStatus::Confirmed
                && r.check_out <= today
            {
                r.status = ReservationStatus::Completed;
                r.updated_at = at;
                completed += 1;
            }
        }
        Ok(completed)
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn get(&self, id: ReviewId) -> StoreResult<Review> {
        self.tables.lock().await.reviews.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_for_property(&self, property_id: PropertyId) -> StoreResult<Vec<Review>> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn insert(&self, review: &Review) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables
            .reviews
            .values()
            .any(|r| r.property_id == review.property_id && r.user_id == review.user_id)
        {
            return Err(StoreError::Duplicate("review for property".to_string()));
        }
        tables.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn update(&self, review: &Review) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let existing = tables.reviews.get_mut(&review.id).ok_or(StoreError::NotFound)?;
        *existing = review.clone();
        Ok(())
    }

    async fn delete(&self, id: ReviewId) -> StoreResult<()> {
        self.tables
            .lock()
            .await
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl FavoriteStore for InMemoryStore {
    async fn add(&self, favorite: &Favorite) -> StoreResult<Favorite> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .favorites
            .iter()
            .find(|f| f.user_id == favorite.user_id && f.property_id == favorite.property_id)
        {
            return Ok(existing.clone());
        }
        tables.favorites.push(favorite.clone());
        Ok(favorite.clone())
    }

    async fn remove(&self, user_id: UserId, property_id: PropertyId) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == user_id && f.property_id == property_id));
        if tables.favorites.len() == before {
            Err(StoreError::NotFound)
        } else {
            Ok(())
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Favorite>> {
        let tables = self.tables.lock().await;
        let mut list: Vec<Favorite> = tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}
