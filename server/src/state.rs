//! Application state for the Estate HTTP server.
//!
//! One service per resource, all sharing one store and one clock. Cloned
//! (cheaply, everything is behind `Arc`) for each request.

use crate::config::PolicyConfig;
use async_trait::async_trait;
use estate_core::environment::Clock;
use estate_core::services::{
    FavoriteService, PropertyService, ReservationService, ReviewService, UserService,
};
use estate_core::store::{FavoriteStore, PropertyStore, ReservationStore, ReviewStore, UserStore};
use estate_postgres::PostgresStore;
use estate_web::handlers::ReadinessProbe;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reservation lifecycle, availability and quotes
    pub reservations: ReservationService,
    /// Property catalogue
    pub properties: PropertyService,
    /// Reviews and rating summaries
    pub reviews: ReviewService,
    /// Favorites of the acting user
    pub favorites: FavoriteService,
    /// Profiles and token authentication
    pub users: UserService,
    /// Dependency checked by `GET /ready`
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Wire every service to `store`.
    #[must_use]
    pub fn from_store<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        policy: &PolicyConfig,
        readiness: Arc<dyn ReadinessProbe>,
    ) -> Self
    where
        S: UserStore + PropertyStore + ReservationStore + ReviewStore + FavoriteStore + 'static,
    {
        Self {
            reservations: ReservationService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
                policy.cancellation_policy(),
            ),
            properties: PropertyService::new(store.clone(), clock.clone()),
            reviews: ReviewService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
                policy.review_edit_window(),
            ),
            favorites: FavoriteService::new(store.clone(), store.clone(), clock),
            users: UserService::new(store),
            readiness,
        }
    }
}

/// Readiness probe pinging `PostgreSQL`.
pub struct DatabaseProbe {
    store: Arc<PostgresStore>,
}

impl DatabaseProbe {
    /// Probe for `store`'s pool
    #[must_use]
    pub const fn new(store: Arc<PostgresStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessProbe for DatabaseProbe {
    fn component(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.store.ping().await.map_err(|e| e.to_string())
    }
}
