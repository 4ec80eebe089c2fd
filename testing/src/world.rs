//! Every service wired to one in-memory store and a controllable clock.

use crate::helpers;
use crate::mocks::{FixedClock, test_clock};
use chrono::Duration;
use estate_core::Actor;
use estate_core::environment::Clock;
use estate_core::inputs::CreateReservationInput;
use estate_core::lifecycle::CancellationPolicy;
use estate_core::memory::InMemoryStore;
use estate_core::services::{
    FavoriteService, PropertyService, ReservationService, ReviewService, UserService,
};
use estate_core::store::{PropertyStore, UserStore};
use estate_core::types::{Money, Property, Role};
use estate_core::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Services, actors and one bookable property at 100.00 per night.
///
/// The clock starts at 2024-05-01 09:00 UTC.
#[derive(Clone)]
pub struct TestWorld {
    /// Backing store shared by every service
    pub store: Arc<InMemoryStore>,
    /// Clock shared by every service
    pub clock: FixedClock,
    /// Reservation service
    pub reservations: ReservationService,
    /// Property service
    pub properties: PropertyService,
    /// Review service (24 hour edit window)
    pub reviews: ReviewService,
    /// Favorite service
    pub favorites: FavoriteService,
    /// User service
    pub users: UserService,
    /// Owner of [`property`](Self::property)
    pub owner: Actor,
    /// A guest
    pub guest: Actor,
    /// A second, unrelated guest
    pub other_guest: Actor,
    /// An administrator
    pub admin: Actor,
    /// Available property at 100.00 per night
    pub property: Property,
}

impl TestWorld {
    /// Build the world with the default 24 hour cancellation lead time.
    pub async fn new() -> Self {
        Self::with_policy(CancellationPolicy::default()).await
    }

    /// Build the world with a custom cancellation policy.
    pub async fn with_policy(policy: CancellationPolicy) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = test_clock();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

        let reservations = ReservationService::new(
            store.clone(),
            store.clone(),
            shared_clock.clone(),
            policy,
        );
        let properties = PropertyService::new(store.clone(), shared_clock.clone());
        let reviews = ReviewService::new(
            store.clone(),
            store.clone(),
            shared_clock.clone(),
            Duration::hours(24),
        );
        let favorites = FavoriteService::new(store.clone(), store.clone(), shared_clock);
        let users = UserService::new(store.clone());

        let owner = register(&store, "Olivia", Role::User, "owner-token", clock.now()).await;
        let guest = register(&store, "Gabriel", Role::User, "guest-token", clock.now()).await;
        let other_guest = register(&store, "Greta", Role::User, "other-token", clock.now()).await;
        let admin = register(&store, "Ada", Role::Admin, "admin-token", clock.now()).await;

        let property = helpers::property(owner.user_id, Money::from_cents(10_000), clock.now());
        let world = Self {
            store,
            clock,
            reservations,
            properties,
            reviews,
            favorites,
            users,
            owner,
            guest,
            other_guest,
            admin,
            property,
        };
        world.insert_property(&world.property).await;
        world
    }

    /// Register a user whose token hashes to `token_hash`.
    ///
    /// # Panics
    ///
    /// Panics if the email is already taken.
    pub async fn add_user(&self, name: &str, role: Role, token_hash: &str) -> Actor {
        register(&self.store, name, role, token_hash, self.clock.now()).await
    }

    /// Store a property as-is.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory store rejects the insert.
    #[allow(clippy::expect_used)]
    pub async fn insert_property(&self, property: &Property) {
        PropertyStore::insert(&*self.store, property)
            .await
            .expect("in-memory insert");
    }

    /// Booking request for the world's property.
    #[must_use]
    pub const fn booking(&self, check_in: NaiveDate, check_out: NaiveDate) -> CreateReservationInput {
        helpers::booking(self.property.id, check_in, check_out)
    }
}

#[allow(clippy::expect_used)]
async fn register(
    store: &InMemoryStore,
    name: &str,
    role: Role,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Actor {
    let user = helpers::user(name, role, now);
    UserStore::insert(store, &user, token_hash)
        .await
        .expect("unique test user");
    Actor::new(user.id, role)
}
