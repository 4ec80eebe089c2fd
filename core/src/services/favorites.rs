//! Saved properties.

use super::StoreResultExt;
use crate::actor::Actor;
use crate::environment::Clock;
use crate::error::Result;
use crate::store::{FavoriteStore, PropertyStore};
use crate::types::{Favorite, PropertyId};
use std::sync::Arc;

/// Favorite operations, always scoped to the acting user.
#[derive(Clone)]
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteStore>,
    properties: Arc<dyn PropertyStore>,
    clock: Arc<dyn Clock>,
}

impl FavoriteService {
    /// Create the service.
    #[must_use]
    pub fn new(
        favorites: Arc<dyn FavoriteStore>,
        properties: Arc<dyn PropertyStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            favorites,
            properties,
            clock,
        }
    }

    /// Save a property. Saving twice returns the original favorite.
    ///
    /// # Errors
    ///
    /// `NotFound` for the property.
    pub async fn add(&self, actor: &Actor, property_id: PropertyId) -> Result<Favorite> {
        self.properties.get(property_id).await.or_not_found("Property", property_id)?;
        let favorite = Favorite {
            user_id: actor.user_id,
            property_id,
            created_at: self.clock.now(),
        };
        Ok(self.favorites.add(&favorite).await?)
    }

    /// Remove a saved property.
    ///
    /// # Errors
    ///
    /// `NotFound` if it was not saved.
    pub async fn remove(&self, actor: &Actor, property_id: PropertyId) -> Result<()> {
        self.favorites
            .remove(actor.user_id, property_id)
            .await
            .or_not_found("Favorite", property_id)
    }

    /// The acting user's favorites.
    ///
    /// # Errors
    ///
    /// `Storage` on store failure.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Favorite>> {
        Ok(self.favorites.list_for_user(actor.user_id).await?)
    }
}
