//! Property listings.

use super::StoreResultExt;
use crate::actor::Actor;
use crate::environment::Clock;
use crate::error::Result;
use crate::inputs::{CreatePropertyInput, UpdatePropertyInput};
use crate::store::{Page, Paged, PropertyFilter, PropertyStore};
use crate::types::{Property, PropertyId};
use std::sync::Arc;

/// Property operations.
#[derive(Clone)]
pub struct PropertyService {
    properties: Arc<dyn PropertyStore>,
    clock: Arc<dyn Clock>,
}

impl PropertyService {
    /// Create the service.
    #[must_use]
    pub fn new(properties: Arc<dyn PropertyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { properties, clock }
    }

    /// List a property owned by `actor`.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`](crate::error::DomainError::Validation) for bad input.
    #[tracing::instrument(skip(self, input), fields(actor = %actor))]
    pub async fn create(&self, actor: &Actor, input: CreatePropertyInput) -> Result<Property> {
        input.validate_all()?;

        let now = self.clock.now();
        let property = Property {
            id: PropertyId::new(),
            owner_id: actor.user_id,
            title: input.title,
            description: input.description,
            address: input.address,
            city: input.city,
            price: input.price,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            area: input.area,
            status: input.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.properties.insert(&property).await?;

        tracing::info!(property_id = %property.id, "Property created");
        Ok(property)
    }

    /// Get a live property.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`](crate::error::DomainError::NotFound) if absent or deleted.
    pub async fn get(&self, id: PropertyId) -> Result<Property> {
        self.properties.get(id).await.or_not_found("Property", id)
    }

    /// Search live properties.
    ///
    /// # Errors
    ///
    /// [`DomainError::Storage`](crate::error::DomainError::Storage) on store failure.
    pub async fn list(&self, filter: &PropertyFilter, page: Page) -> Result<Paged<Property>> {
        Ok(self.properties.list(filter, page).await?)
    }

    /// Apply a partial update; owner or admin only.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` or `Validation`.
    #[tracing::instrument(skip(self, input), fields(actor = %actor, property_id = %id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: PropertyId,
        input: UpdatePropertyInput,
    ) -> Result<Property> {
        let mut property = self.get(id).await?;
        actor.require_property_owner(&property)?;
        input.validate_all()?;

        if let Some(title) = input.title {
            property.title = title;
        }
        if let Some(description) = input.description {
            property.description = description;
        }
        if let Some(address) = input.address {
            property.address = address;
        }
        if let Some(city) = input.city {
            property.city = city;
        }
        if let Some(price) = input.price {
            property.price = price;
        }
        if let Some(bedrooms) = input.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = input.bathrooms {
            property.bathrooms = bathrooms;
        }
        if let Some(area) = input.area {
            property.area = area;
        }
        if let Some(status) = input.status {
            property.status = status;
        }
        property.updated_at = self.clock.now();

        self.properties.update(&property).await.or_not_found("Property", id)?;
        tracing::info!("Property updated");
        Ok(property)
    }

    /// Soft-delete a property; owner or admin only.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Forbidden`.
    #[tracing::instrument(skip(self), fields(actor = %actor, property_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: PropertyId) -> Result<()> {
        let property = self.get(id).await?;
        actor.require_property_owner(&property)?;
        self.properties
            .soft_delete(id, self.clock.now())
            .await
            .or_not_found("Property", id)?;
        tracing::info!("Property deleted");
        Ok(())
    }
}
