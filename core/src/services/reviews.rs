//! Property reviews with a bounded edit window.

use super::StoreResultExt;
use crate::actor::Actor;
use crate::environment::Clock;
use crate::error::{DomainError, Result, StoreError};
use crate::inputs::{CreateReviewInput, UpdateReviewInput};
use crate::store::{PropertyStore, ReviewStore};
use crate::types::{PropertyId, RatingSummary, Review, ReviewId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Reviews of a property with their aggregate rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyReviews {
    /// Reviews, newest first
    pub data: Vec<Review>,
    /// Count and average rating
    pub summary: RatingSummary,
}

/// Review operations.
#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    properties: Arc<dyn PropertyStore>,
    clock: Arc<dyn Clock>,
    edit_window: Duration,
}

impl ReviewService {
    /// Create the service; authors may change their review for `edit_window`
    /// after posting.
    #[must_use]
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        properties: Arc<dyn PropertyStore>,
        clock: Arc<dyn Clock>,
        edit_window: Duration,
    ) -> Self {
        Self {
            reviews,
            properties,
            clock,
            edit_window,
        }
    }

    /// Review a property, once per user.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound` for the property, or [`DomainError::DuplicateReview`].
    #[tracing::instrument(skip(self, input), fields(actor = %actor, property_id = %property_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        input: CreateReviewInput,
    ) -> Result<Review> {
        input.validate()?;
        self.properties.get(property_id).await.or_not_found("Property", property_id)?;

        let now = self.clock.now();
        let review = Review {
            id: ReviewId::new(),
            property_id,
            user_id: actor.user_id,
            rating: input.rating,
            comment: input.comment,
            created_at: now,
            updated_at: now,
        };

        match self.reviews.insert(&review).await {
            Ok(()) => {
                tracing::info!(review_id = %review.id, rating = review.rating, "Review created");
                Ok(review)
            }
            Err(StoreError::Duplicate(_)) => Err(DomainError::DuplicateReview),
            Err(err) => Err(err.into()),
        }
    }

    /// Reviews of a property plus its rating summary.
    ///
    /// # Errors
    ///
    /// `NotFound` for the property.
    pub async fn list_for_property(&self, property_id: PropertyId) -> Result<PropertyReviews> {
        self.properties.get(property_id).await.or_not_found("Property", property_id)?;
        let data = self.reviews.list_for_property(property_id).await?;
        let summary = RatingSummary::from_reviews(&data);
        Ok(PropertyReviews { data, summary })
    }

    /// Change a review; author only, within the edit window.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `Validation` or [`DomainError::EditWindowClosed`].
    #[tracing::instrument(skip(self, input), fields(actor = %actor, review_id = %id))]
    pub async fn update(&self, actor: &Actor, id: ReviewId, input: UpdateReviewInput) -> Result<Review> {
        let mut review = self.reviews.get(id).await.or_not_found("Review", id)?;
        if review.user_id != actor.user_id {
            return Err(DomainError::forbidden("Only the author can edit a review"));
        }
        let now = self.clock.now();
        self.ensure_within_window(&review, now)?;
        input.validate()?;

        if let Some(rating) = input.rating {
            review.rating = rating;
        }
        if let Some(comment) = input.comment {
            review.comment = comment;
        }
        review.updated_at = now;

        self.reviews.update(&review).await.or_not_found("Review", id)?;
        tracing::info!("Review updated");
        Ok(review)
    }

    /// Delete a review: the author within the edit window, an admin any time.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` or [`DomainError::EditWindowClosed`].
    #[tracing::instrument(skip(self), fields(actor = %actor, review_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: ReviewId) -> Result<()> {
        let review = self.reviews.get(id).await.or_not_found("Review", id)?;
        if !actor.is_admin() {
            if review.user_id != actor.user_id {
                return Err(DomainError::forbidden("Only the author or an admin can delete a review"));
            }
            self.ensure_within_window(&review, self.clock.now())?;
        }

        self.reviews.delete(id).await.or_not_found("Review", id)?;
        tracing::info!("Review deleted");
        Ok(())
    }

    fn ensure_within_window(&self, review: &Review, now: DateTime<Utc>) -> Result<()> {
        if now - review.created_at > self.edit_window {
            return Err(DomainError::EditWindowClosed {
                window_hours: self.edit_window.num_hours(),
            });
        }
        Ok(())
    }
}
