//! User profiles and token resolution.

use super::StoreResultExt;
use crate::actor::Actor;
use crate::error::Result;
use crate::inputs::UpdateProfileInput;
use crate::store::UserStore;
use crate::types::User;
use std::sync::Arc;
use validator::Validate;

/// User operations.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    /// Create the service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Resolve the actor holding the token with this SHA-256 hex digest.
    ///
    /// Returns `Ok(None)` for unknown tokens.
    ///
    /// # Errors
    ///
    /// `Storage` on store failure.
    pub async fn authenticate(&self, token_hash: &str) -> Result<Option<Actor>> {
        match self.users.find_by_token_hash(token_hash).await {
            Ok(user) => Ok(Some(Actor::new(user.id, user.role))),
            Err(crate::error::StoreError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// The acting user's profile.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account is gone.
    pub async fn me(&self, actor: &Actor) -> Result<User> {
        self.users.get(actor.user_id).await.or_not_found("User", actor.user_id)
    }

    /// Change the acting user's name.
    ///
    /// # Errors
    ///
    /// `Validation` or `NotFound`.
    pub async fn update_me(&self, actor: &Actor, input: UpdateProfileInput) -> Result<User> {
        input.validate()?;
        let user = self
            .users
            .update_name(actor.user_id, &input.name)
            .await
            .or_not_found("User", actor.user_id)?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}
