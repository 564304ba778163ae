//! Favorites coordination on top of the storage collaborator
//!
//! The favorites list is shared by every user of the bot.

use crate::candidate::Candidate;
use crate::criteria::Criteria;
use crate::error::CollaboratorError;
use crate::runtime::FavoritesStore;

pub struct FavoritesCoordinator<S: FavoritesStore> {
    store: S,
}

impl<S: FavoritesStore> FavoritesCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Save `candidate` to the catalog and link it as favorite. Idempotent.
    pub async fn add(
        &self,
        candidate: &Candidate,
        criteria: &Criteria,
    ) -> Result<i64, CollaboratorError> {
        let found_user_id = self.store.upsert_found_user(candidate, criteria).await?;
        self.store.add_favorite(found_user_id).await?;
        tracing::info!(vk_id = candidate.vk_id, found_user_id, "Added to favorites");
        Ok(found_user_id)
    }

    /// Favorites, oldest first
    pub async fn list(&self) -> Result<Vec<Candidate>, CollaboratorError> {
        let records = self.store.list_favorites().await?;
        if let Some(oldest) = records.first() {
            tracing::debug!(
                count = records.len(),
                oldest_id = oldest.found_user_id,
                oldest_added_at = %oldest.added_at,
                "Favorites listed"
            );
        }
        Ok(records.into_iter().map(|r| r.candidate).collect())
    }

    pub async fn clear(&self) -> Result<(), CollaboratorError> {
        self.store.clear_favorites().await
    }
}
