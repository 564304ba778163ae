//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the session workers with mock implementations.

use crate::candidate::Candidate;
use crate::criteria::Criteria;
use crate::db::{Database, DbError, FavoriteRecord};
use crate::error::CollaboratorError;
use crate::state_machine::OutgoingMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// A text message received from a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: i64,
    pub text: String,
}

/// Outbound side of the messaging transport
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver a message to a user
    async fn send(&self, user_id: i64, message: &OutgoingMessage) -> Result<(), CollaboratorError>;
}

/// Inbound side of the messaging transport. Ordered per user.
#[async_trait]
pub trait InboundSource: Send {
    /// Wait for the next batch of messages
    async fn next_batch(&mut self) -> Result<Vec<Inbound>, CollaboratorError>;
}

/// External candidate search
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    /// Find candidates matching the criteria, each with its top photos
    async fn search(&self, criteria: &Criteria) -> Result<Vec<Candidate>, CollaboratorError>;
}

/// Persistent catalog of found users and the favorites list
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Insert or refresh a candidate; returns its catalog id
    async fn upsert_found_user(
        &self,
        candidate: &Candidate,
        criteria: &Criteria,
    ) -> Result<i64, CollaboratorError>;

    /// Link a catalog entry as favorite (no-op if already linked)
    async fn add_favorite(&self, found_user_id: i64) -> Result<(), CollaboratorError>;

    /// All favorites, oldest first
    async fn list_favorites(&self) -> Result<Vec<FavoriteRecord>, CollaboratorError>;

    /// Remove all favorite links
    async fn clear_favorites(&self) -> Result<(), CollaboratorError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send(&self, user_id: i64, message: &OutgoingMessage) -> Result<(), CollaboratorError> {
        (**self).send(user_id, message).await
    }
}

#[async_trait]
impl<T: CandidateSearch + ?Sized> CandidateSearch for Arc<T> {
    async fn search(&self, criteria: &Criteria) -> Result<Vec<Candidate>, CollaboratorError> {
        (**self).search(criteria).await
    }
}

#[async_trait]
impl<T: FavoritesStore + ?Sized> FavoritesStore for Arc<T> {
    async fn upsert_found_user(
        &self,
        candidate: &Candidate,
        criteria: &Criteria,
    ) -> Result<i64, CollaboratorError> {
        (**self).upsert_found_user(candidate, criteria).await
    }

    async fn add_favorite(&self, found_user_id: i64) -> Result<(), CollaboratorError> {
        (**self).add_favorite(found_user_id).await
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteRecord>, CollaboratorError> {
        (**self).list_favorites().await
    }

    async fn clear_favorites(&self) -> Result<(), CollaboratorError> {
        (**self).clear_favorites().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

impl From<DbError> for CollaboratorError {
    fn from(err: DbError) -> Self {
        CollaboratorError::storage(err.to_string())
    }
}

/// Adapter to use Database as `FavoritesStore`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoritesStore for DatabaseStorage {
    async fn upsert_found_user(
        &self,
        candidate: &Candidate,
        criteria: &Criteria,
    ) -> Result<i64, CollaboratorError> {
        Ok(self.db.upsert_found_user(candidate, criteria)?)
    }

    async fn add_favorite(&self, found_user_id: i64) -> Result<(), CollaboratorError> {
        let inserted = self.db.add_favorite(found_user_id)?;
        if !inserted {
            tracing::debug!(found_user_id, "Favorite already present");
        }
        Ok(())
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteRecord>, CollaboratorError> {
        Ok(self.db.list_favorites()?)
    }

    async fn clear_favorites(&self) -> Result<(), CollaboratorError> {
        let removed = self.db.clear_favorites()?;
        tracing::info!(removed, "Favorites cleared");
        Ok(())
    }
}
