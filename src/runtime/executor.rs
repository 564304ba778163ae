//! Per-user session worker

use super::traits::{CandidateSearch, FavoritesStore, Messenger};
use super::SessionRegistry;
use crate::error::CollaboratorError;
use crate::favorites::FavoritesCoordinator;
use crate::state_machine::{reply, transition, ConvState, Effect, Event, SessionContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Owns one user's session and applies its events strictly in order
pub struct SessionRuntime<M, C, F>
where
    M: Messenger + 'static,
    C: CandidateSearch + 'static,
    F: FavoritesStore + 'static,
{
    context: SessionContext,
    state: ConvState,
    messenger: Arc<M>,
    search: Arc<C>,
    favorites: Arc<FavoritesCoordinator<F>>,
}

impl<M, C, F> SessionRuntime<M, C, F>
where
    M: Messenger + 'static,
    C: CandidateSearch + 'static,
    F: FavoritesStore + 'static,
{
    pub fn new(
        context: SessionContext,
        messenger: Arc<M>,
        search: Arc<C>,
        favorites: Arc<FavoritesCoordinator<F>>,
    ) -> Self {
        Self {
            context,
            state: ConvState::Idle,
            messenger,
            search,
            favorites,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn state(&self) -> &ConvState {
        &self.state
    }

    /// Process events until the session ends or stays idle for `idle_timeout`
    pub async fn run(
        mut self,
        mut event_rx: mpsc::UnboundedReceiver<Event>,
        registry: SessionRegistry,
        generation: u64,
        idle_timeout: Duration,
    ) {
        let user_id = self.context.user_id;
        tracing::info!(user_id, "Session started");

        let mut pending: Option<Event> = None;
        loop {
            let next = match pending.take() {
                Some(event) => Some(event),
                None => match tokio::time::timeout(idle_timeout, event_rx.recv()).await {
                    Ok(Some(event)) => Some(event),
                    // Dispatcher dropped the handle
                    Ok(None) => break,
                    Err(_) => None,
                },
            };

            if let Some(event) = next {
                if self.state.is_terminal() {
                    self.state = ConvState::Idle;
                }
                self.process_event(event).await;
                if !self.state.is_terminal() {
                    continue;
                }
            } else {
                tracing::info!(user_id, state = self.state.name(), "Session idle");
            }

            // Senders enqueue under the read lock, so holding the write lock here
            // means nothing can arrive between the emptiness check and removal.
            let mut sessions = registry.write().await;
            match event_rx.try_recv() {
                Ok(event) => pending = Some(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                    if sessions.get(&user_id).is_some_and(|h| h.generation == generation) {
                        sessions.remove(&user_id);
                    }
                    break;
                }
            }
        }

        tracing::info!(user_id, "Session discarded");
    }

    /// Apply one event and every collaborator outcome it chains into
    pub async fn process_event(&mut self, event: Event) {
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = transition(&self.state, &self.context, current_event);

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.name() != self.state.name() {
                tracing::debug!(
                    user_id = self.context.user_id,
                    from = old_state.name(),
                    to = self.state.name(),
                    "State transition"
                );
            }

            for effect in result.effects {
                match self.execute_effect(effect).await {
                    Ok(Some(generated_event)) => events_to_process.push(generated_event),
                    Ok(None) => {}
                    Err(e) => {
                        // Not delivered: the step has not happened yet
                        tracing::error!(
                            user_id = self.context.user_id,
                            error = %e,
                            "Failed to deliver message, keeping previous state"
                        );
                        self.state = old_state;
                        self.apologize().await;
                        return;
                    }
                }
            }
        }
    }

    /// Execute an effect. Only delivery failures are returned as errors;
    /// other collaborator failures come back as `CollaboratorFailed` events.
    async fn execute_effect(&self, effect: Effect) -> Result<Option<Event>, CollaboratorError> {
        let user_id = self.context.user_id;
        match effect {
            Effect::Send(message) => {
                self.messenger.send(user_id, &message).await?;
                Ok(None)
            }

            Effect::Search { criteria } => {
                tracing::info!(
                    user_id,
                    city = %criteria.city,
                    gender = criteria.gender.as_str(),
                    age = criteria.age.years(),
                    "Searching candidates"
                );
                let event = match self.search.search(&criteria).await {
                    Ok(candidates) => {
                        tracing::info!(user_id, found = candidates.len(), "Search completed");
                        Event::SearchCompleted { candidates }
                    }
                    Err(error) => failed(user_id, "search", error),
                };
                Ok(Some(event))
            }

            Effect::AddFavorite {
                candidate,
                criteria,
            } => {
                let event = match self.favorites.add(&candidate, &criteria).await {
                    Ok(_) => Event::FavoriteAdded,
                    Err(error) => failed(user_id, "add_favorite", error),
                };
                Ok(Some(event))
            }

            Effect::ListFavorites => {
                let event = match self.favorites.list().await {
                    Ok(favorites) => Event::FavoritesListed { favorites },
                    Err(error) => failed(user_id, "list_favorites", error),
                };
                Ok(Some(event))
            }

            Effect::ClearFavorites => {
                let event = match self.favorites.clear().await {
                    Ok(()) => Event::FavoritesCleared,
                    Err(error) => failed(user_id, "clear_favorites", error),
                };
                Ok(Some(event))
            }
        }
    }

    async fn apologize(&self) {
        if let Err(e) = self.messenger.send(self.context.user_id, &reply::apology()).await {
            tracing::warn!(user_id = self.context.user_id, error = %e, "Failed to send apology");
        }
    }
}

fn failed(user_id: i64, operation: &'static str, error: CollaboratorError) -> Event {
    tracing::warn!(user_id, operation, error = %error, "Collaborator call failed");
    Event::CollaboratorFailed { error }
}
