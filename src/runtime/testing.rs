//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::candidate::Candidate;
use crate::criteria::Criteria;
use crate::db::FavoriteRecord;
use crate::error::CollaboratorError;
use crate::state_machine::OutgoingMessage;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Messenger
// ============================================================================

/// Records every delivered message; can be told to fail deliveries
pub struct MockMessenger {
    sent: Mutex<Vec<(i64, OutgoingMessage)>>,
    failures: Mutex<usize>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(0),
        }
    }

    /// Fail the next `n` deliveries
    pub fn fail_next(&self, n: usize) {
        *self.failures.lock().unwrap() = n;
    }

    pub fn sent_messages(&self, user_id: i64) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn sent_texts(&self, user_id: i64) -> Vec<String> {
        self.sent_messages(user_id).into_iter().map(|m| m.text).collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, user_id: i64, message: &OutgoingMessage) -> Result<(), CollaboratorError> {
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(CollaboratorError::network("mock delivery failure"));
            }
        }
        self.sent.lock().unwrap().push((user_id, message.clone()));
        Ok(())
    }
}

// ============================================================================
// Mock Search
// ============================================================================

/// Returns queued results in order; empty when nothing is queued
pub struct MockSearch {
    results: Mutex<VecDeque<Result<Vec<Candidate>, CollaboratorError>>>,
    requests: Mutex<Vec<Criteria>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_result(&self, result: Result<Vec<Candidate>, CollaboratorError>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn recorded_criteria(&self) -> Vec<Criteria> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateSearch for MockSearch {
    async fn search(&self, criteria: &Criteria) -> Result<Vec<Candidate>, CollaboratorError> {
        self.requests.lock().unwrap().push(criteria.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ============================================================================
// Mock Favorites Store
// ============================================================================

#[derive(Default)]
struct StoreState {
    catalog: Vec<Candidate>,
    favorites: Vec<i64>,
    fail_with: Option<String>,
}

/// In-memory catalog and favorites list
pub struct MockFavoritesStore {
    state: Mutex<StoreState>,
}

impl MockFavoritesStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Fail the next store call with a storage error
    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().fail_with = Some(message.to_string());
    }

    pub fn favorites(&self) -> Vec<Candidate> {
        let state = self.state.lock().unwrap();
        state
            .favorites
            .iter()
            .map(|id| state.catalog[catalog_index(*id)].clone())
            .collect()
    }

    fn check_failure(state: &mut StoreState) -> Result<(), CollaboratorError> {
        match state.fail_with.take() {
            Some(message) => Err(CollaboratorError::storage(message)),
            None => Ok(()),
        }
    }
}

/// Catalog ids start at 1 like SQLite rowids
fn catalog_index(id: i64) -> usize {
    usize::try_from(id - 1).unwrap()
}

#[async_trait]
impl FavoritesStore for MockFavoritesStore {
    async fn upsert_found_user(
        &self,
        candidate: &Candidate,
        _criteria: &Criteria,
    ) -> Result<i64, CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        if let Some(pos) = state.catalog.iter().position(|c| c.vk_id == candidate.vk_id) {
            state.catalog[pos] = candidate.clone();
            return Ok(pos as i64 + 1);
        }
        state.catalog.push(candidate.clone());
        Ok(state.catalog.len() as i64)
    }

    async fn add_favorite(&self, found_user_id: i64) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        if found_user_id < 1 || catalog_index(found_user_id) >= state.catalog.len() {
            return Err(CollaboratorError::storage(format!(
                "Found user not found: {found_user_id}"
            )));
        }
        if !state.favorites.contains(&found_user_id) {
            state.favorites.push(found_user_id);
        }
        Ok(())
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteRecord>, CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        Ok(state
            .favorites
            .iter()
            .map(|id| FavoriteRecord {
                found_user_id: *id,
                candidate: state.catalog[catalog_index(*id)].clone(),
                added_at: Utc::now(),
            })
            .collect())
    }

    async fn clear_favorites(&self) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        state.favorites.clear();
        Ok(())
    }
}

// ============================================================================
// Mock Inbound Source
// ============================================================================

/// Yields queued batches, then waits forever
pub struct MockInbound {
    batches: VecDeque<Result<Vec<Inbound>, CollaboratorError>>,
}

impl MockInbound {
    pub fn new(batches: Vec<Result<Vec<Inbound>, CollaboratorError>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

#[async_trait]
impl InboundSource for MockInbound {
    async fn next_batch(&mut self) -> Result<Vec<Inbound>, CollaboratorError> {
        match self.batches.pop_front() {
            Some(batch) => batch,
            None => std::future::pending().await,
        }
    }
}

/// Poll `check` until it holds, failing the test after a few seconds
pub async fn wait_until(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
