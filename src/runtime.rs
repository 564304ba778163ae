//! Dispatch loop and per-user session workers
//!
//! Messages from different users are handled concurrently, one worker task per
//! active user. A user's messages are applied to that user's session strictly in
//! arrival order.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::favorites::FavoritesCoordinator;
use crate::state_machine::{Event, SessionContext};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Pause before polling again after the inbound source failed
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Live session workers by user id
pub type SessionRegistry = Arc<RwLock<HashMap<i64, SessionHandle>>>;

/// Handle to a running session worker
pub struct SessionHandle {
    pub event_tx: mpsc::UnboundedSender<Event>,
    /// Distinguishes a worker from its successor for the same user
    pub generation: u64,
}

/// Settings shared by every session
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub idle_timeout: Duration,
    pub banner_attachment: Option<String>,
}

/// Routes inbound messages to per-user session workers
pub struct Dispatcher<M, C, F>
where
    M: Messenger + 'static,
    C: CandidateSearch + 'static,
    F: FavoritesStore + 'static,
{
    messenger: Arc<M>,
    search: Arc<C>,
    favorites: Arc<FavoritesCoordinator<F>>,
    settings: DispatchSettings,
    sessions: SessionRegistry,
    next_generation: AtomicU64,
}

impl<M, C, F> Dispatcher<M, C, F>
where
    M: Messenger + 'static,
    C: CandidateSearch + 'static,
    F: FavoritesStore + 'static,
{
    pub fn new(messenger: M, search: C, store: F, settings: DispatchSettings) -> Self {
        Self {
            messenger: Arc::new(messenger),
            search: Arc::new(search),
            favorites: Arc::new(FavoritesCoordinator::new(store)),
            settings,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Consume the inbound stream until cancelled
    pub async fn run<S: InboundSource>(&self, mut source: S, shutdown: CancellationToken) {
        tracing::info!("Dispatch loop started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                batch = source.next_batch() => match batch {
                    Ok(batch) => {
                        for inbound in batch {
                            self.deliver(inbound).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to receive messages");
                        tokio::select! {
                            () = shutdown.cancelled() => break,
                            () = tokio::time::sleep(RECEIVE_RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }

        let active_sessions = self.active_sessions().await;
        tracing::info!(active_sessions, "Dispatch loop stopped");
    }

    /// Hand a message to its user's worker, starting one if needed
    pub async fn deliver(&self, inbound: Inbound) {
        let user_id = inbound.user_id;
        tracing::debug!(user_id, "Message received");
        let mut event = Event::user(inbound.text);

        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(&user_id) {
                match handle.event_tx.send(event) {
                    Ok(()) => return,
                    Err(mpsc::error::SendError(returned)) => event = returned,
                }
            }
        }

        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(&user_id) {
            match handle.event_tx.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    tracing::warn!(user_id, "Session worker gone, restarting");
                    event = returned;
                }
            }
        }

        let handle = self.spawn_session(user_id);
        if handle.event_tx.send(event).is_err() {
            tracing::error!(user_id, "New session worker rejected message");
        }
        sessions.insert(user_id, handle);
    }

    fn spawn_session(&self, user_id: i64) -> SessionHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let context = SessionContext::new(user_id).with_banner(self.settings.banner_attachment.clone());
        let runtime = SessionRuntime::new(
            context,
            self.messenger.clone(),
            self.search.clone(),
            self.favorites.clone(),
        );

        let registry = self.sessions.clone();
        let idle_timeout = self.settings.idle_timeout;
        tokio::spawn(async move {
            runtime.run(event_rx, registry, generation, idle_timeout).await;
        });

        SessionHandle {
            event_tx,
            generation,
        }
    }

    /// Number of users with a live session
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{wait_until, MockFavoritesStore, MockInbound, MockMessenger, MockSearch};
    use super::*;
    use crate::candidate::Candidate;
    use crate::error::CollaboratorError;

    type TestDispatcher = Dispatcher<Arc<MockMessenger>, Arc<MockSearch>, Arc<MockFavoritesStore>>;

    struct Harness {
        dispatcher: Arc<TestDispatcher>,
        messenger: Arc<MockMessenger>,
        search: Arc<MockSearch>,
    }

    fn harness(idle_timeout: Duration) -> Harness {
        let messenger = Arc::new(MockMessenger::new());
        let search = Arc::new(MockSearch::new());
        let store = Arc::new(MockFavoritesStore::new());
        let dispatcher = Arc::new(Dispatcher::new(
            messenger.clone(),
            search.clone(),
            store,
            DispatchSettings {
                idle_timeout,
                banner_attachment: None,
            },
        ));
        Harness {
            dispatcher,
            messenger,
            search,
        }
    }

    fn inbound(user_id: i64, text: &str) -> Inbound {
        Inbound {
            user_id,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_users_progress_independently() {
        let h = harness(Duration::from_secs(60));
        h.dispatcher.deliver(inbound(1, "Начать подбор")).await;
        h.dispatcher.deliver(inbound(2, "Начать")).await;
        h.dispatcher.deliver(inbound(1, "Москва")).await;

        let messenger = h.messenger.clone();
        wait_until(move || messenger.sent_count() >= 3).await;

        assert_eq!(
            h.messenger.sent_texts(1),
            vec!["Введите город для поиска:", "Начать поиск в городе Москва?"]
        );
        assert_eq!(
            h.messenger.sent_texts(2),
            vec!["Привет! Я - бот VKinder, который поможет тебе подобрать пару."]
        );
        assert_eq!(h.dispatcher.active_sessions().await, 2);
    }

    #[tokio::test]
    async fn test_per_user_order_is_preserved() {
        let h = harness(Duration::from_secs(60));
        h.search.queue_result(Ok(vec![
            Candidate::new(1, Some("А".into()), Some("Б".into()), vec![]),
            Candidate::new(2, Some("В".into()), Some("Г".into()), vec![]),
        ]));
        for text in ["Начать подбор", "Москва", "Да, верно", "Парень", "30", "Все верно", "Следующий"] {
            h.dispatcher.deliver(inbound(5, text)).await;
        }

        let messenger = h.messenger.clone();
        wait_until(move || messenger.sent_texts(5).iter().any(|t| t.starts_with("В Г"))).await;

        let texts = h.messenger.sent_texts(5);
        let first = texts.iter().position(|t| t.starts_with("А Б")).unwrap();
        let second = texts.iter().position(|t| t.starts_with("В Г")).unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_finish_discards_session() {
        let h = harness(Duration::from_secs(60));
        h.dispatcher.deliver(inbound(9, "Начать подбор")).await;
        h.dispatcher.deliver(inbound(9, "Завершить")).await;

        let dispatcher = h.dispatcher.clone();
        wait_until_async(move || {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.active_sessions().await == 0 }
        })
        .await;

        // A fresh session starts from the beginning
        h.dispatcher.deliver(inbound(9, "Москва")).await;
        let messenger = h.messenger.clone();
        wait_until(move || messenger.sent_texts(9).len() >= 3).await;
        assert_eq!(
            h.messenger.sent_texts(9)[2],
            "Привет! Я - бот VKinder, который поможет тебе подобрать пару."
        );
    }

    #[tokio::test]
    async fn test_idle_session_retires() {
        let h = harness(Duration::from_millis(50));
        h.dispatcher.deliver(inbound(3, "Начать подбор")).await;

        let dispatcher = h.dispatcher.clone();
        wait_until_async(move || {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.active_sessions().await == 0 }
        })
        .await;

        // Criteria were dropped with the session
        h.dispatcher.deliver(inbound(3, "Москва")).await;
        let messenger = h.messenger.clone();
        wait_until(move || messenger.sent_texts(3).len() >= 2).await;
        assert_ne!(h.messenger.sent_texts(3)[1], "Начать поиск в городе Москва?");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness(Duration::from_secs(60));
        // The failed poll leaves the loop in its retry pause
        let source = MockInbound::new(vec![
            Ok(vec![inbound(1, "Начать"), inbound(2, "Начать")]),
            Err(CollaboratorError::network("poll timeout")),
        ]);
        let shutdown = CancellationToken::new();

        let dispatcher = h.dispatcher.clone();
        let token = shutdown.clone();
        let task = tokio::spawn(async move { dispatcher.run(source, token).await });

        let messenger = h.messenger.clone();
        wait_until(move || messenger.sent_count() >= 2).await;
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("dispatch loop did not stop")
            .unwrap();
    }

    async fn wait_until_async<Fut>(mut check: impl FnMut() -> Fut)
    where
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..400 {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }
}
