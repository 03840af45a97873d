use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use shared::{
    domain::{Message, ModelId, ModelInfo, ModelRegistry},
    protocol::ChatReply,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod observer;
pub mod reconciler;
pub mod recovery;
pub mod store;
pub mod telemetry;
pub mod transport;

use config::ClientSettings;
use dispatcher::{Dispatch, Rejection};
use error::{ChatError, SelectionError};
use observer::{SessionObserver, TracingObserver};
use recovery::Notification;
use store::{SelectionPolicy, SessionSnapshot, SessionStore};
use transport::{ChatTransport, HttpTransport};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(Message),
    PendingChanged(bool),
    SessionIdChanged(String),
    SelectionChanged(Vec<ModelId>),
    RegistryUpdated(Vec<ModelInfo>),
    Notification(Notification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Rejected(Rejection),
    Resolved,
    Failed(ChatError),
    /// The session was closed or dropped while the call was in flight.
    Discarded,
}

/// Conversation controller for one UI instance.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    observer: Arc<dyn SessionObserver>,
    inner: Mutex<SessionStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Result<Arc<Self>, SelectionError> {
        let store = SessionStore::new(ModelRegistry::builtin(), SelectionPolicy::default())?;
        Ok(Self::new_with_dependencies(
            transport,
            Arc::new(TracingObserver),
            store,
        ))
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Arc<Self>> {
        let transport = HttpTransport::from_settings(settings)?;
        let policy = settings
            .selection_policy()
            .context("invalid model selection bounds")?;
        let store = SessionStore::new(ModelRegistry::builtin(), policy)
            .context("built-in registry cannot satisfy selection bounds")?;
        info!(
            "chat: session created session={} api_base={}",
            store.id(),
            transport.api_base()
        );
        Ok(Self::new_with_dependencies(
            Arc::new(transport),
            Arc::new(TracingObserver),
            store,
        ))
    }

    pub fn new_with_dependencies(
        transport: Arc<dyn ChatTransport>,
        observer: Arc<dyn SessionObserver>,
        store: SessionStore,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            transport,
            observer,
            inner: Mutex::new(store),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn session_id(&self) -> String {
        self.inner.lock().await.id().to_string()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.lock().await.messages().to_vec()
    }

    pub async fn is_pending(&self) -> bool {
        self.inner.lock().await.is_pending()
    }

    pub async fn registry(&self) -> ModelRegistry {
        self.inner.lock().await.registry().clone()
    }

    pub async fn select_model(&self, id: ModelId) -> Result<(), SelectionError> {
        let mut store = self.inner.lock().await;
        store.set_model(id)?;
        self.emit(SessionEvent::SelectionChanged(store.selected_models().to_vec()));
        Ok(())
    }

    pub async fn select_models(&self, ids: Vec<ModelId>) -> Result<(), SelectionError> {
        let mut store = self.inner.lock().await;
        store.set_models(ids)?;
        self.emit(SessionEvent::SelectionChanged(store.selected_models().to_vec()));
        Ok(())
    }

    pub async fn toggle_model(&self, id: ModelId) -> Result<(), SelectionError> {
        let mut store = self.inner.lock().await;
        store.toggle_model(id)?;
        self.emit(SessionEvent::SelectionChanged(store.selected_models().to_vec()));
        Ok(())
    }

    /// Fetches `/models` and swaps the registry in. Selection is pruned to the new registry.
    pub async fn refresh_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .transport
            .list_models()
            .await
            .context("failed to fetch model registry")?;

        let mut store = self.inner.lock().await;
        store
            .replace_registry(ModelRegistry::new(models))
            .context("fetched registry cannot satisfy selection bounds")?;
        let models = store.registry().models().to_vec();
        self.emit(SessionEvent::RegistryUpdated(models.clone()));
        self.emit(SessionEvent::SelectionChanged(store.selected_models().to_vec()));
        Ok(models)
    }

    /// Marks the session torn down. In-flight resolutions are dropped without committing.
    pub async fn close(&self) {
        self.inner.lock().await.close();
    }

    /// Runs a full send cycle and waits for it. The network call resolves on its
    /// own task, so dropping this future still clears the pending flag.
    pub async fn send(self: &Arc<Self>, content: &str) -> SendOutcome {
        let handle = match self.spawn_send(content).await {
            Ok(handle) => handle,
            Err(reason) => return SendOutcome::Rejected(reason),
        };
        match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("chat: send task ended without an outcome: {err}");
                SendOutcome::Discarded
            }
        }
    }

    /// Applies the optimistic update now and resolves the network call on a
    /// spawned task that only holds a weak reference to the session.
    pub async fn spawn_send(
        self: &Arc<Self>,
        content: &str,
    ) -> Result<JoinHandle<SendOutcome>, Rejection> {
        let dispatch = self.accept(content).await?;
        let session = Arc::downgrade(self);
        let transport = Arc::clone(&self.transport);
        Ok(tokio::spawn(async move {
            let outcome = execute(transport.as_ref(), &dispatch).await;
            resolve_weak(session, &dispatch, outcome).await
        }))
    }

    async fn accept(&self, content: &str) -> Result<Dispatch, Rejection> {
        let mut store = self.inner.lock().await;
        match dispatcher::prepare(&mut store, content) {
            Ok(dispatch) => {
                self.observer.send_accepted(
                    store.id(),
                    dispatch.payload.route(),
                    dispatch.payload.messages().len(),
                );
                if let Some(user_turn) = store.messages().last() {
                    self.emit(SessionEvent::MessageAppended(user_turn.clone()));
                }
                self.emit(SessionEvent::PendingChanged(true));
                Ok(dispatch)
            }
            Err(reason) => {
                self.observer.send_rejected(store.id(), reason);
                Err(reason)
            }
        }
    }

    async fn commit(
        &self,
        dispatch: &Dispatch,
        outcome: Result<ChatReply, ChatError>,
    ) -> SendOutcome {
        let mut store = self.inner.lock().await;
        if !store.is_live() {
            self.observer.send_discarded(store.id());
            return SendOutcome::Discarded;
        }

        let requested = dispatch.models();
        let reconciled = reconciler::reconcile(&mut store, &requested, &outcome);

        self.emit(SessionEvent::PendingChanged(false));
        for message in &store.messages()[reconciled.first_appended..] {
            self.emit(SessionEvent::MessageAppended(message.clone()));
        }
        if reconciled.adopted_session_id {
            self.emit(SessionEvent::SessionIdChanged(store.id().to_string()));
        }

        match outcome {
            Ok(_) => {
                self.observer
                    .send_resolved(store.id(), &requested, store.messages().len());
                SendOutcome::Resolved
            }
            Err(error) => {
                self.observer.send_failed(store.id(), &error);
                self.emit(SessionEvent::Notification(recovery::failure_notification(
                    &error,
                )));
                SendOutcome::Failed(error)
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is normal before the UI attaches.
        let _ = self.events.send(event);
    }
}

async fn execute(
    transport: &dyn ChatTransport,
    dispatch: &Dispatch,
) -> Result<ChatReply, ChatError> {
    dispatch.validation.clone()?;
    transport.send_chat(&dispatch.payload).await
}

async fn resolve_weak(
    session: Weak<ChatSession>,
    dispatch: &Dispatch,
    outcome: Result<ChatReply, ChatError>,
) -> SendOutcome {
    match session.upgrade() {
        Some(session) => session.commit(dispatch, outcome).await,
        None => {
            warn!("chat: session dropped before resolution; outcome discarded");
            SendOutcome::Discarded
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
