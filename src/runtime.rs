//! Runtime for executing sessions
//!
//! One `ChatRuntime` per session owns that session's state machine; the
//! `RuntimeManager` creates them on demand and fans their updates out to
//! streaming clients.

mod executor;
mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ChatRuntime, ELIGIBILITY_ERROR, EXPLANATION_ERROR};
pub use traits::*;

use crate::session::{Session, SessionStore};
use crate::state_machine::{ChatState, Event, SessionContext};
use executor::state_to_json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Events sent to streaming clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        session: serde_json::Value,
        messages: Vec<serde_json::Value>,
        busy: bool,
        state: serde_json::Value,
    },
    /// A transcript entry was appended
    Message { message: serde_json::Value },
    /// An existing transcript entry was replaced in place
    MessageUpdate { message: serde_json::Value },
    StateChange { state: serde_json::Value },
    /// Transient notification banner (explanation failures only)
    Toast { message: String },
    Error { message: String },
}

/// Handle to interact with a running session
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
}

/// Manager for all session runtimes
pub struct RuntimeManager {
    store: SessionStore,
    explanation_oracle: Arc<dyn ExplanationOracle>,
    verdict_oracle: Arc<dyn VerdictOracle>,
    runtimes: RwLock<HashMap<String, SessionHandle>>,
}

impl RuntimeManager {
    pub fn new(
        store: SessionStore,
        explanation_oracle: Arc<dyn ExplanationOracle>,
        verdict_oracle: Arc<dyn VerdictOracle>,
    ) -> Self {
        Self {
            store,
            explanation_oracle,
            verdict_oracle,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new session (seeded with the welcome entry) and start its
    /// runtime.
    pub async fn create_session(&self) -> Session {
        let id = uuid::Uuid::new_v4().to_string();
        let session = self.store.create_session(&id);
        self.start_runtime(&id).await;
        session
    }

    async fn start_runtime(&self, session_id: &str) -> SessionHandle {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let state = self
            .store
            .get_state(session_id)
            .unwrap_or(ChatState::Idle);

        let runtime = ChatRuntime::new(
            SessionContext::new(session_id),
            state,
            self.store.clone(),
            Arc::clone(&self.explanation_oracle),
            Arc::clone(&self.verdict_oracle),
            event_rx,
            event_tx.clone(),
            broadcast_tx.clone(),
        );

        let id = session_id.to_string();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(session_id = %id, "Session runtime finished");
        });

        self.runtimes.write().await.insert(
            session_id.to_string(),
            SessionHandle {
                event_tx: event_tx.clone(),
                broadcast_tx: broadcast_tx.clone(),
            },
        );

        SessionHandle {
            event_tx,
            broadcast_tx,
        }
    }

    /// Get the handle for a session, starting its runtime if needed
    pub async fn get_or_create(&self, session_id: &str) -> Result<SessionHandle, String> {
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(session_id) {
                return Ok(SessionHandle {
                    event_tx: handle.event_tx.clone(),
                    broadcast_tx: handle.broadcast_tx.clone(),
                });
            }
        }

        // The session must exist in the store before a runtime can serve it
        self.store
            .get_session(session_id)
            .map_err(|e| e.to_string())?;

        Ok(self.start_runtime(session_id).await)
    }

    /// Send an event to a session
    pub async fn send_event(&self, session_id: &str, event: Event) -> Result<(), String> {
        let handle = self.get_or_create(session_id).await?;
        handle
            .event_tx
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Subscribe to session updates
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<broadcast::Receiver<SseEvent>, String> {
        let handle = self.get_or_create(session_id).await?;
        Ok(handle.broadcast_tx.subscribe())
    }

    /// Snapshot of a session's state as JSON, for API reads
    pub fn state_json(&self, session_id: &str) -> Result<serde_json::Value, String> {
        let state = self
            .store
            .get_state(session_id)
            .map_err(|e| e.to_string())?;
        Ok(state_to_json(&state))
    }

    /// Whether the session is in a disabling state
    pub fn is_busy(&self, session_id: &str) -> bool {
        self.store
            .get_state(session_id)
            .map(|state| state.is_busy())
            .unwrap_or(false)
    }

    /// Get the session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
