//! Session store
//!
//! In-memory storage for sessions and their transcripts. Transcripts live
//! for the browser session and are never persisted; the store exists so the
//! HTTP layer can read consistent snapshots while the per-session runtime
//! mutates them.

mod transcript;

pub use transcript::*;

use crate::state_machine::ChatState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Greeting appended to every new session's transcript.
pub const WELCOME_MESSAGE: &str = "Welcome to Sarkari Mitra! How can I help you today? \
Ask me about a government scheme like \"PMAY\", \"PM-Kisan\", or \"Ayushman Bharat\".";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),
}

pub type SessionResult<T> = Result<T, SessionError>;

struct SessionRecord {
    session: Session,
    messages: Vec<Message>,
    state: ChatState,
    next_id: MessageId,
}

/// Thread-safe handle to the in-memory session store
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a session seeded with the welcome entry.
    pub fn create_session(&self, id: &str) -> Session {
        let now = chrono::Utc::now();
        let session = Session {
            id: id.to_string(),
            language: Language::default(),
            created_at: now,
            updated_at: now,
        };

        let welcome = Message::new(
            MessageId(0),
            Role::Bot,
            MessageContent::text(WELCOME_MESSAGE),
        );

        let record = SessionRecord {
            session: session.clone(),
            messages: vec![welcome],
            state: ChatState::Idle,
            next_id: MessageId(1),
        };

        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id.to_string(), record);
        session
    }

    fn with_record<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionRecord) -> SessionResult<T>,
    ) -> SessionResult<T> {
        let mut sessions = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))?;
        f(record)
    }

    pub fn get_session(&self, session_id: &str) -> SessionResult<Session> {
        self.with_record(session_id, |record| Ok(record.session.clone()))
    }

    pub fn get_messages(&self, session_id: &str) -> SessionResult<Vec<Message>> {
        self.with_record(session_id, |record| Ok(record.messages.clone()))
    }

    /// First unallocated message identifier for the session.
    pub fn next_message_id(&self, session_id: &str) -> SessionResult<MessageId> {
        self.with_record(session_id, |record| Ok(record.next_id))
    }

    /// Append a message whose identifier was pre-allocated from
    /// `next_message_id`. Advances the allocation watermark past it.
    pub fn append_message(&self, session_id: &str, message: Message) -> SessionResult<Message> {
        self.with_record(session_id, |record| {
            record.next_id = record.next_id.max(message.id.next());
            record.session.updated_at = chrono::Utc::now();
            record.messages.push(message.clone());
            Ok(message)
        })
    }

    /// Replace the content of an existing message in place. Role and
    /// identifier are immutable.
    pub fn update_message(
        &self,
        session_id: &str,
        message_id: MessageId,
        content: MessageContent,
    ) -> SessionResult<Message> {
        self.with_record(session_id, |record| {
            let message = record
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or(SessionError::MessageNotFound(message_id))?;
            message.content = content;
            record.session.updated_at = chrono::Utc::now();
            Ok(message.clone())
        })
    }

    pub fn language(&self, session_id: &str) -> SessionResult<Language> {
        self.with_record(session_id, |record| Ok(record.session.language))
    }

    pub fn set_language(&self, session_id: &str, language: Language) -> SessionResult<()> {
        self.with_record(session_id, |record| {
            record.session.language = language;
            record.session.updated_at = chrono::Utc::now();
            Ok(())
        })
    }

    /// Snapshot of the session's conversation state, for API reads.
    pub fn get_state(&self, session_id: &str) -> SessionResult<ChatState> {
        self.with_record(session_id, |record| Ok(record.state.clone()))
    }

    /// Record the conversation state after a transition.
    pub fn set_state(&self, session_id: &str, state: &ChatState) -> SessionResult<()> {
        self.with_record(session_id, |record| {
            record.state = state.clone();
            Ok(())
        })
    }
}
