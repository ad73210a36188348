//! Conversation state types

use crate::schemes::Scheme;
use crate::session::MessageId;
use serde::{Deserialize, Serialize};

/// Conversation state
///
/// One enum instead of independent flags so that the mutual exclusion of the
/// disabling states holds by construction: free-text input is only accepted
/// in `Idle`, answers only in `InterviewActive`, and at most one explanation
/// and one verdict request can be outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// No interview in progress; free-text input accepted
    #[default]
    Idle,

    /// An explanation request is outstanding
    AwaitingExplanation {
        /// The loading entry to replace when the oracle settles
        placeholder: MessageId,
        /// Scheme heuristically detected in the submitted query, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scheme: Option<Scheme>,
    },

    /// A yes/no question is displayed; only the two answer actions are
    /// accepted
    InterviewActive {
        scheme: Scheme,
        question_index: usize,
        answers: Vec<bool>,
        /// The interactive question entry, frozen to plain text on answer
        question_message: MessageId,
    },

    /// All questions answered; a verdict request is outstanding
    AwaitingVerdict {
        /// The loading entry to replace when the oracle settles
        placeholder: MessageId,
    },
}

impl ChatState {
    /// Whether an operation is in flight or an interview is running. All
    /// such states disable free-text input and eligibility starts.
    pub fn is_busy(&self) -> bool {
        !matches!(self, ChatState::Idle)
    }
}

/// Context for a session's state machine (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}
