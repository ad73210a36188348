//! Effects produced by state transitions

use crate::schemes::Scheme;
use crate::session::{MessageContent, MessageId, Role};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a transcript entry with a pre-allocated identifier
    Append {
        id: MessageId,
        role: Role,
        content: MessageContent,
    },

    /// Replace an existing entry's content in place
    Replace { id: MessageId, content: MessageContent },

    /// Issue an explanation request asynchronously. The executor attaches
    /// the session's language preference at dispatch time.
    RequestExplanation { query: String },

    /// Issue a verdict request asynchronously
    RequestVerdict {
        scheme: Scheme,
        questions: Vec<String>,
        answers: Vec<bool>,
    },

    /// Surface a transient notification to the client
    Notify { message: String },
}

impl Effect {
    pub fn append_user(id: MessageId, content: MessageContent) -> Self {
        Effect::Append {
            id,
            role: Role::User,
            content,
        }
    }

    pub fn append_bot(id: MessageId, content: MessageContent) -> Self {
        Effect::Append {
            id,
            role: Role::Bot,
            content,
        }
    }
}
