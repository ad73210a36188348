//! Session and transcript types

use crate::flows::{EligibilityVerdict, SchemeExplanation};
use crate::schemes::Scheme;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transcript entry identifier, unique and monotonically allocated within a
/// session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    pub fn next(self) -> MessageId {
        MessageId(self.0 + 1)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who authored a transcript entry. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// Renderable payload of a transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text
    Text { text: String },

    /// Placeholder while an oracle request is outstanding
    Loading,

    /// A structured scheme explanation. `scheme` is present when the query
    /// matched a known scheme, enabling the "Check Eligibility" affordance.
    Explanation {
        explanation: SchemeExplanation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scheme: Option<Scheme>,
    },

    /// An interview question with Yes/No affordances. Frozen into `Text`
    /// once answered.
    Question { question: String },

    /// The eligibility verdict
    Verdict { verdict: EligibilityVerdict },

    /// Inline error shown where a pending result was expected
    Error { message: String },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        MessageContent::Error {
            message: message.into(),
        }
    }

    #[allow(dead_code)] // State query utility, used by tests
    pub fn is_loading(&self) -> bool {
        matches!(self, MessageContent::Loading)
    }
}

/// A transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, role: Role, content: MessageContent) -> Self {
        Self {
            id,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Session-wide language preference, read at explanation-request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Telugu,
    Tamil,
    Gujarati,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::English,
            Language::Hindi,
            Language::Telugu,
            Language::Tamil,
            Language::Gujarati,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Telugu => "Telugu",
            Language::Tamil => "Tamil",
            Language::Gujarati => "Gujarati",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.name() == s)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Language outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

/// Session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
