//! API request and response types

use crate::session::{Language, Message, Session};
use serde::{Deserialize, Serialize};

/// Request to submit a free-text query
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Request to start an eligibility check
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEligibilityRequest {
    pub scheme_name: String,
}

/// Request to answer the current interview question
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: bool,
}

/// Request to change the session language
#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Language,
}

/// Response with a session and its transcript
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
    pub messages: Vec<Message>,
    pub busy: bool,
    pub state: serde_json::Value,
}

/// Response for queued user actions
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Scheme metadata for clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeInfo {
    pub name: String,
    pub question_count: usize,
}

/// Response listing the schemes with an eligibility flow
#[derive(Debug, Serialize)]
pub struct SchemesResponse {
    pub schemes: Vec<SchemeInfo>,
    pub languages: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
