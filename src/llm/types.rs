//! Common types for LLM interactions
//!
//! The oracles in this system are single-turn: one prompt in, one structured
//! answer out. The request type reflects that instead of carrying a full
//! multi-turn message history.

use serde_json::Value;

/// A single-turn generation request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System instruction, if any
    pub system: Option<String>,
    /// The user-turn prompt
    pub prompt: String,
    /// JSON Schema the response must conform to. When set, providers use
    /// their structured-output mechanism and the response text is a JSON
    /// document matching the schema.
    pub response_schema: Option<Value>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            response_schema: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A generation response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Response text; a JSON document when the request carried a schema
    pub text: String,
    pub usage: Usage,
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
