//! LLM prompt wrappers
//!
//! The two typed flows this assistant is built on: scheme explanation and
//! eligibility judgment. Each owns its prompt, its response schema, and the
//! parsing of the model's JSON back into the typed output.

pub mod eligibility;
pub mod explain;

pub use eligibility::{check_eligibility, EligibilityRequest, EligibilityVerdict};
pub use explain::{explain_scheme, ExplainRequest, SchemeExplanation};

use crate::llm::LlmError;
use serde::de::DeserializeOwned;

/// Parse a model response as a JSON payload of type `T`.
///
/// Tolerates a Markdown code fence around the document, which some models
/// emit even in JSON mode.
fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let payload = strip_code_fence(text.trim());
    serde_json::from_str(payload)
        .map_err(|e| LlmError::unknown(format!("Failed to parse model output: {e} - output: {payload}")))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
