//! Eligibility check flow
//!
//! Takes a completed questionnaire and asks the model for a verdict. The
//! positional pairing of question `i` with answer `i` is load-bearing and is
//! validated before anything reaches the model.

use super::parse_json_payload;
use crate::llm::{LlmError, LlmRequest, LlmService};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;

const SYSTEM_PROMPT: &str = "\
You are an expert in Indian government schemes. You will use the user's answers to determine their eligibility for the scheme. If the user is not eligible, provide a reason why.

Respond with a single JSON object with the fields `isEligible` (boolean) and `reason` (string, include when the user is not eligible).";

const MAX_TOKENS: u32 = 512;

/// Input for the eligibility flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    /// The name of the government scheme
    pub scheme_name: String,
    /// The eligibility questions, in the order they were asked
    pub questions: Vec<String>,
    /// The user's answers, positionally matching `questions`
    pub answers: Vec<bool>,
}

/// The model's eligibility verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityVerdict {
    /// Whether the user is eligible for the scheme
    pub is_eligible: bool,
    /// The reason for ineligibility, if applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "isEligible": {
                "type": "boolean",
                "description": "Whether the user is eligible for the scheme."
            },
            "reason": {
                "type": "string",
                "description": "The reason for ineligibility, if applicable."
            }
        },
        "required": ["isEligible"]
    })
}

fn build_prompt(request: &EligibilityRequest) -> String {
    let mut prompt = format!("Scheme Name: {}\n\nQuestions and Answers:\n", request.scheme_name);
    for (question, answer) in request.questions.iter().zip(&request.answers) {
        let _ = writeln!(
            prompt,
            "Question: {question}\nAnswer: {}",
            if *answer { "Yes" } else { "No" }
        );
    }
    prompt.push_str("\nDetermine if the user is eligible based on their answers.");
    prompt
}

/// Ask the model for an eligibility verdict on a completed questionnaire.
pub async fn check_eligibility(
    llm: &dyn LlmService,
    request: &EligibilityRequest,
) -> Result<EligibilityVerdict, LlmError> {
    if request.questions.len() != request.answers.len() {
        return Err(LlmError::invalid_request(format!(
            "Questions/answers length mismatch: {} questions, {} answers",
            request.questions.len(),
            request.answers.len()
        )));
    }

    let llm_request = LlmRequest::new(build_prompt(request))
        .with_system(SYSTEM_PROMPT)
        .with_response_schema(response_schema())
        .with_max_tokens(MAX_TOKENS);

    let response = llm.generate(&llm_request).await?;
    parse_json_payload(&response.text)
}
