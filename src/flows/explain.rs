//! Scheme explanation flow
//!
//! Turns a free-text query into a structured explanation of the scheme it
//! asks about, rendered in the user's preferred language.

use super::parse_json_payload;
use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::session::Language;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const SYSTEM_PROMPT: &str = "\
You are a friendly assistant that explains Indian government schemes to users in simple, clear language. Always reply in the user's preferred language.

When asked about a scheme, give:
1. Short explanation of the scheme.
2. Basic eligibility conditions.
3. Step-by-step process to apply.
4. Official link (if available).

Respond with a single JSON object with the fields `explanation`, `eligibility`, `applicationProcess`, `officialLink` (omit if unknown) and `language` (the language the answer is written in).";

const MAX_TOKENS: u32 = 1024;

/// Input for the explanation flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainRequest {
    /// The user query about a government scheme
    pub query: String,
    /// The preferred language of the user
    pub language: Language,
}

/// Structured explanation of a scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeExplanation {
    /// A simple, clear explanation of the scheme
    pub explanation: String,
    /// Basic eligibility conditions for the scheme
    pub eligibility: String,
    /// Step-by-step process to apply for the scheme
    pub application_process: String,
    /// Official link to apply for the scheme, if available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_link: Option<String>,
    /// The language the answer is rendered in
    pub language: String,
}

fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "explanation": {
                "type": "string",
                "description": "A simple, clear explanation of the scheme."
            },
            "eligibility": {
                "type": "string",
                "description": "Basic eligibility conditions for the scheme."
            },
            "applicationProcess": {
                "type": "string",
                "description": "Step-by-step process to apply for the scheme."
            },
            "officialLink": {
                "type": "string",
                "description": "Official link to apply for the scheme, if available."
            },
            "language": {
                "type": "string",
                "description": "The language the answer is written in."
            }
        },
        "required": ["explanation", "eligibility", "applicationProcess", "language"]
    })
}

/// Ask the model to explain the scheme a query refers to.
pub async fn explain_scheme(
    llm: &dyn LlmService,
    request: &ExplainRequest,
) -> Result<SchemeExplanation, LlmError> {
    let prompt = format!(
        "User Query: {}\nPreferred Language: {}",
        request.query, request.language
    );

    let llm_request = LlmRequest::new(prompt)
        .with_system(SYSTEM_PROMPT)
        .with_response_schema(response_schema())
        .with_max_tokens(MAX_TOKENS);

    let response = llm.generate(&llm_request).await?;
    parse_json_payload(&response.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_output() {
        let text = r#"{
            "explanation": "PMAY provides housing subsidies.",
            "eligibility": "Families without a pucca house.",
            "applicationProcess": "Apply on the PMAY portal.",
            "officialLink": "https://pmaymis.gov.in",
            "language": "English"
        }"#;
        let parsed: SchemeExplanation = parse_json_payload(text).unwrap();
        assert_eq!(parsed.official_link.as_deref(), Some("https://pmaymis.gov.in"));
        assert_eq!(parsed.language, "English");
    }

    #[test]
    fn test_parse_without_official_link() {
        let text = r#"{
            "explanation": "e",
            "eligibility": "c",
            "applicationProcess": "p",
            "language": "Hindi"
        }"#;
        let parsed: SchemeExplanation = parse_json_payload(text).unwrap();
        assert!(parsed.official_link.is_none());
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let explanation = SchemeExplanation {
            explanation: "e".to_string(),
            eligibility: "c".to_string(),
            application_process: "p".to_string(),
            official_link: None,
            language: "English".to_string(),
        };
        let value = serde_json::to_value(&explanation).unwrap();
        assert!(value.get("applicationProcess").is_some());
        // Absent link is omitted, not null
        assert!(value.get("officialLink").is_none());
    }

    #[test]
    fn test_schema_required_fields() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "applicationProcess"));
        assert!(!required.iter().any(|v| v == "officialLink"));
    }
}
