//! Trait abstractions for the two oracles
//!
//! These traits enable testing the executor with mock implementations. The
//! production adapters bind them to the LLM prompt flows.

use crate::flows::{
    check_eligibility, explain_scheme, EligibilityRequest, EligibilityVerdict, ExplainRequest,
    SchemeExplanation,
};
use crate::llm::{LlmError, LlmService};
use async_trait::async_trait;
use std::sync::Arc;

/// Oracle answering free-text scheme queries
#[async_trait]
pub trait ExplanationOracle: Send + Sync {
    async fn explain(&self, request: &ExplainRequest) -> Result<SchemeExplanation, LlmError>;
}

/// Oracle judging a completed eligibility questionnaire
#[async_trait]
pub trait VerdictOracle: Send + Sync {
    async fn check(&self, request: &EligibilityRequest) -> Result<EligibilityVerdict, LlmError>;
}

#[async_trait]
impl<T: ExplanationOracle + ?Sized> ExplanationOracle for Arc<T> {
    async fn explain(&self, request: &ExplainRequest) -> Result<SchemeExplanation, LlmError> {
        (**self).explain(request).await
    }
}

#[async_trait]
impl<T: VerdictOracle + ?Sized> VerdictOracle for Arc<T> {
    async fn check(&self, request: &EligibilityRequest) -> Result<EligibilityVerdict, LlmError> {
        (**self).check(request).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Explanation oracle backed by the configured LLM service
pub struct LlmExplanationOracle {
    service: Option<Arc<dyn LlmService>>,
}

impl LlmExplanationOracle {
    pub fn new(service: Option<Arc<dyn LlmService>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ExplanationOracle for LlmExplanationOracle {
    async fn explain(&self, request: &ExplainRequest) -> Result<SchemeExplanation, LlmError> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| LlmError::auth("No LLM provider configured"))?;
        explain_scheme(service.as_ref(), request).await
    }
}

/// Verdict oracle backed by the configured LLM service
pub struct LlmVerdictOracle {
    service: Option<Arc<dyn LlmService>>,
}

impl LlmVerdictOracle {
    pub fn new(service: Option<Arc<dyn LlmService>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl VerdictOracle for LlmVerdictOracle {
    async fn check(&self, request: &EligibilityRequest) -> Result<EligibilityVerdict, LlmError> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| LlmError::auth("No LLM provider configured"))?;
        check_eligibility(service.as_ref(), request).await
    }
}
