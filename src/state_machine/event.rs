//! Events that can occur in a session

use crate::flows::{EligibilityVerdict, SchemeExplanation};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User actions
    /// Free-text query submitted
    SubmitQuery { text: String },
    /// "Check Eligibility" pressed for a scheme
    StartEligibility { scheme_name: String },
    /// Yes/No answer to the current interview question
    Answer { value: bool },

    // Oracle resolutions
    ExplanationReady { explanation: SchemeExplanation },
    ExplanationFailed { message: String },
    VerdictReady { verdict: EligibilityVerdict },
    VerdictFailed { message: String },
}
