//! Scheme registry
//!
//! The closed set of welfare schemes the assistant can run an eligibility
//! interview for, each with its fixed, ordered yes/no question list, plus the
//! keyword heuristic that tags free-text queries with a scheme name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A welfare scheme with a built-in eligibility questionnaire.
///
/// Serialized by display name ("PMAY", "PM-Kisan", "Ayushman Bharat") so the
/// wire format matches what the oracles and clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "PMAY")]
    Pmay,
    #[serde(rename = "PM-Kisan")]
    PmKisan,
    #[serde(rename = "Ayushman Bharat")]
    AyushmanBharat,
}

impl Scheme {
    /// All schemes, in detection scan order.
    pub fn all() -> &'static [Scheme] {
        &[Scheme::Pmay, Scheme::PmKisan, Scheme::AyushmanBharat]
    }

    /// Display name, also the wire identifier.
    pub fn name(self) -> &'static str {
        match self {
            Scheme::Pmay => "PMAY",
            Scheme::PmKisan => "PM-Kisan",
            Scheme::AyushmanBharat => "Ayushman Bharat",
        }
    }

    /// Ordered eligibility questions for this scheme.
    pub fn questions(self) -> &'static [&'static str] {
        match self {
            Scheme::Pmay => &["Does your family own a pucca house already?"],
            Scheme::PmKisan => &["Do you own less than 2 hectares of cultivable land?"],
            Scheme::AyushmanBharat => &[
                "Is any member of your family a government employee?",
                "Does your family own a motorized vehicle or agricultural equipment?",
            ],
        }
    }

    /// Lowercase keywords that identify this scheme in a free-text query.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Scheme::Pmay => &["pmay", "pradhan mantri awas yojana"],
            Scheme::PmKisan => &["pm-kisan", "pradhan mantri kisan samman nidhi"],
            Scheme::AyushmanBharat => &["ayushman bharat", "pradhan mantri jan arogya yojana"],
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::all()
            .iter()
            .copied()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| UnknownScheme(s.to_string()))
    }
}

/// Scheme name outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scheme: {0}")]
pub struct UnknownScheme(pub String);

/// Look up the question list for a scheme identifier.
///
/// Unknown identifiers are not an error: they return an empty slice, which
/// the state machine reads as "no eligibility flow available".
pub fn questions_for(scheme_name: &str) -> &'static [&'static str] {
    scheme_name
        .parse::<Scheme>()
        .map_or(&[], Scheme::questions)
}

/// Tag a free-text query with the scheme it mentions, if any.
///
/// Case-insensitive substring match against each scheme's keywords, scanned
/// in the fixed `Scheme::all()` order. First match wins, mirroring the
/// original behavior for queries that mention several schemes.
pub fn detect_scheme(query: &str) -> Option<Scheme> {
    let query = query.to_lowercase();
    Scheme::all()
        .iter()
        .copied()
        .find(|scheme| scheme.keywords().iter().any(|kw| query.contains(kw)))
}
