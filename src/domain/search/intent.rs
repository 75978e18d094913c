//! Query intent classification

use std::fmt;

use serde::{Deserialize, Serialize};

use super::SearchConfig;
use crate::domain::jurisdiction::JurisdictionId;

/// Safety-sensitivity tier of a query, selecting its similarity floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentTier {
    /// Medication or dosing questions; highest floor
    Medication,
    /// Procedures and interventions
    Procedure,
    /// Everything else; lowest floor
    General,
}

impl fmt::Display for IntentTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medication => write!(f, "medication"),
            Self::Procedure => write!(f, "procedure"),
            Self::General => write!(f, "general"),
        }
    }
}

/// A classified query ready for retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub intent: IntentTier,
    /// Multi-part or differential questions get a larger result set
    pub multi_part: bool,
    pub jurisdiction_id: JurisdictionId,
}

/// Keyword-based intent classifier
///
/// Medication terms win over procedure terms so that mixed queries
/// ("IV access for epinephrine") are held to the stricter floor.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    medication_terms: Vec<String>,
    procedure_terms: Vec<String>,
    multi_part_markers: Vec<String>,
}

impl QueryClassifier {
    pub fn new(config: &SearchConfig) -> Self {
        let lower = |terms: &[String]| terms.iter().map(|t| t.to_lowercase()).collect();

        Self {
            medication_terms: lower(&config.medication_keywords),
            procedure_terms: lower(&config.procedure_keywords),
            multi_part_markers: lower(&config.multi_part_markers),
        }
    }

    /// Classify raw query text
    pub fn classify(&self, text: &str, jurisdiction_id: JurisdictionId) -> SearchQuery {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let intent = if contains_any(&lowered, &words, &self.medication_terms) {
            IntentTier::Medication
        } else if contains_any(&lowered, &words, &self.procedure_terms) {
            IntentTier::Procedure
        } else {
            IntentTier::General
        };

        let multi_part = contains_any(&lowered, &words, &self.multi_part_markers);

        SearchQuery {
            text: text.to_string(),
            intent,
            multi_part,
            jurisdiction_id,
        }
    }
}

/// Single-word terms match whole words; phrases match as substrings
fn contains_any(lowered: &str, words: &[&str], terms: &[String]) -> bool {
    terms.iter().any(|term| {
        if term.contains(' ') {
            lowered.contains(term.as_str())
        } else {
            words.iter().any(|w| w == term)
        }
    })
}
