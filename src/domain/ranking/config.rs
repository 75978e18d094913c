//! Re-ranking configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Where boost keywords are looked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordScope {
    /// Every boost keyword found in the candidate counts
    #[default]
    Candidate,
    /// Only boost keywords present in both the query and the candidate count
    QueryAndCandidate,
}

/// Weights of the three score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_weight")]
    pub similarity: f32,
    #[serde(default = "default_weight")]
    pub keyword: f32,
    #[serde(default = "default_weight")]
    pub section: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            similarity: default_weight(),
            keyword: default_weight(),
            section: default_weight(),
        }
    }
}

/// Tunable re-ranking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Terms that raise a candidate's score when present in its text
    #[serde(default = "default_boost_keywords")]
    pub boost_keywords: Vec<String>,
    /// Score added per matching boost keyword
    #[serde(default = "default_keyword_increment")]
    pub keyword_increment: f32,
    /// Section label fragment -> weight. The highest weight among the
    /// fragments contained in a label applies.
    #[serde(default = "default_section_weights")]
    pub section_weights: BTreeMap<String, f32>,
    /// Weight for labels matching no table entry
    #[serde(default)]
    pub default_section_weight: f32,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub keyword_scope: KeywordScope,
}

fn default_boost_keywords() -> Vec<String> {
    [
        "adult",
        "pediatric",
        "initial",
        "repeat",
        "maximum",
        "contraindicated",
        "first-line",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

fn default_keyword_increment() -> f32 {
    0.02
}

fn default_section_weights() -> BTreeMap<String, f32> {
    [
        ("treatment", 0.06),
        ("medication", 0.06),
        ("dosing", 0.06),
        ("dosage", 0.06),
        ("contraindication", 0.04),
        ("assessment", 0.02),
        ("indication", 0.02),
        ("overview", 0.0),
        ("general", 0.0),
    ]
    .iter()
    .map(|(label, weight)| (label.to_string(), *weight))
    .collect()
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            boost_keywords: default_boost_keywords(),
            keyword_increment: default_keyword_increment(),
            section_weights: default_section_weights(),
            default_section_weight: 0.0,
            weights: ScoreWeights::default(),
            keyword_scope: KeywordScope::default(),
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.keyword_increment.is_finite() || self.keyword_increment < 0.0 {
            return Err(DomainError::configuration(
                "ranking.keyword_increment must be a non-negative number",
            ));
        }

        let weights = [
            ("similarity", self.weights.similarity),
            ("keyword", self.weights.keyword),
            ("section", self.weights.section),
        ];

        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::configuration(format!(
                    "ranking.weights.{} must be a non-negative number",
                    name
                )));
            }
        }

        if self.weights.similarity == 0.0 {
            return Err(DomainError::configuration(
                "ranking.weights.similarity must be greater than zero",
            ));
        }

        if let Some((label, _)) = self
            .section_weights
            .iter()
            .find(|(label, weight)| label.trim().is_empty() || !weight.is_finite())
        {
            return Err(DomainError::configuration(format!(
                "ranking.section_weights has an invalid entry '{}'",
                label
            )));
        }

        if self.boost_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(DomainError::configuration(
                "ranking.boost_keywords must not contain empty terms",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RankingConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.section_weights.get("dosing"), Some(&0.06));
        assert_eq!(config.keyword_scope, KeywordScope::Candidate);
    }

    #[test]
    fn test_negative_increment_rejected() {
        let config = RankingConfig {
            keyword_increment: -0.1,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_similarity_weight_rejected() {
        let config = RankingConfig {
            weights: ScoreWeights {
                similarity: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RankingConfig = serde_json::from_str(
            r#"{"keyword_increment": 0.05, "keyword_scope": "query_and_candidate", "weights": {"section": 2.0}}"#,
        )
        .unwrap();

        assert_eq!(config.keyword_increment, 0.05);
        assert_eq!(config.keyword_scope, KeywordScope::QueryAndCandidate);
        assert_eq!(config.weights.section, 2.0);
        assert_eq!(config.weights.similarity, 1.0);
        assert!(!config.boost_keywords.is_empty());
    }
}
