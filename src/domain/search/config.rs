//! Search configuration types

use serde::{Deserialize, Serialize};

use super::IntentTier;
use crate::domain::DomainError;

/// Similarity floors, candidate counts and classification vocabularies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Floor for medication/dosing queries (0.0 - 1.0)
    #[serde(default = "default_medication_floor")]
    pub medication_floor: f32,
    /// Floor for procedure queries (0.0 - 1.0)
    #[serde(default = "default_procedure_floor")]
    pub procedure_floor: f32,
    /// Floor for general queries (0.0 - 1.0)
    #[serde(default = "default_general_floor")]
    pub general_floor: f32,
    /// Floor applied regardless of tier
    #[serde(default = "default_absolute_floor")]
    pub absolute_floor: f32,
    /// Number of nearest neighbours fetched from the index
    #[serde(default = "default_initial_top_k")]
    pub initial_top_k: usize,
    /// Number of results returned for ordinary queries
    #[serde(default = "default_final_count")]
    pub final_count: usize,
    /// Number of results returned for multi-part/differential queries
    #[serde(default = "default_multi_part_count")]
    pub multi_part_count: usize,
    /// Time budget for one index query
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_medication_keywords")]
    pub medication_keywords: Vec<String>,
    #[serde(default = "default_procedure_keywords")]
    pub procedure_keywords: Vec<String>,
    #[serde(default = "default_multi_part_markers")]
    pub multi_part_markers: Vec<String>,
}

fn default_medication_floor() -> f32 {
    0.38
}

fn default_procedure_floor() -> f32 {
    0.34
}

fn default_general_floor() -> f32 {
    0.30
}

fn default_absolute_floor() -> f32 {
    0.20
}

fn default_initial_top_k() -> usize {
    20
}

fn default_final_count() -> usize {
    5
}

fn default_multi_part_count() -> usize {
    8
}

fn default_timeout_ms() -> u64 {
    1_500
}

fn to_strings(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

fn default_medication_keywords() -> Vec<String> {
    to_strings(&[
        "dose",
        "doses",
        "dosing",
        "dosage",
        "mg",
        "mcg",
        "medication",
        "medications",
        "drug",
        "drugs",
        "administer",
        "infusion",
        "bolus",
        "concentration",
    ])
}

fn default_procedure_keywords() -> Vec<String> {
    to_strings(&[
        "procedure",
        "intubation",
        "airway",
        "cpr",
        "defibrillation",
        "cardioversion",
        "pacing",
        "needle",
        "decompression",
        "splint",
        "splinting",
        "tourniquet",
        "cricothyrotomy",
        "iv access",
        "io access",
        "technique",
    ])
}

fn default_multi_part_markers() -> Vec<String> {
    to_strings(&["vs", "versus", "differential", "compare", "difference between"])
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            medication_floor: default_medication_floor(),
            procedure_floor: default_procedure_floor(),
            general_floor: default_general_floor(),
            absolute_floor: default_absolute_floor(),
            initial_top_k: default_initial_top_k(),
            final_count: default_final_count(),
            multi_part_count: default_multi_part_count(),
            timeout_ms: default_timeout_ms(),
            medication_keywords: default_medication_keywords(),
            procedure_keywords: default_procedure_keywords(),
            multi_part_markers: default_multi_part_markers(),
        }
    }
}

impl SearchConfig {
    /// Effective floor for a tier, never below the absolute floor
    pub fn floor_for(&self, tier: IntentTier) -> f32 {
        let tier_floor = match tier {
            IntentTier::Medication => self.medication_floor,
            IntentTier::Procedure => self.procedure_floor,
            IntentTier::General => self.general_floor,
        };

        tier_floor.max(self.absolute_floor)
    }

    /// Number of results to return
    pub fn result_count(&self, multi_part: bool) -> usize {
        if multi_part {
            self.multi_part_count
        } else {
            self.final_count
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let floors = [
            ("medication_floor", self.medication_floor),
            ("procedure_floor", self.procedure_floor),
            ("general_floor", self.general_floor),
            ("absolute_floor", self.absolute_floor),
        ];

        for (name, value) in floors {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::configuration(format!(
                    "search.{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if self.medication_floor < self.procedure_floor
            || self.procedure_floor < self.general_floor
        {
            return Err(DomainError::configuration(
                "search floors must satisfy medication >= procedure >= general",
            ));
        }

        if self.general_floor < self.absolute_floor {
            return Err(DomainError::configuration(
                "search.general_floor must not be below search.absolute_floor",
            ));
        }

        if self.final_count == 0 || self.multi_part_count == 0 {
            return Err(DomainError::configuration(
                "search result counts must be greater than zero",
            ));
        }

        if self.initial_top_k < self.final_count.max(self.multi_part_count) {
            return Err(DomainError::configuration(
                "search.initial_top_k must be at least the largest result count",
            ));
        }

        if self.timeout_ms == 0 {
            return Err(DomainError::configuration(
                "search.timeout_ms must be greater than zero",
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
        let config = SearchConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.initial_top_k, 20);
        assert_eq!(config.result_count(false), 5);
        assert_eq!(config.result_count(true), 8);
    }

    #[test]
    fn test_floor_ordering() {
        let config = SearchConfig::default();

        assert_eq!(config.floor_for(IntentTier::Medication), 0.38);
        assert_eq!(config.floor_for(IntentTier::General), 0.30);
        assert!(config.floor_for(IntentTier::Procedure) < config.floor_for(IntentTier::Medication));
    }

    #[test]
    fn test_absolute_floor_dominates() {
        let config = SearchConfig {
            general_floor: 0.1,
            absolute_floor: 0.2,
            ..Default::default()
        };

        assert_eq!(config.floor_for(IntentTier::General), 0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_floors_rejected() {
        let config = SearchConfig {
            medication_floor: 0.25,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(DomainError::Configuration { .. })
        ));
    }

    #[test]
    fn test_top_k_must_cover_result_count() {
        let config = SearchConfig {
            initial_top_k: 4,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"medication_floor": 0.5}"#).unwrap();

        assert_eq!(config.medication_floor, 0.5);
        assert_eq!(config.general_floor, 0.30);
        assert!(!config.medication_keywords.is_empty());
    }
}
