//! Deterministic candidate re-ranking

use regex::{Regex, RegexBuilder};

use super::{KeywordScope, RankingConfig};
use crate::domain::search::{compare_candidates, Candidate, ChunkMatch};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct BoostKeyword {
    term: String,
    pattern: Regex,
}

impl BoostKeyword {
    fn compile(term: &str) -> Result<Self, DomainError> {
        let term = term.trim().to_lowercase();
        let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        let leading = if is_word(term.chars().next()) { r"\b" } else { "" };
        let trailing = if is_word(term.chars().last()) { r"\b" } else { "" };

        let pattern = RegexBuilder::new(&format!(
            "{}{}{}",
            leading,
            regex::escape(&term),
            trailing
        ))
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            DomainError::configuration(format!("Invalid boost keyword '{}': {}", term, e))
        })?;

        Ok(Self { term, pattern })
    }

    fn found_in(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Scores retrieved chunks from similarity, keyword and section signals
///
/// `score = w_sim * similarity + w_kw * (increment * keyword_matches) + w_sec * section_weight`
///
/// Scoring has no state beyond the configuration, so identical inputs always
/// produce identical scores.
#[derive(Debug, Clone)]
pub struct ReRanker {
    config: RankingConfig,
    keywords: Vec<BoostKeyword>,
    sections: Vec<(String, f32)>,
}

impl ReRanker {
    pub fn new(config: RankingConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let keywords = config
            .boost_keywords
            .iter()
            .map(|term| BoostKeyword::compile(term))
            .collect::<Result<Vec<_>, _>>()?;

        let sections = config
            .section_weights
            .iter()
            .map(|(label, weight)| (label.trim().to_lowercase(), *weight))
            .collect();

        Ok(Self {
            config,
            keywords,
            sections,
        })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Boosted score for one hit
    pub fn score(&self, hit: &ChunkMatch, query_text: &str) -> f32 {
        let weights = self.config.weights;
        let matches = self.keyword_matches(hit, query_text) as f32;

        weights.similarity * hit.similarity
            + weights.keyword * (self.config.keyword_increment * matches)
            + weights.section * self.section_weight(&hit.section)
    }

    /// Weight of a section label
    ///
    /// The label matches every table key it contains, case-insensitively;
    /// the highest matching weight wins.
    pub fn section_weight(&self, label: &str) -> f32 {
        let label = label.to_lowercase();

        self.sections
            .iter()
            .filter(|(key, _)| label.contains(key.as_str()))
            .map(|(_, weight)| *weight)
            .reduce(f32::max)
            .unwrap_or(self.config.default_section_weight)
    }

    /// Number of distinct boost keywords counted for a hit
    pub fn keyword_matches(&self, hit: &ChunkMatch, query_text: &str) -> usize {
        self.keywords
            .iter()
            .filter(|keyword| {
                keyword.found_in(&hit.content) || keyword.found_in(&hit.protocol_title)
            })
            .filter(|keyword| match self.config.keyword_scope {
                KeywordScope::Candidate => true,
                KeywordScope::QueryAndCandidate => keyword.found_in(query_text),
            })
            .count()
    }

    /// Score every hit and order the result
    pub fn rank(&self, hits: Vec<ChunkMatch>, query_text: &str) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .map(|hit| {
                let score = self.score(&hit, query_text);
                Candidate::from_match(hit, score)
            })
            .collect();

        candidates.sort_by(compare_candidates);
        candidates
    }
}
