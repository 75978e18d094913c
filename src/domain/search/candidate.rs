//! Retrieved chunk and candidate types

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::jurisdiction::{JurisdictionId, JurisdictionLevel};

/// Raw nearest-neighbour hit as returned by a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMatch {
    pub chunk_id: String,
    pub protocol_id: String,
    pub protocol_title: String,
    /// Section label of the chunk, e.g. "Dosing" or "Overview"
    pub section: String,
    pub content: String,
    pub jurisdiction_id: JurisdictionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    /// Cosine similarity to the query vector (0.0 - 1.0)
    pub similarity: f32,
}

impl ChunkMatch {
    pub fn new(
        chunk_id: impl Into<String>,
        protocol_id: impl Into<String>,
        jurisdiction_id: JurisdictionId,
        similarity: f32,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            protocol_id: protocol_id.into(),
            protocol_title: String::new(),
            section: String::new(),
            content: String::new(),
            jurisdiction_id,
            effective_date: None,
            similarity,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.protocol_title = title.into();
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }
}

/// A floor-passing hit with its re-ranked score and provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub chunk_id: String,
    pub protocol_id: String,
    pub protocol_title: String,
    pub section: String,
    pub content: String,
    pub source_jurisdiction: JurisdictionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    /// Raw similarity from the index
    pub similarity: f32,
    /// Re-ranked score used for ordering
    pub score: f32,
    /// Level of the jurisdiction this content came from, once resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_level: Option<JurisdictionLevel>,
    /// True when the content was inherited from an ancestor jurisdiction
    pub inherited: bool,
}

impl Candidate {
    pub fn from_match(hit: ChunkMatch, score: f32) -> Self {
        Self {
            chunk_id: hit.chunk_id,
            protocol_id: hit.protocol_id,
            protocol_title: hit.protocol_title,
            section: hit.section,
            content: hit.content,
            source_jurisdiction: hit.jurisdiction_id,
            effective_date: hit.effective_date,
            similarity: hit.similarity,
            score,
            origin_level: None,
            inherited: false,
        }
    }

    /// Tag with the originating level of the hierarchy
    pub fn tag_origin(&mut self, level: JurisdictionLevel, inherited: bool) {
        self.origin_level = Some(level);
        self.inherited = inherited;
    }
}

/// Total order for ranked output
///
/// Higher score first, then the most recent effective date (undated last),
/// then ascending chunk ID.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| match (a.effective_date, b.effective_date) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f32, date: Option<(i32, u32, u32)>) -> Candidate {
        let mut hit = ChunkMatch::new(id, "p1", JurisdictionId::new("j").unwrap(), score);

        if let Some((y, m, d)) = date {
            hit = hit.with_effective_date(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        }

        Candidate::from_match(hit, score)
    }

    #[test]
    fn test_higher_score_first() {
        let a = candidate("a", 0.5, None);
        let b = candidate("b", 0.7, None);

        assert_eq!(compare_candidates(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_tie_breaks_on_recent_date() {
        let old = candidate("a", 0.5, Some((2020, 1, 1)));
        let new = candidate("b", 0.5, Some((2024, 6, 1)));

        let mut list = vec![old, new];
        list.sort_by(compare_candidates);

        assert_eq!(list[0].chunk_id, "b");
    }

    #[test]
    fn test_undated_sorts_after_dated() {
        let undated = candidate("a", 0.5, None);
        let dated = candidate("z", 0.5, Some((2019, 1, 1)));

        let mut list = vec![undated, dated];
        list.sort_by(compare_candidates);

        assert_eq!(list[0].chunk_id, "z");
    }

    #[test]
    fn test_final_tie_break_on_chunk_id() {
        let mut list = vec![
            candidate("c", 0.5, Some((2024, 1, 1))),
            candidate("a", 0.5, Some((2024, 1, 1))),
            candidate("b", 0.5, Some((2024, 1, 1))),
        ];
        list.sort_by(compare_candidates);

        let ids: Vec<_> = list.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tag_origin() {
        let mut c = candidate("a", 0.5, None);
        c.tag_origin(JurisdictionLevel::Regional, true);

        assert_eq!(c.origin_level, Some(JurisdictionLevel::Regional));
        assert!(c.inherited);
    }
}
