//! Inheritance chain resolution and coverage fallback

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::{
    InheritanceChain, InheritanceChainEntry, JurisdictionId, JurisdictionRepository,
};
use crate::domain::error::HierarchyFault;
use crate::domain::search::Candidate;
use crate::domain::DomainError;

/// Whether one level of a chain has content for the current query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCoverage {
    pub entry: InheritanceChainEntry,
    pub covered: bool,
    pub candidate_count: usize,
}

/// Candidates drawn from the nearest covered level of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The chain level the candidates came from
    pub source: InheritanceChainEntry,
    /// True when `source` is an ancestor of the requester
    pub inherited: bool,
    pub candidates: Vec<Candidate>,
}

/// Walks parent links to build inheritance chains
#[derive(Clone)]
pub struct InheritanceResolver {
    repository: Arc<dyn JurisdictionRepository>,
}

impl std::fmt::Debug for InheritanceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InheritanceResolver").finish_non_exhaustive()
    }
}

impl InheritanceResolver {
    pub fn new(repository: Arc<dyn JurisdictionRepository>) -> Self {
        Self { repository }
    }

    /// Build the chain from `jurisdiction_id` up to its root
    ///
    /// Each jurisdiction appears once. A parent link that revisits the chain
    /// or names a missing jurisdiction aborts resolution.
    pub async fn resolve(
        &self,
        jurisdiction_id: &JurisdictionId,
    ) -> Result<InheritanceChain, DomainError> {
        let mut current = self
            .repository
            .get(jurisdiction_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Jurisdiction '{}' not found", jurisdiction_id))
            })?;

        let mut visited: HashSet<JurisdictionId> = HashSet::new();
        let mut entries: Vec<InheritanceChainEntry> = Vec::new();

        loop {
            visited.insert(current.id().clone());

            if let Some(previous) = entries.last() {
                if current.level() == previous.level {
                    warn!(
                        jurisdiction = %current.id(),
                        level = %current.level(),
                        "Jurisdiction shares a level with its child"
                    );
                }
            }

            entries.push(InheritanceChainEntry {
                jurisdiction_id: current.id().clone(),
                parent_id: current.parent_id().cloned(),
                level: current.level(),
                rank: entries.len(),
            });

            let Some(parent_id) = current.parent_id().cloned() else {
                break;
            };

            if visited.contains(&parent_id) {
                return Err(DomainError::invalid_hierarchy(
                    jurisdiction_id.as_str(),
                    HierarchyFault::Cycle {
                        revisited: parent_id.to_string(),
                    },
                ));
            }

            current = self.repository.get(&parent_id).await?.ok_or_else(|| {
                DomainError::invalid_hierarchy(
                    jurisdiction_id.as_str(),
                    HierarchyFault::DanglingParent {
                        parent_id: parent_id.to_string(),
                    },
                )
            })?;
        }

        debug!(
            jurisdiction = %jurisdiction_id,
            depth = entries.len(),
            "Resolved inheritance chain"
        );

        Ok(InheritanceChain::from_entries(entries))
    }

    /// Per-level coverage of the query for `jurisdiction_id`'s chain
    ///
    /// `matches` are the floor-passing candidates retrieved for the query
    /// topic across the whole chain.
    pub async fn coverage(
        &self,
        jurisdiction_id: &JurisdictionId,
        matches: &[Candidate],
    ) -> Result<Vec<LevelCoverage>, DomainError> {
        let chain = self.resolve(jurisdiction_id).await?;
        Ok(Self::coverage_in(&chain, matches))
    }

    /// Coverage of an already resolved chain
    pub fn coverage_in(chain: &InheritanceChain, matches: &[Candidate]) -> Vec<LevelCoverage> {
        chain
            .entries()
            .iter()
            .map(|entry| {
                let candidate_count = matches
                    .iter()
                    .filter(|c| c.source_jurisdiction == entry.jurisdiction_id)
                    .count();

                LevelCoverage {
                    entry: entry.clone(),
                    covered: candidate_count > 0,
                    candidate_count,
                }
            })
            .collect()
    }

    /// Keep only the candidates of the nearest covered level
    ///
    /// The requester wins if it has coverage; otherwise the closest ancestor
    /// with coverage does. Candidate order is preserved and each kept
    /// candidate is tagged with its originating level.
    pub fn select(chain: &InheritanceChain, candidates: Vec<Candidate>) -> Option<Selection> {
        let source = Self::coverage_in(chain, &candidates)
            .into_iter()
            .find(|level| level.covered)?
            .entry;

        let inherited = source.rank > 0;
        let dropped = candidates
            .iter()
            .filter(|c| chain.entry_for(&c.source_jurisdiction).is_none())
            .count();

        if dropped > 0 {
            warn!(dropped, "Index returned candidates outside the jurisdiction chain");
        }

        let candidates = candidates
            .into_iter()
            .filter(|c| c.source_jurisdiction == source.jurisdiction_id)
            .map(|mut c| {
                c.tag_origin(source.level, inherited);
                c
            })
            .collect();

        Some(Selection {
            source,
            inherited,
            candidates,
        })
    }
}
