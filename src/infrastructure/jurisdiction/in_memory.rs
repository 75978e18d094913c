//! In-memory jurisdiction repository

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::jurisdiction::{Jurisdiction, JurisdictionId, JurisdictionRepository};
use crate::domain::DomainError;

/// Jurisdiction hierarchy held in memory
///
/// Parent links are stored as given; broken or cyclic links are reported by
/// the resolver when a chain is walked, not on insert.
#[derive(Debug, Default)]
pub struct InMemoryJurisdictionRepository {
    jurisdictions: RwLock<HashMap<JurisdictionId, Jurisdiction>>,
}

impl InMemoryJurisdictionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jurisdictions(jurisdictions: impl IntoIterator<Item = Jurisdiction>) -> Self {
        let map = jurisdictions
            .into_iter()
            .map(|j| (j.id().clone(), j))
            .collect();

        Self {
            jurisdictions: RwLock::new(map),
        }
    }

    /// Insert or replace a jurisdiction
    pub async fn upsert(&self, jurisdiction: Jurisdiction) {
        self.jurisdictions
            .write()
            .await
            .insert(jurisdiction.id().clone(), jurisdiction);
    }

    /// Load a JSON array of jurisdictions, replacing entries with equal IDs
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<usize, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read jurisdiction file {}: {}",
                path.display(),
                e
            ))
        })?;

        let entries: Vec<Jurisdiction> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid jurisdiction file {}: {}",
                path.display(),
                e
            ))
        })?;

        let count = entries.len();
        let mut jurisdictions = self.jurisdictions.write().await;
        for jurisdiction in entries {
            jurisdictions.insert(jurisdiction.id().clone(), jurisdiction);
        }

        Ok(count)
    }
}

#[async_trait]
impl JurisdictionRepository for InMemoryJurisdictionRepository {
    async fn get(&self, id: &JurisdictionId) -> Result<Option<Jurisdiction>, DomainError> {
        Ok(self.jurisdictions.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Jurisdiction>, DomainError> {
        let mut all: Vec<Jurisdiction> = self.jurisdictions.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jurisdiction::JurisdictionLevel;

    fn jid(id: &str) -> JurisdictionId {
        JurisdictionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let repo = InMemoryJurisdictionRepository::with_jurisdictions(vec![
            Jurisdiction::new(jid("state-x"), "State X", JurisdictionLevel::State),
            Jurisdiction::new(jid("county-a"), "County A", JurisdictionLevel::Local)
                .with_parent(jid("state-x")),
        ]);

        let county = repo.get(&jid("county-a")).await.unwrap().unwrap();
        assert_eq!(county.parent_id(), Some(&jid("state-x")));
        assert!(repo.get(&jid("missing")).await.unwrap().is_none());

        let ids: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.id().to_string())
            .collect();
        assert_eq!(ids, vec!["county-a", "state-x"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let repo = InMemoryJurisdictionRepository::new();

        repo.upsert(Jurisdiction::new(jid("a"), "Old", JurisdictionLevel::Local))
            .await;
        repo.upsert(Jurisdiction::new(jid("a"), "New", JurisdictionLevel::Local))
            .await;

        assert_eq!(repo.get(&jid("a")).await.unwrap().unwrap().name(), "New");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_file() {
        let path = std::env::temp_dir().join(format!("jurisdictions-{}.json", uuid::Uuid::new_v4()));
        let body = serde_json::json!([
            {"id": "region-1", "name": "Region 1", "level": "regional", "parent_id": "state-x"},
            {"id": "state-x", "name": "State X", "level": "state"}
        ]);
        tokio::fs::write(&path, body.to_string()).await.unwrap();

        let repo = InMemoryJurisdictionRepository::new();
        let loaded = repo.load_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(loaded, 2);
        let region = repo.get(&jid("region-1")).await.unwrap().unwrap();
        assert_eq!(region.level(), JurisdictionLevel::Regional);
    }
}
