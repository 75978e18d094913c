//! Jurisdiction entities

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Identifier of a jurisdiction (e.g. `county-king`, `region-west`, `state-wa`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JurisdictionId(String);

impl JurisdictionId {
    /// Create a validated identifier
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("Jurisdiction ID cannot be empty"));
        }

        if trimmed.len() > 100 {
            return Err(DomainError::validation(
                "Jurisdiction ID cannot exceed 100 characters",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JurisdictionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JurisdictionId> for String {
    fn from(id: JurisdictionId) -> Self {
        id.0
    }
}

impl fmt::Display for JurisdictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Administrative level of a jurisdiction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JurisdictionLevel {
    Local,
    Regional,
    State,
}

impl fmt::Display for JurisdictionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Regional => write!(f, "regional"),
            Self::State => write!(f, "state"),
        }
    }
}

/// A jurisdiction as stored in the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jurisdiction {
    id: JurisdictionId,
    name: String,
    level: JurisdictionLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<JurisdictionId>,
}

impl Jurisdiction {
    pub fn new(id: JurisdictionId, name: impl Into<String>, level: JurisdictionLevel) -> Self {
        Self {
            id,
            name: name.into(),
            level,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: JurisdictionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn id(&self) -> &JurisdictionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> JurisdictionLevel {
        self.level
    }

    pub fn parent_id(&self) -> Option<&JurisdictionId> {
        self.parent_id.as_ref()
    }
}

/// One link of a resolved inheritance chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InheritanceChainEntry {
    pub jurisdiction_id: JurisdictionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<JurisdictionId>,
    pub level: JurisdictionLevel,
    /// Position in the chain; 0 is the requesting jurisdiction
    pub rank: usize,
}

/// Ordered chain from the requesting jurisdiction up to its root
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InheritanceChain {
    entries: Vec<InheritanceChainEntry>,
}

impl InheritanceChain {
    /// Build from entries already ordered most-specific first
    pub(crate) fn from_entries(entries: Vec<InheritanceChainEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[InheritanceChainEntry] {
        &self.entries
    }

    /// The requesting jurisdiction
    pub fn requester(&self) -> Option<&InheritanceChainEntry> {
        self.entries.first()
    }

    /// All jurisdiction IDs visible to the requester, most specific first
    pub fn scope(&self) -> Vec<JurisdictionId> {
        self.entries
            .iter()
            .map(|e| e.jurisdiction_id.clone())
            .collect()
    }

    /// Entry for a jurisdiction, if it is part of this chain
    pub fn entry_for(&self, id: &JurisdictionId) -> Option<&InheritanceChainEntry> {
        self.entries.iter().find(|e| &e.jurisdiction_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
