//! Jurisdiction repository trait

use async_trait::async_trait;

use super::{Jurisdiction, JurisdictionId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Read access to the stored jurisdiction hierarchy
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JurisdictionRepository: Send + Sync {
    /// Finds a jurisdiction by ID
    async fn get(&self, id: &JurisdictionId) -> Result<Option<Jurisdiction>, DomainError>;

    /// Lists all jurisdictions
    async fn list(&self) -> Result<Vec<Jurisdiction>, DomainError>;
}
