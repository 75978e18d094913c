//! Jurisdiction hierarchy domain
//!
//! Jurisdictions form a parent-linked hierarchy (local -> regional -> state).
//! When a requester's own jurisdiction has no content for a query, content is
//! inherited from the nearest ancestor that does.

mod entity;
mod repository;
mod resolver;

pub use entity::{
    InheritanceChain, InheritanceChainEntry, Jurisdiction, JurisdictionId, JurisdictionLevel,
};
pub use repository::JurisdictionRepository;
pub use resolver::{InheritanceResolver, LevelCoverage, Selection};

#[cfg(test)]
pub use repository::MockJurisdictionRepository;
