use std::fmt;

use thiserror::Error;

/// Classification of a failed call to an external backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credentials were rejected (401/403)
    Unauthorized,
    /// The backend throttled the request (429)
    RateLimited,
    /// The backend rejected the input or returned an unusable payload
    MalformedInput,
    /// The backend failed internally (5xx)
    ServerError,
    /// The call did not complete within its time budget
    Timeout,
    /// Connection-level failure before a response was received
    Transport,
}

impl ProviderErrorKind {
    /// Map an HTTP status code onto the error taxonomy
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            429 => Self::RateLimited,
            400 | 404 | 413 | 422 => Self::MalformedInput,
            500..=599 => Self::ServerError,
            _ => Self::Transport,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::MalformedInput => write!(f, "malformed_input"),
            Self::ServerError => write!(f, "server_error"),
            Self::Timeout => write!(f, "timeout"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// Reason a jurisdiction hierarchy could not be walked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyFault {
    /// A parent link points at a jurisdiction that does not exist
    DanglingParent { parent_id: String },
    /// A parent link leads back to a jurisdiction already in the chain
    Cycle { revisited: String },
}

impl fmt::Display for HierarchyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingParent { parent_id } => {
                write!(f, "parent '{}' does not exist", parent_id)
            }
            Self::Cycle { revisited } => write!(f, "cycle detected at '{}'", revisited),
        }
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Provider error: {provider} ({kind}) - {message}")]
    Provider {
        provider: String,
        kind: ProviderErrorKind,
        message: String,
    },

    #[error("Invalid hierarchy for '{jurisdiction}': {fault}")]
    InvalidHierarchy {
        jurisdiction: String,
        fault: HierarchyFault,
    },

    #[error("Vector index error: {message}")]
    VectorIndex { message: String },

    #[error("Rate limit backend error: {message}")]
    RateLimitBackend { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn provider(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn provider_timeout(provider: impl Into<String>, budget_ms: u64) -> Self {
        Self::provider(
            provider,
            ProviderErrorKind::Timeout,
            format!("Request timed out after {}ms", budget_ms),
        )
    }

    pub fn invalid_hierarchy(jurisdiction: impl Into<String>, fault: HierarchyFault) -> Self {
        Self::InvalidHierarchy {
            jurisdiction: jurisdiction.into(),
            fault,
        }
    }

    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex {
            message: message.into(),
        }
    }

    pub fn rate_limit_backend(message: impl Into<String>) -> Self {
        Self::RateLimitBackend {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Provider error kind, if this is a provider failure
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether this error represents an exceeded time budget
    pub fn is_timeout(&self) -> bool {
        self.provider_kind() == Some(ProviderErrorKind::Timeout)
    }
}
