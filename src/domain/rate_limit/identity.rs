//! Caller identity resolution

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::Tier;
use crate::domain::DomainError;

/// Caller identity whose token has been verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCaller {
    pub user_id: String,
    pub tier: Tier,
}

/// Who a request is counted against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    User { user_id: String, tier: Tier },
    Anonymous { address: String },
}

impl Identity {
    pub fn anonymous(address: impl Into<String>) -> Self {
        Self::Anonymous {
            address: address.into(),
        }
    }

    pub fn user(user_id: impl Into<String>, tier: Tier) -> Self {
        Self::User {
            user_id: user_id.into(),
            tier,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Self::User { tier, .. } => *tier,
            Self::Anonymous { .. } => Tier::Anonymous,
        }
    }

    /// Counter key fragment, unique per identity
    pub fn key(&self) -> String {
        match self {
            Self::User { user_id, .. } => format!("user:{}", user_id),
            Self::Anonymous { address } => format!("anon:{}", address),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Verifies bearer tokens issued by the session service
pub trait TokenVerifier: Send + Sync + Debug {
    fn verify(&self, token: &str) -> Result<VerifiedCaller, DomainError>;
}

/// Maps request credentials onto an [`Identity`]
///
/// A valid token yields its user and tier. A missing, malformed, expired or
/// otherwise rejected token falls back to the anonymous identity of the
/// source address and never produces an error.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl IdentityResolver {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier: Some(verifier),
        }
    }

    /// Resolver that treats every caller as anonymous
    pub fn anonymous_only() -> Self {
        Self { verifier: None }
    }

    pub fn resolve(&self, bearer_token: Option<&str>, address: &str) -> Identity {
        let token = bearer_token.map(str::trim).filter(|t| !t.is_empty());

        match (token, &self.verifier) {
            (Some(token), Some(verifier)) => match verifier.verify(token) {
                Ok(caller) => Identity::user(caller.user_id, caller.tier),
                Err(e) => {
                    debug!(error = %e, "Token rejected, treating caller as anonymous");
                    Identity::anonymous(address)
                }
            },
            _ => Identity::anonymous(address),
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Accepts tokens of the form `<user_id>:<tier>`
    #[derive(Debug, Default)]
    pub struct StaticTokenVerifier;

    impl TokenVerifier for StaticTokenVerifier {
        fn verify(&self, token: &str) -> Result<VerifiedCaller, DomainError> {
            let (user_id, tier) = token
                .split_once(':')
                .ok_or_else(|| DomainError::validation("Malformed token"))?;

            Ok(VerifiedCaller {
                user_id: user_id.to_string(),
                tier: tier.parse()?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::StaticTokenVerifier;
    use super::*;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(StaticTokenVerifier))
    }

    #[test]
    fn test_valid_token_resolves_user() {
        let identity = resolver().resolve(Some("u-42:pro"), "10.0.0.1");

        assert_eq!(identity, Identity::user("u-42", Tier::Pro));
        assert_eq!(identity.tier(), Tier::Pro);
        assert_eq!(identity.key(), "user:u-42");
    }

    #[test]
    fn test_invalid_token_is_anonymous() {
        let identity = resolver().resolve(Some("garbage"), "10.0.0.1");

        assert_eq!(identity, Identity::anonymous("10.0.0.1"));
        assert_eq!(identity.tier(), Tier::Anonymous);
    }

    #[test]
    fn test_missing_token_is_anonymous() {
        let identity = resolver().resolve(None, "10.0.0.2");

        assert_eq!(identity.key(), "anon:10.0.0.2");
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        let identity = resolver().resolve(Some("   "), "10.0.0.3");

        assert_eq!(identity, Identity::anonymous("10.0.0.3"));
    }

    #[test]
    fn test_anonymous_only_ignores_tokens() {
        let identity = IdentityResolver::anonymous_only().resolve(Some("u-1:pro"), "::1");

        assert_eq!(identity.tier(), Tier::Anonymous);
    }
}
