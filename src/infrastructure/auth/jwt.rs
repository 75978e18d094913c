//! JWT session token verification

use std::fmt::Debug;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::rate_limit::{Tier, TokenVerifier, VerifiedCaller};
use crate::domain::DomainError;

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Subscription tier, free when absent
    #[serde(default)]
    pub tier: Option<String>,
    /// Issued at timestamp (Unix epoch)
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user_id: impl Into<String>, tier: Tier, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.into(),
            tier: Some(tier.as_str().to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn tier(&self) -> Result<Tier, DomainError> {
        match self.tier.as_deref() {
            Some(tier) => tier.parse(),
            None => Ok(Tier::Free),
        }
    }
}

/// Configuration for JWT verification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret shared with the session service; unset disables user identities
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
    /// Expected `iss` claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Clock skew tolerance in seconds
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

fn default_leeway_secs() -> u64 {
    30
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            issuer: None,
            leeway_secs: default_leeway_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(secret) = &self.secret {
            if secret.len() < 16 {
                return Err(DomainError::configuration(
                    "auth.secret must be at least 16 bytes",
                ));
            }
        }
        Ok(())
    }
}

/// HS256 verifier for session tokens
#[derive(Clone)]
pub struct JwtTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .field("issuer", &self.validation.iss)
            .finish()
    }
}

impl JwtTokenVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Build a verifier when a secret is configured
    pub fn from_config(config: &JwtConfig) -> Option<Self> {
        config
            .secret
            .as_deref()
            .map(|secret| Self::new(secret, config.issuer.as_deref(), config.leeway_secs))
    }

    /// Sign a token for local testing against this deployment
    pub fn issue(&self, user_id: &str, tier: Tier, ttl: Duration) -> Result<String, DomainError> {
        let claims = JwtClaims::new(user_id, tier, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::validation(format!("Failed to generate JWT: {}", e)))
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedCaller, DomainError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| DomainError::validation(format!("Invalid JWT: {}", e)))?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            return Err(DomainError::validation("JWT subject is empty"));
        }

        Ok(VerifiedCaller {
            tier: claims.tier()?,
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rate_limit::{Identity, IdentityResolver};
    use std::sync::Arc;

    const SECRET: &str = "test-secret-key-12345";

    fn verifier() -> JwtTokenVerifier {
        JwtTokenVerifier::new(SECRET, None, 0)
    }

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let verifier = verifier();
        let token = verifier.issue("user-1", Tier::Pro, Duration::hours(1)).unwrap();

        let caller = verifier.verify(&token).unwrap();
        assert_eq!(caller.user_id, "user-1");
        assert_eq!(caller.tier, Tier::Pro);
    }

    #[test]
    fn test_missing_tier_is_free() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign(&serde_json::json!({"sub": "user-2", "exp": exp}), SECRET);

        assert_eq!(verifier().verify(&token).unwrap().tier, Tier::Free);
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = sign(
            &serde_json::json!({"sub": "user-3", "tier": "platinum", "exp": exp}),
            SECRET,
        );

        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtTokenVerifier::new("another-secret-key-999", None, 0);
        let token = other.issue("user-1", Tier::Pro, Duration::hours(1)).unwrap();

        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let past = Utc::now() - Duration::hours(1);
        let token = sign(
            &serde_json::json!({"sub": "user-1", "tier": "pro", "exp": past.timestamp()}),
            SECRET,
        );

        assert!(verifier().verify(&token).is_err());
    }

    #[test]
    fn test_issuer_enforced() {
        let verifier = JwtTokenVerifier::new(SECRET, Some("sessions"), 0);
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let good = sign(
            &serde_json::json!({"sub": "u", "exp": exp, "iss": "sessions"}),
            SECRET,
        );
        let bad = sign(&serde_json::json!({"sub": "u", "exp": exp, "iss": "other"}), SECRET);

        assert!(verifier.verify(&good).is_ok());
        assert!(verifier.verify(&bad).is_err());
    }

    #[test]
    fn test_resolver_falls_back_on_expired_token() {
        let past = Utc::now() - Duration::hours(1);
        let token = sign(
            &serde_json::json!({"sub": "user-1", "tier": "pro", "exp": past.timestamp()}),
            SECRET,
        );
        let resolver = IdentityResolver::new(Arc::new(verifier()));

        let identity = resolver.resolve(Some(&token), "192.0.2.7");

        assert_eq!(identity, Identity::anonymous("192.0.2.7"));
    }

    #[test]
    fn test_config() {
        assert!(JwtTokenVerifier::from_config(&JwtConfig::default()).is_none());
        assert!(JwtTokenVerifier::from_config(&JwtConfig::new(SECRET)).is_some());
        assert!(JwtConfig::new("short").validate().is_err());
        assert!(JwtConfig::default().validate().is_ok());
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", verifier());
        assert!(!debug.contains(SECRET));
    }
}
