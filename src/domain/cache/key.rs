//! Content-addressed cache keys

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 of the prepared (normalized, truncated) query text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddingCacheKey(String);

impl EmbeddingCacheKey {
    /// Hash already-prepared text
    pub fn for_text(prepared_text: &str) -> Self {
        let digest = Sha256::digest(prepared_text.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmbeddingCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough to correlate log lines
        write!(f, "{}", &self.0[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable() {
        let a = EmbeddingCacheKey::for_text("epinephrine dose");
        let b = EmbeddingCacheKey::for_text("epinephrine dose");

        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_distinct_texts_distinct_keys() {
        let a = EmbeddingCacheKey::for_text("epinephrine dose");
        let b = EmbeddingCacheKey::for_text("epinephrine dosE");

        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_prefix() {
        let key = EmbeddingCacheKey::for_text("x");

        assert_eq!(key.to_string().len(), 12);
        assert!(key.as_str().starts_with(&key.to_string()));
    }
}
