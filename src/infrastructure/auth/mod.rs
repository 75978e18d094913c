//! Authentication infrastructure module
//!
//! Verifies the session service's JWTs to identify callers and their tier.

mod jwt;

pub use jwt::{JwtClaims, JwtConfig, JwtTokenVerifier};
