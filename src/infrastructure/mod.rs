//! Infrastructure layer - External service implementations

pub mod auth;
pub mod cache;
pub mod embedding;
pub mod jurisdiction;
pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod search;
pub mod services;
