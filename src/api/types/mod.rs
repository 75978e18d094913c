//! API wire types
//!
//! Errors follow the OpenAI error body format.

pub mod error;
pub mod json;
pub mod search;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use search::{
    rate_limit_headers, ChainLevel, RateLimitInfo, SearchRequestBody, SearchResponseBody,
    SearchResult,
};
