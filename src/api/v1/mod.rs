//! Versioned public endpoints

pub mod search;

use axum::{routing::post, Router};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new().route("/search", post(search::search))
}
