//! Operator surface, bound to the admin listener only.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::info;

use crate::{application::repos::HealthRepo, cache::PageCacheState};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct AdminState {
    pub cache: Option<PageCacheState>,
    pub health: Arc<dyn HealthRepo>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/cache/clear", post(clear_cache))
        .route("/_health/db", get(admin_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn clear_cache(State(state): State<AdminState>) -> Response {
    let dropped = state
        .cache
        .as_ref()
        .map(PageCacheState::invalidate_all)
        .unwrap_or(0);
    info!(target = "scribe::http::admin", dropped, "page cache cleared");
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.health.health_check().await)
}
