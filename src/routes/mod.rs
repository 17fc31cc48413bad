//! HTTP API route definitions

mod health;
mod news;

use crate::service::NewsService;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub news_service: Arc<NewsService>,
}

/// Build the full application: routes, CORS, and request tracing.
pub fn app(state: AppState) -> Router {
    // Any origin, any method, any header; the endpoint is read-only.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::routes())
        .nest("/api", news::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
