//! Basket Server - reference implementation of the remote cart service.
//!
//! Serves the authenticated cart API consumed by `basket-client`. Lines are
//! priced from the product catalog and merged by `(product, color, storage)`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::CartRepository;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn CartRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<dyn CartRepository>, config: Config) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
