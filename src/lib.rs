//! # Order Console Library
//!
//! Exposes the Axum router and modules so integration tests can create an
//! in-process console against a mock order service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::catalog::ProductCatalog;
use crate::handlers::lifecycle::OrderLifecycleManager;
use crate::service::ApiClient;

/// Everything the routes need, wired to one order service client.
#[derive(Clone)]
pub struct ConsoleState {
    pub client: ApiClient,
    pub lifecycle: OrderLifecycleManager,
    pub catalog: ProductCatalog,
}

impl ConsoleState {
    pub fn new(client: ApiClient) -> Self {
        let shared = Arc::new(client.clone());
        Self {
            lifecycle: OrderLifecycleManager::new(shared.clone()),
            catalog: ProductCatalog::new(shared),
            client,
        }
    }
}

/// Build the Axum router with all route modules and middleware.
///
/// This function does NOT bind a listener.
pub fn create_app(state: ConsoleState) -> Router {
    let sessions = state.client.sessions().clone();
    Router::new()
        .merge(routes::auth::router())
        .merge(routes::orders::router())
        .merge(routes::products::router())
        .layer(Extension(state.client))
        .layer(Extension(state.lifecycle))
        .layer(Extension(state.catalog))
        .layer(Extension(sessions))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
