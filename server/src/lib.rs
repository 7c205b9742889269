//! Fleet Server - HTTP API for the vehicle allocation tracker.
//!
//! Exposes employee, vehicle and allocation endpoints over the rules in
//! `fleet-engine`. Documents live in PostgreSQL when `DATABASE_URL` is set
//! and in process memory otherwise.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;

use crate::config::Config;
use axum::Router;
use fleet_engine::{AllocationEngine, Clock, DocumentStore, EntityRegistry};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: EntityRegistry,
    pub allocations: Arc<AllocationEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the registry and allocation engine onto one store handle.
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, config: Config) -> Self {
        let registry = EntityRegistry::new(store.clone());
        let allocations = Arc::new(AllocationEngine::new(store, clock, config.engine_config()));

        Self {
            registry,
            allocations,
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}
