//! HTTP surface for the catalog/search services, with observability.
//!
//! Mutations and the point read go through the catalog service; the
//! list endpoint queries the projected read model kept in sync by the
//! event consumer, so listings trail writes until the consumer catches
//! up.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use broker::InMemoryBroker;
use catalog::{CacheConfig, CatalogService, InMemoryProductCache, InMemoryProductRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use search::{EventConsumer, InMemoryReadStore, ReadStore, Reconciler, SearchConfig};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::products::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ReadStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::remove::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default in-memory application state plus the consumer
/// that keeps the read model in sync. The caller spawns the consumer
/// and uses the sender to request shutdown.
pub fn create_default_state() -> (
    Arc<AppState<InMemoryReadStore>>,
    EventConsumer<InMemoryBroker, InMemoryReadStore>,
    watch::Sender<bool>,
) {
    let broker = InMemoryBroker::new();
    let repository = InMemoryProductRepository::new();
    let cache = InMemoryProductCache::new(CacheConfig::from_env());
    let catalog = CatalogService::new(repository, cache, broker.clone());

    let read_store = InMemoryReadStore::new();
    let reconciler = Arc::new(Reconciler::new(read_store.clone(), &SearchConfig::from_env()));
    let (consumer, shutdown) = EventConsumer::new(broker, reconciler);

    let state = Arc::new(AppState {
        catalog,
        read_store,
    });

    (state, consumer, shutdown)
}
