// ABOUTME: HTTP API layer for Opsdash providing REST endpoints and routing
// ABOUTME: Maps the state store, notifier and insight store onto /api routes

use axum::{
    routing::{get, post},
    Router,
};

use opsdash_core::insight::InsightStore;
use opsdash_core::{StateStore, UpdateNotifier};

pub mod handlers;
pub mod sse;

/// Shared application state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: StateStore,
    pub notifier: UpdateNotifier,
    pub insight: InsightStore,
}

impl AppState {
    pub fn new(store: StateStore, notifier: UpdateNotifier, insight: InsightStore) -> Self {
        Self {
            store,
            notifier,
            insight,
        }
    }
}

/// Creates the dashboard API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/topology", get(handlers::get_topology))
        .route("/api/status", get(handlers::get_status))
        .route("/api/node/{id}/drilldown", get(handlers::get_node_drilldown))
        .route("/api/scenario/start", post(handlers::start_scenario))
        .route("/api/scenario/stop", post(handlers::stop_scenario))
        .route("/api/remediation/apply", post(handlers::apply_remediation))
        .route("/api/incidents", get(handlers::get_incidents))
        .route("/api/events", get(sse::stream_events))
        .route("/api/ai-layers", get(handlers::get_ai_layers))
        .route("/api/ai-layers/{layer}", get(handlers::get_ai_layer))
        .route(
            "/api/blackbox/request-access",
            post(handlers::request_blackbox_access),
        )
        .route(
            "/api/llm/generate-summary",
            post(handlers::generate_llm_summary),
        )
        .with_state(state)
}
