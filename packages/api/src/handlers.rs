// ABOUTME: REST handlers for topology, status, scenarios, remediation and
// ABOUTME: the demo AI-layer endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

use opsdash_core::insight::{self, LlmSummary};
use opsdash_core::types::{
    Incident, NodeDetail, NodeStatus, RemediationOutcome, Scenario, StateError, Topology,
};

use crate::AppState;

/// Service liveness blob
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "opsdash-api"
    }))
}

/// Current node set and static edges
pub async fn get_topology(State(state): State<AppState>) -> Json<Topology> {
    Json(state.store.topology().await)
}

/// Per-node health, metrics and derived summary
pub async fn get_status(State(state): State<AppState>) -> Json<BTreeMap<String, NodeStatus>> {
    Json(state.store.status_summary().await)
}

/// Node drilldown; 404 for ids outside the static topology
pub async fn get_node_drilldown(
    Path(node_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<NodeDetail>, (StatusCode, Json<Value>)> {
    match state.store.node_detail(&node_id).await {
        Ok(detail) => Ok(Json(detail)),
        Err(StateError::NodeNotFound { node_id }) => {
            warn!(node_id, "drilldown requested for unknown node");
            Err((
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Node not found" })),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScenarioQuery {
    s: Option<String>,
}

/// Start a scripted scenario; defaults to scenario 1 when the query
/// parameter is missing or unparsable
pub async fn start_scenario(
    Query(query): Query<ScenarioQuery>,
    State(state): State<AppState>,
) -> Json<Value> {
    let scenario_id = query
        .s
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(1);

    info!(scenario = scenario_id, "scenario start requested");
    let started = state.store.start_scenario(Scenario::from_id(scenario_id)).await;

    Json(json!({
        "success": true,
        "scenario": started.scenario,
        "message": started.message
    }))
}

/// Stop the active scenario and reset all state
pub async fn stop_scenario(State(state): State<AppState>) -> Json<Value> {
    let message = state.store.stop_scenario().await;
    Json(json!({ "success": true, "message": message }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationRequest {
    pub action_id: String,
    pub node_id: Option<String>,
}

/// Apply a scripted remediation action
pub async fn apply_remediation(
    State(state): State<AppState>,
    Json(request): Json<RemediationRequest>,
) -> Json<RemediationOutcome> {
    let outcome = state
        .store
        .apply_remediation(&request.action_id, request.node_id.as_deref())
        .await;
    Json(outcome)
}

/// Incidents still in ACTIVE state
pub async fn get_incidents(State(state): State<AppState>) -> Json<Vec<Incident>> {
    Json(state.store.active_incidents().await)
}

/// All four demo AI layers
pub async fn get_ai_layers(State(state): State<AppState>) -> Json<insight::AiLayers> {
    Json(state.insight.layers().await)
}

/// A single AI layer by wire key; 404 for anything unknown
pub async fn get_ai_layer(
    Path(layer): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.insight.layer(&layer).await {
        Some(data) => Ok(Json(data)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Layer not found" })),
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequestBody {
    pub reason: String,
    pub requested_data: String,
}

/// File a blackbox access request; approval lands on a background timer
pub async fn request_blackbox_access(
    State(state): State<AppState>,
    Json(body): Json<AccessRequestBody>,
) -> Json<Value> {
    let receipt = state
        .insight
        .request_access(&body.reason, &body.requested_data)
        .await;

    Json(json!({
        "success": true,
        "requestId": receipt.request_id,
        "message": receipt.message
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub node_id: String,
    pub issue_type: String,
}

/// Canned LLM summary lookup
pub async fn generate_llm_summary(Json(request): Json<SummaryRequest>) -> Json<LlmSummary> {
    Json(insight::generate_summary(&request.node_id, &request.issue_type))
}
