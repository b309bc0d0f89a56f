use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health status of a topology node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Critical => "CRITICAL",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Functional category of a topology node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Web,
    Api,
    Etl,
    Database,
    Batch,
    Cache,
    Storage,
}

impl NodeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeCategory::Web => "web",
            NodeCategory::Api => "api",
            NodeCategory::Etl => "etl",
            NodeCategory::Database => "database",
            NodeCategory::Batch => "batch",
            NodeCategory::Cache => "cache",
            NodeCategory::Storage => "storage",
        }
    }
}

/// A node in the static system topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: NodeCategory,
    pub status: HealthStatus,
    pub x: f64,
    pub y: f64,
}

/// Directed edge between two topology nodes; static after startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Latest synthetic metrics for one node; overwritten in place, no history
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub cpu: f64,
    pub memory: f64,
    pub response_time: f64,
    pub queue_depth: f64,
    pub error_rate: f64,
}

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentSeverity {
    High,
    Critical,
}

/// Incident lifecycle; the transition is one-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Active,
    Resolved,
}

/// A detected (scripted) problem on one node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub node_id: String,
    pub severity: IncidentSeverity,
    pub created_at: DateTime<Utc>,
    pub status: IncidentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Incident {
    pub fn is_active(&self) -> bool {
        self.status == IncidentStatus::Active
    }

    /// One-way ACTIVE -> RESOLVED transition; resolving twice keeps the
    /// original resolution timestamp.
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        if self.status == IncidentStatus::Active {
            self.status = IncidentStatus::Resolved;
            self.resolved_at = Some(at);
        }
    }
}

/// Scripted incident scenario selector.
///
/// Unrecognized identifiers are kept as `Unknown` so the selector can still
/// report what was requested even though no mutation is performed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// S1: mass concurrent queries against the warehouse at closing time
    QuerySurge,
    /// S2: master plant-code mismatch causing a join explosion
    MasterMismatch,
    Unknown(i64),
}

impl Scenario {
    pub fn from_id(id: i64) -> Self {
        match id {
            1 => Scenario::QuerySurge,
            2 => Scenario::MasterMismatch,
            other => Scenario::Unknown(other),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Scenario::QuerySurge => 1,
            Scenario::MasterMismatch => 2,
            Scenario::Unknown(id) => *id,
        }
    }
}

/// Known remediation action identifiers; parsing is the explicit dispatch
/// point, unknown ids stay `None` and are handled at the call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationAction {
    EnableQueryGovernor,
    SyncMasterData,
}

impl RemediationAction {
    pub fn parse(action_id: &str) -> Option<Self> {
        match action_id {
            "ENABLE_QUERY_GOVERNOR" => Some(RemediationAction::EnableQueryGovernor),
            "SYNC_MASTER_DATA" => Some(RemediationAction::SyncMasterData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationAction::EnableQueryGovernor => "ENABLE_QUERY_GOVERNOR",
            RemediationAction::SyncMasterData => "SYNC_MASTER_DATA",
        }
    }
}

/// A remediation suggestion shown in the node drilldown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// Current topology view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Per-node entry in the status summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub health: HealthStatus,
    pub metrics: NodeMetrics,
    pub summary: String,
}

/// Node drilldown payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub node: Node,
    pub metrics: NodeMetrics,
    pub logs: Vec<String>,
    pub root_cause: String,
    pub suggestions: Vec<SuggestedAction>,
}

/// Outcome of starting a scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioStarted {
    pub scenario: i64,
    pub message: String,
}

/// Outcome of a remediation attempt
#[derive(Debug, Clone, Serialize)]
pub struct RemediationOutcome {
    pub success: bool,
    pub message: String,
}

/// Full state snapshot pushed to update subscribers.
///
/// Field names mirror the wire payload: the node map doubles as the health
/// map, `incidents` carries only ACTIVE entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub status: BTreeMap<String, Node>,
    pub metrics: BTreeMap<String, NodeMetrics>,
    pub incidents: Vec<Incident>,
}

/// Error types for state store operations
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: String },
}

/// Result type for state store operations
pub type StateResult<T> = Result<T, StateError>;
