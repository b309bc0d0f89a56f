//! Single authoritative in-memory store for topology, metrics, incidents and
//! the active scenario. Everything lives behind one coarse lock; each public
//! operation is a single critical section (this system has no throughput
//! requirement). State is ephemeral by design: a restart reseeds it.

use chrono::Utc;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::narrative;
use crate::types::{
    Edge, HealthStatus, Incident, IncidentSeverity, IncidentStatus, Node, NodeCategory,
    NodeDetail, NodeMetrics, NodeStatus, RemediationAction, RemediationOutcome, Scenario,
    ScenarioStarted, StateError, StateResult, StateSnapshot, Topology,
};

struct DashboardState {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    metrics: BTreeMap<String, NodeMetrics>,
    incidents: Vec<Incident>,
    active_scenario: Option<Scenario>,
    last_incident_ms: i64,
}

/// Shared handle to the dashboard state.
///
/// Clones are cheap and refer to the same underlying state; the HTTP layer
/// and the update notifier both hold one.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<RwLock<DashboardState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Seed the static topology and roll initial healthy metrics.
    pub fn new() -> Self {
        let nodes = seed_nodes();
        let metrics = nodes
            .keys()
            .map(|id| (id.clone(), healthy_metrics()))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(DashboardState {
                nodes,
                edges: seed_edges(),
                metrics,
                incidents: Vec::new(),
                active_scenario: None,
                last_incident_ms: 0,
            })),
        }
    }

    /// Current node set and static edges
    pub async fn topology(&self) -> Topology {
        let state = self.inner.read().await;
        Topology {
            nodes: state.nodes.values().cloned().collect(),
            edges: state.edges.clone(),
        }
    }

    /// Per-node health, metrics and derived one-line summary
    pub async fn status_summary(&self) -> BTreeMap<String, NodeStatus> {
        let state = self.inner.read().await;
        state
            .nodes
            .iter()
            .map(|(id, node)| {
                let status = NodeStatus {
                    health: node.status,
                    metrics: state.metrics[id],
                    summary: narrative::node_summary(id, node.status, state.active_scenario),
                };
                (id.clone(), status)
            })
            .collect()
    }

    /// Drilldown payload for one node; fails only for unknown node ids
    pub async fn node_detail(&self, node_id: &str) -> StateResult<NodeDetail> {
        let state = self.inner.read().await;
        let node = state.nodes.get(node_id).ok_or_else(|| StateError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;

        Ok(NodeDetail {
            node: node.clone(),
            metrics: state.metrics[node_id],
            logs: narrative::recent_logs(node_id, state.active_scenario),
            root_cause: narrative::root_cause(node_id, node.status, state.active_scenario),
            suggestions: narrative::suggestions(node_id, state.active_scenario),
        })
    }

    /// Activate a scripted scenario.
    ///
    /// Known scenarios overwrite a fixed set of node statuses and metric
    /// fields and append one new ACTIVE incident per call; repeated calls
    /// accumulate incidents deliberately. An unknown id only moves the
    /// selector.
    pub async fn start_scenario(&self, scenario: Scenario) -> ScenarioStarted {
        let mut state = self.inner.write().await;
        state.active_scenario = Some(scenario);

        match scenario {
            Scenario::QuerySurge => {
                state.set_node_status("dwh", HealthStatus::Critical);
                state.set_node_status("etl", HealthStatus::Degraded);
                if let Some(m) = state.metrics.get_mut("dwh") {
                    m.queue_depth = 150.0;
                    m.response_time = 8000.0;
                    m.cpu = 95.0;
                }
                state.push_incident(
                    "결산 시점 대량 조회 감지 - 지연 위험",
                    "dwh",
                    IncidentSeverity::High,
                );
            }
            Scenario::MasterMismatch => {
                state.set_node_status("dwh", HealthStatus::Critical);
                state.set_node_status("batch", HealthStatus::Critical);
                if let Some(m) = state.metrics.get_mut("dwh") {
                    m.response_time = 12000.0;
                }
                if let Some(m) = state.metrics.get_mut("batch") {
                    m.error_rate = 25.0;
                }
                state.push_incident(
                    "마스터 플랜트 코드 불일치로 인한 조인 폭발",
                    "dwh",
                    IncidentSeverity::Critical,
                );
            }
            Scenario::Unknown(id) => {
                // Selector moves, nothing else does.
                warn!(scenario = id, "unknown scenario id, no state mutation");
            }
        }

        info!(scenario = scenario.id(), "scenario started");
        ScenarioStarted {
            scenario: scenario.id(),
            message: format!("시나리오 {} 시작됨", scenario.id()),
        }
    }

    /// Reset every node to HEALTHY, re-roll metrics from the healthy
    /// distributions, drop all incidents and clear the selector. Idempotent.
    pub async fn stop_scenario(&self) -> String {
        let mut state = self.inner.write().await;
        for node in state.nodes.values_mut() {
            node.status = HealthStatus::Healthy;
        }
        for metrics in state.metrics.values_mut() {
            *metrics = healthy_metrics();
        }
        state.incidents.clear();
        state.active_scenario = None;

        info!("all scenarios stopped, state reset");
        "모든 시나리오 정지됨".to_string()
    }

    /// Apply a scripted remediation.
    ///
    /// Known actions undo the paired scenario's node/metric overwrites. Every
    /// call, including one with an unrecognized actionId, resolves all ACTIVE
    /// incidents system-wide; that mirrors the demo script this reproduces.
    pub async fn apply_remediation(
        &self,
        action_id: &str,
        node_id: Option<&str>,
    ) -> RemediationOutcome {
        let mut state = self.inner.write().await;

        let outcome = match RemediationAction::parse(action_id) {
            Some(RemediationAction::EnableQueryGovernor) => {
                state.set_node_status("dwh", HealthStatus::Healthy);
                state.set_node_status("etl", HealthStatus::Healthy);
                if let Some(m) = state.metrics.get_mut("dwh") {
                    m.queue_depth = 5.0;
                    m.response_time = 200.0;
                    m.cpu = 25.0;
                }
                RemediationOutcome {
                    success: true,
                    message: "쿼리 거버너 활성화 완료".to_string(),
                }
            }
            Some(RemediationAction::SyncMasterData) => {
                state.set_node_status("dwh", HealthStatus::Healthy);
                state.set_node_status("batch", HealthStatus::Healthy);
                if let Some(m) = state.metrics.get_mut("dwh") {
                    m.response_time = 180.0;
                }
                if let Some(m) = state.metrics.get_mut("batch") {
                    m.error_rate = 0.5;
                }
                RemediationOutcome {
                    success: true,
                    message: "마스터 데이터 동기화 완료".to_string(),
                }
            }
            None => {
                warn!(action_id, "unknown remediation action");
                RemediationOutcome {
                    success: false,
                    message: String::new(),
                }
            }
        };

        let now = Utc::now();
        for incident in state.incidents.iter_mut() {
            incident.resolve(now);
        }

        info!(
            action_id,
            node_id = node_id.unwrap_or("-"),
            success = outcome.success,
            "remediation applied"
        );
        outcome
    }

    /// Incidents still in ACTIVE state
    pub async fn active_incidents(&self) -> Vec<Incident> {
        let state = self.inner.read().await;
        state
            .incidents
            .iter()
            .filter(|i| i.is_active())
            .cloned()
            .collect()
    }

    /// The currently selected scenario, if any
    pub async fn active_scenario(&self) -> Option<Scenario> {
        self.inner.read().await.active_scenario
    }

    /// Full snapshot for update subscribers; never fails
    pub async fn snapshot(&self) -> StateSnapshot {
        let state = self.inner.read().await;
        StateSnapshot {
            status: state.nodes.clone(),
            metrics: state.metrics.clone(),
            incidents: state
                .incidents
                .iter()
                .filter(|i| i.is_active())
                .cloned()
                .collect(),
        }
    }
}

impl DashboardState {
    fn set_node_status(&mut self, node_id: &str, status: HealthStatus) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.status = status;
        }
    }

    fn push_incident(&mut self, title: &str, node_id: &str, severity: IncidentSeverity) {
        let id = self.next_incident_id();
        self.incidents.push(Incident {
            id,
            title: title.to_string(),
            node_id: node_id.to_string(),
            severity,
            created_at: Utc::now(),
            status: IncidentStatus::Active,
            resolved_at: None,
        });
    }

    /// Timestamp-derived id, nudged forward when two incidents land on the
    /// same millisecond so ids stay unique within a process.
    fn next_incident_id(&mut self) -> String {
        let now_ms = Utc::now().timestamp_millis();
        let id_ms = now_ms.max(self.last_incident_ms + 1);
        self.last_incident_ms = id_ms;
        id_ms.to_string()
    }
}

fn seed_nodes() -> BTreeMap<String, Node> {
    let specs = [
        ("dashboard", "대시보드", NodeCategory::Web, 100.0, 100.0),
        ("api", "API 서버", NodeCategory::Api, 300.0, 100.0),
        ("etl", "ETL 처리", NodeCategory::Etl, 500.0, 100.0),
        ("dwh", "DWH/HANA", NodeCategory::Database, 700.0, 100.0),
        ("batch", "배치 처리", NodeCategory::Batch, 300.0, 300.0),
        ("cache", "캐시", NodeCategory::Cache, 500.0, 300.0),
        ("storage", "스토리지", NodeCategory::Storage, 700.0, 300.0),
    ];

    specs
        .into_iter()
        .map(|(id, name, category, x, y)| {
            (
                id.to_string(),
                Node {
                    id: id.to_string(),
                    name: name.to_string(),
                    category,
                    status: HealthStatus::Healthy,
                    x,
                    y,
                },
            )
        })
        .collect()
}

fn seed_edges() -> Vec<Edge> {
    [
        ("dashboard", "api"),
        ("api", "etl"),
        ("etl", "dwh"),
        ("api", "cache"),
        ("batch", "dwh"),
        ("cache", "storage"),
    ]
    .into_iter()
    .map(|(from, to)| Edge {
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect()
}

/// Healthy baseline metrics, drawn uniformly from fixed per-field ranges.
/// Used at startup and again when a scenario is stopped.
fn healthy_metrics() -> NodeMetrics {
    let mut rng = rand::thread_rng();
    NodeMetrics {
        cpu: rng.gen_range(10.0..40.0),
        memory: rng.gen_range(20.0..60.0),
        response_time: rng.gen_range(50.0..150.0),
        queue_depth: rng.gen_range(0.0..10.0),
        error_rate: rng.gen_range(0.0..2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL_NODES: [&str; 7] = ["api", "batch", "cache", "dashboard", "dwh", "etl", "storage"];

    #[tokio::test]
    async fn topology_is_seeded_with_static_nodes_and_edges() {
        let store = StateStore::new();
        let topology = store.topology().await;

        assert_eq!(topology.nodes.len(), 7);
        assert_eq!(topology.edges.len(), 6);
        for edge in &topology.edges {
            assert!(topology.nodes.iter().any(|n| n.id == edge.from));
            assert!(topology.nodes.iter().any(|n| n.id == edge.to));
        }
        for node in &topology.nodes {
            assert_eq!(node.status, HealthStatus::Healthy);
        }
    }

    #[tokio::test]
    async fn initial_metrics_fall_inside_healthy_ranges() {
        let store = StateStore::new();
        let summary = store.status_summary().await;

        for node_id in ALL_NODES {
            let m = summary[node_id].metrics;
            assert!((10.0..40.0).contains(&m.cpu));
            assert!((20.0..60.0).contains(&m.memory));
            assert!((50.0..150.0).contains(&m.response_time));
            assert!((0.0..10.0).contains(&m.queue_depth));
            assert!((0.0..2.0).contains(&m.error_rate));
        }
    }

    #[tokio::test]
    async fn node_detail_succeeds_for_every_known_node() {
        let store = StateStore::new();
        for node_id in ALL_NODES {
            let detail = store.node_detail(node_id).await.unwrap();
            assert_eq!(detail.node.id, node_id);
            assert!(!detail.root_cause.is_empty());
            assert!(!detail.logs.is_empty());
        }
    }

    #[tokio::test]
    async fn node_detail_fails_with_not_found_for_unknown_node() {
        let store = StateStore::new();
        let err = store.node_detail("mainframe").await.unwrap_err();
        assert!(matches!(err, StateError::NodeNotFound { node_id } if node_id == "mainframe"));
    }

    #[tokio::test]
    async fn query_surge_scenario_degrades_warehouse_and_etl() {
        let store = StateStore::new();
        let started = store.start_scenario(Scenario::from_id(1)).await;
        assert_eq!(started.scenario, 1);
        assert_eq!(started.message, "시나리오 1 시작됨");

        let summary = store.status_summary().await;
        assert_eq!(summary["dwh"].health, HealthStatus::Critical);
        assert_eq!(summary["etl"].health, HealthStatus::Degraded);
        assert_eq!(summary["dwh"].metrics.queue_depth, 150.0);
        assert_eq!(summary["dwh"].metrics.response_time, 8000.0);
        assert_eq!(summary["dwh"].metrics.cpu, 95.0);
        assert_eq!(summary["dwh"].summary, "대량 조회로 인한 성능 저하");

        let incidents = store.active_incidents().await;
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].node_id, "dwh");
        assert_eq!(incidents[0].severity, IncidentSeverity::High);
        assert_eq!(incidents[0].status, IncidentStatus::Active);
    }

    #[tokio::test]
    async fn master_mismatch_scenario_fails_warehouse_and_batch() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(2)).await;

        let summary = store.status_summary().await;
        assert_eq!(summary["dwh"].health, HealthStatus::Critical);
        assert_eq!(summary["batch"].health, HealthStatus::Critical);
        assert_eq!(summary["dwh"].metrics.response_time, 12000.0);
        assert_eq!(summary["batch"].metrics.error_rate, 25.0);

        let incidents = store.active_incidents().await;
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].severity, IncidentSeverity::Critical);
    }

    #[tokio::test]
    async fn repeated_scenario_starts_accumulate_incidents() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(1)).await;
        store.start_scenario(Scenario::from_id(1)).await;
        store.start_scenario(Scenario::from_id(1)).await;

        let incidents = store.active_incidents().await;
        assert_eq!(incidents.len(), 3);

        // Ids stay unique even when calls land on the same millisecond.
        let mut ids: Vec<_> = incidents.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn unknown_scenario_moves_selector_without_mutation() {
        let store = StateStore::new();
        let started = store.start_scenario(Scenario::from_id(9)).await;
        assert_eq!(started.scenario, 9);

        assert_eq!(store.active_scenario().await, Some(Scenario::Unknown(9)));
        assert!(store.active_incidents().await.is_empty());
        let summary = store.status_summary().await;
        for node_id in ALL_NODES {
            assert_eq!(summary[node_id].health, HealthStatus::Healthy);
        }
    }

    #[tokio::test]
    async fn stop_scenario_resets_everything_and_is_idempotent() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(2)).await;

        let message = store.stop_scenario().await;
        assert_eq!(message, "모든 시나리오 정지됨");
        assert!(store.active_incidents().await.is_empty());
        assert_eq!(store.active_scenario().await, None);

        let summary = store.status_summary().await;
        for node_id in ALL_NODES {
            assert_eq!(summary[node_id].health, HealthStatus::Healthy);
            let m = summary[node_id].metrics;
            assert!((10.0..40.0).contains(&m.cpu));
            assert!((50.0..150.0).contains(&m.response_time));
        }

        // Second stop is a no-op that ends in the same state.
        store.stop_scenario().await;
        assert!(store.active_incidents().await.is_empty());
        assert_eq!(store.active_scenario().await, None);
    }

    #[tokio::test]
    async fn query_governor_remediation_reverts_scenario_one() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(1)).await;

        let outcome = store
            .apply_remediation("ENABLE_QUERY_GOVERNOR", Some("dwh"))
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "쿼리 거버너 활성화 완료");

        let summary = store.status_summary().await;
        assert_eq!(summary["dwh"].health, HealthStatus::Healthy);
        assert_eq!(summary["etl"].health, HealthStatus::Healthy);
        assert_eq!(summary["dwh"].metrics.queue_depth, 5.0);
        assert_eq!(summary["dwh"].metrics.response_time, 200.0);
        assert_eq!(summary["dwh"].metrics.cpu, 25.0);

        assert!(store.active_incidents().await.is_empty());
    }

    #[tokio::test]
    async fn master_sync_remediation_reverts_scenario_two() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(2)).await;

        let outcome = store.apply_remediation("SYNC_MASTER_DATA", None).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "마스터 데이터 동기화 완료");

        let summary = store.status_summary().await;
        assert_eq!(summary["dwh"].health, HealthStatus::Healthy);
        assert_eq!(summary["batch"].health, HealthStatus::Healthy);
        assert_eq!(summary["dwh"].metrics.response_time, 180.0);
        assert_eq!(summary["batch"].metrics.error_rate, 0.5);
    }

    #[tokio::test]
    async fn unknown_remediation_still_resolves_all_active_incidents() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(1)).await;
        store.start_scenario(Scenario::from_id(2)).await;
        assert_eq!(store.active_incidents().await.len(), 2);

        let outcome = store.apply_remediation("REBOOT_EVERYTHING", None).await;
        assert!(!outcome.success);
        assert!(store.active_incidents().await.is_empty());

        // Node health was not touched by the unknown action.
        let summary = store.status_summary().await;
        assert_eq!(summary["dwh"].health, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn resolved_incidents_carry_a_resolution_timestamp() {
        let store = StateStore::new();
        store.start_scenario(Scenario::from_id(1)).await;
        store.apply_remediation("ENABLE_QUERY_GOVERNOR", None).await;

        let snapshot = store.snapshot().await;
        assert!(snapshot.incidents.is_empty());

        // The store keeps resolved incidents internally until the next stop;
        // look at them through a second remediation pass.
        let state = store.inner.read().await;
        assert_eq!(state.incidents.len(), 1);
        assert_eq!(state.incidents[0].status, IncidentStatus::Resolved);
        assert!(state.incidents[0].resolved_at.is_some());
    }

    #[tokio::test]
    async fn snapshot_reflects_the_live_state() {
        let store = StateStore::new();
        let before = store.snapshot().await;
        assert_eq!(before.status.len(), 7);
        assert!(before.incidents.is_empty());

        store.start_scenario(Scenario::from_id(1)).await;
        let after = store.snapshot().await;
        assert_eq!(after.status["dwh"].status, HealthStatus::Critical);
        assert_eq!(after.incidents.len(), 1);
    }
}
