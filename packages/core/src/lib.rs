//! Core of the Opsdash demo health dashboard: the in-memory state store with
//! its scripted scenario/remediation transitions, the derived narrative
//! lookups, the periodic update notifier and the demo AI-layer state.

pub mod insight;
pub mod narrative;
pub mod notifier;
pub mod state;
pub mod types;

pub use notifier::{SnapshotEvent, UpdateNotifier, DEFAULT_UPDATE_INTERVAL};
pub use state::StateStore;
pub use types::{
    Edge, HealthStatus, Incident, IncidentSeverity, IncidentStatus, Node, NodeCategory,
    NodeDetail, NodeMetrics, NodeStatus, RemediationAction, RemediationOutcome, Scenario,
    ScenarioStarted, StateError, StateResult, StateSnapshot, SuggestedAction, Topology,
};
