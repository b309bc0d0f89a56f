//! Demo AI-layer state: data-collection, analysis, insight and governance
//! blobs, the scripted blackbox access-request flow and the canned LLM
//! summary lookup. All figures are fixed literals; nothing here measures,
//! trains or calls anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Delay before a blackbox access request is auto-approved
pub const APPROVAL_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackboxModule {
    pub status: String,
    pub logs_per_sec: u32,
    pub last_collection: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub name: String,
    pub threshold: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCollectionLayer {
    pub blackbox_modules: BTreeMap<String, BlackboxModule>,
    pub total_logs_collected: u64,
    pub kpi_definitions: Vec<KpiDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetection {
    pub model: String,
    pub accuracy: f64,
    pub last_trained: String,
    pub anomalies_detected: u32,
    pub false_positive_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementLearning {
    pub model: String,
    pub patterns: Vec<String>,
    pub learning_progress: f64,
    pub recommendations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeAnalysis {
    pub processed_events: u64,
    pub correlation_patterns: u32,
    pub prediction_accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysisLayer {
    pub anomaly_detection: AnomalyDetection,
    pub reinforcement_learning: ReinforcementLearning,
    pub real_time_analysis: RealTimeAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmEngine {
    pub model: String,
    pub status: String,
    pub summaries_generated: u32,
    pub avg_response_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoReports {
    pub generated: u32,
    pub scheduled: u32,
    pub custom_dashboards: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightServiceLayer {
    pub llm_engine: LlmEngine,
    pub auto_reports: AutoReports,
    pub natural_language_insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackboxAccessStats {
    pub total_requests: u32,
    pub approved: u32,
    pub pending: u32,
    pub denied: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceLayer {
    pub compliance_status: String,
    pub blackbox_access: BlackboxAccessStats,
    pub audit_trail: Vec<AuditEntry>,
    pub security_level: String,
}

/// The four demo AI layers served under /api/ai-layers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiLayers {
    pub data_collection: DataCollectionLayer,
    pub ai_analysis: AiAnalysisLayer,
    pub insight_service: InsightServiceLayer,
    pub governance: GovernanceLayer,
}

/// Lifecycle of a blackbox access request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub reason: String,
    pub requested_data: String,
    pub status: AccessStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessReceipt {
    pub request_id: String,
    pub message: String,
}

struct InsightState {
    layers: AiLayers,
    access_requests: HashMap<String, AccessRequest>,
    last_request_ms: i64,
}

/// Shared handle to the AI-layer demo state.
///
/// Access requests are auto-approved after [`APPROVAL_DELAY`] on a background
/// task, the same timer facility the update notifier runs on.
#[derive(Clone)]
pub struct InsightStore {
    inner: Arc<RwLock<InsightState>>,
    approval_delay: Duration,
}

impl Default for InsightStore {
    fn default() -> Self {
        Self::new(APPROVAL_DELAY)
    }
}

impl InsightStore {
    pub fn new(approval_delay: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(InsightState {
                layers: seed_layers(),
                access_requests: HashMap::new(),
                last_request_ms: 0,
            })),
            approval_delay,
        }
    }

    /// All four layers
    pub async fn layers(&self) -> AiLayers {
        self.inner.read().await.layers.clone()
    }

    /// One layer by its wire key (`dataCollection`, `aiAnalysis`,
    /// `insightService`, `governance`); None for anything else
    pub async fn layer(&self, key: &str) -> Option<Value> {
        let layers = self.layers().await;
        let value = serde_json::to_value(layers).ok()?;
        value.get(key).cloned()
    }

    /// File a blackbox access request; approval lands later on its own timer.
    pub async fn request_access(&self, reason: &str, requested_data: &str) -> AccessReceipt {
        let id = {
            let mut state = self.inner.write().await;
            let id = state.next_request_id();
            state.access_requests.insert(
                id.clone(),
                AccessRequest {
                    id: id.clone(),
                    timestamp: Utc::now(),
                    user: "demo-user".to_string(),
                    reason: reason.to_string(),
                    requested_data: requested_data.to_string(),
                    status: AccessStatus::Pending,
                },
            );
            state.layers.governance.blackbox_access.total_requests += 1;
            state.layers.governance.blackbox_access.pending += 1;
            id
        };

        info!(request_id = %id, "blackbox access requested");

        let store = self.clone();
        let request_id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(store.approval_delay).await;
            store.approve(&request_id).await;
        });

        AccessReceipt {
            request_id: id,
            message: "블랙박스 접근 요청이 제출되었습니다. 승인 절차가 진행됩니다.".to_string(),
        }
    }

    /// Status of a previously filed request
    pub async fn request_status(&self, request_id: &str) -> Option<AccessStatus> {
        let state = self.inner.read().await;
        state.access_requests.get(request_id).map(|r| r.status)
    }

    async fn approve(&self, request_id: &str) {
        let mut state = self.inner.write().await;
        let newly_approved = match state.access_requests.get_mut(request_id) {
            Some(request) if request.status == AccessStatus::Pending => {
                request.status = AccessStatus::Approved;
                true
            }
            _ => false,
        };

        if newly_approved {
            let access = &mut state.layers.governance.blackbox_access;
            access.approved += 1;
            access.pending = access.pending.saturating_sub(1);
            info!(request_id, "blackbox access approved");
        }
    }
}

impl InsightState {
    fn next_request_id(&mut self) -> String {
        let now_ms = Utc::now().timestamp_millis();
        let id_ms = now_ms.max(self.last_request_ms + 1);
        self.last_request_ms = id_ms;
        id_ms.to_string()
    }
}

/// Canned LLM analysis payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSummary {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<Vec<PrioritizedAction>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrioritizedAction {
    pub action: String,
    pub priority: String,
}

/// Scripted LLM summary lookup. One real entry (warehouse performance); every
/// other (node, issue) pair gets the insufficient-data fallback.
pub fn generate_summary(node_id: &str, issue_type: &str) -> LlmSummary {
    match (node_id, issue_type) {
        ("dwh", "performance") => LlmSummary {
            summary: "데이터웨어하우스 성능 이슈 분석".to_string(),
            key_findings: vec![
                "결산 기간 중 동시 쿼리 수가 평소 대비 340% 증가".to_string(),
                "메모리 사용률 95% 도달로 인한 스와핑 발생".to_string(),
                "인덱스 최적화 부족으로 테이블 풀스캔 다수 발생".to_string(),
            ],
            recommendations: vec![
                "쿼리 거버너 적용으로 동시 실행 제한".to_string(),
                "메모리 증설 또는 쿼리 스케줄링 도입".to_string(),
                "자주 사용되는 쿼리에 대한 인덱스 추가".to_string(),
            ],
            risk_level: Some("HIGH".to_string()),
            estimated_impact: Some("시스템 다운타임 위험 60%".to_string()),
            suggested_actions: Some(vec![
                PrioritizedAction {
                    action: "ENABLE_QUERY_GOVERNOR".to_string(),
                    priority: "IMMEDIATE".to_string(),
                },
                PrioritizedAction {
                    action: "OPTIMIZE_INDEXES".to_string(),
                    priority: "SHORT_TERM".to_string(),
                },
                PrioritizedAction {
                    action: "SCALE_MEMORY".to_string(),
                    priority: "MEDIUM_TERM".to_string(),
                },
            ]),
        },
        _ => LlmSummary {
            summary: "분석 데이터 부족".to_string(),
            key_findings: vec!["충분한 데이터가 수집되지 않았습니다.".to_string()],
            recommendations: vec!["더 많은 데이터 수집이 필요합니다.".to_string()],
            risk_level: None,
            estimated_impact: None,
            suggested_actions: None,
        },
    }
}

fn seed_layers() -> AiLayers {
    let now = Utc::now();
    let module = |logs_per_sec| BlackboxModule {
        status: "ACTIVE".to_string(),
        logs_per_sec,
        last_collection: now,
    };

    let blackbox_modules = [
        ("dashboard", 45),
        ("api", 230),
        ("etl", 67),
        ("dwh", 120),
        ("batch", 23),
        ("cache", 89),
        ("storage", 34),
    ]
    .into_iter()
    .map(|(id, rate)| (id.to_string(), module(rate)))
    .collect();

    let kpi = |name: &str, threshold: &str| KpiDefinition {
        name: name.to_string(),
        threshold: threshold.to_string(),
        status: "NORMAL".to_string(),
    };

    AiLayers {
        data_collection: DataCollectionLayer {
            blackbox_modules,
            total_logs_collected: 2_847_293,
            kpi_definitions: vec![
                kpi("응답시간", "2초"),
                kpi("처리량", "1000 req/s"),
                kpi("오류율", "1%"),
                kpi("가용성", "99.9%"),
            ],
        },
        ai_analysis: AiAnalysisLayer {
            anomaly_detection: AnomalyDetection {
                model: "Isolation Forest v2.1".to_string(),
                accuracy: 94.2,
                last_trained: "2024-01-07".to_string(),
                anomalies_detected: 23,
                false_positive_rate: 0.05,
            },
            reinforcement_learning: ReinforcementLearning {
                model: "Deep Q-Network v1.8".to_string(),
                patterns: vec![
                    "사용자 행동 패턴".to_string(),
                    "장애 복구 패턴".to_string(),
                    "성능 최적화 패턴".to_string(),
                ],
                learning_progress: 87.3,
                recommendations: 15,
            },
            real_time_analysis: RealTimeAnalysis {
                processed_events: 15_847,
                correlation_patterns: 42,
                prediction_accuracy: 89.7,
            },
        },
        insight_service: InsightServiceLayer {
            llm_engine: LlmEngine {
                model: "GPT-4 Turbo".to_string(),
                status: "ACTIVE".to_string(),
                summaries_generated: 156,
                avg_response_time: "1.2s".to_string(),
            },
            auto_reports: AutoReports {
                generated: 23,
                scheduled: 8,
                custom_dashboards: 12,
            },
            natural_language_insights: vec![
                "시스템 성능이 지난 24시간 동안 안정적으로 유지되고 있습니다.".to_string(),
                "API 서버의 응답 시간이 평소보다 15% 빠릅니다.".to_string(),
                "캐시 적중률이 증가하여 전체 성능이 향상되었습니다.".to_string(),
            ],
        },
        governance: GovernanceLayer {
            compliance_status: "COMPLIANT".to_string(),
            blackbox_access: BlackboxAccessStats {
                total_requests: 45,
                approved: 42,
                pending: 2,
                denied: 1,
            },
            audit_trail: vec![
                AuditEntry {
                    timestamp: now,
                    user: "admin".to_string(),
                    action: "VIEW_LOGS".to_string(),
                    approved: true,
                },
                AuditEntry {
                    timestamp: now,
                    user: "engineer".to_string(),
                    action: "MODIFY_CONFIG".to_string(),
                    approved: true,
                },
                AuditEntry {
                    timestamp: now,
                    user: "analyst".to_string(),
                    action: "EXPORT_DATA".to_string(),
                    approved: false,
                },
            ],
            security_level: "ENTERPRISE".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn layer_lookup_uses_wire_keys() {
        let store = InsightStore::default();
        for key in ["dataCollection", "aiAnalysis", "insightService", "governance"] {
            assert!(store.layer(key).await.is_some(), "missing layer {key}");
        }
        assert!(store.layer("telemetry").await.is_none());
    }

    #[tokio::test]
    async fn data_collection_layer_covers_all_topology_nodes() {
        let store = InsightStore::default();
        let layers = store.layers().await;
        assert_eq!(layers.data_collection.blackbox_modules.len(), 7);
        assert_eq!(layers.data_collection.kpi_definitions.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn access_request_is_approved_after_the_delay() {
        let store = InsightStore::default();
        let before = store.layers().await.governance.blackbox_access;

        let receipt = store.request_access("성능 이상 분석", "performance_logs").await;
        assert_eq!(
            store.request_status(&receipt.request_id).await,
            Some(AccessStatus::Pending)
        );

        let pending = store.layers().await.governance.blackbox_access;
        assert_eq!(pending.total_requests, before.total_requests + 1);
        assert_eq!(pending.pending, before.pending + 1);

        tokio::time::sleep(APPROVAL_DELAY + Duration::from_millis(10)).await;

        assert_eq!(
            store.request_status(&receipt.request_id).await,
            Some(AccessStatus::Approved)
        );
        let after = store.layers().await.governance.blackbox_access;
        assert_eq!(after.approved, before.approved + 1);
        assert_eq!(after.pending, before.pending);
    }

    #[tokio::test]
    async fn unknown_request_id_has_no_status() {
        let store = InsightStore::default();
        assert_eq!(store.request_status("12345").await, None);
    }

    #[test]
    fn summary_lookup_has_one_real_entry_and_a_fallback() {
        let hit = generate_summary("dwh", "performance");
        assert_eq!(hit.summary, "데이터웨어하우스 성능 이슈 분석");
        assert_eq!(hit.risk_level.as_deref(), Some("HIGH"));
        assert_eq!(hit.suggested_actions.unwrap().len(), 3);

        let miss = generate_summary("cache", "latency");
        assert_eq!(miss.summary, "분석 데이터 부족");
        assert!(miss.risk_level.is_none());
        assert!(miss.suggested_actions.is_none());
    }
}
