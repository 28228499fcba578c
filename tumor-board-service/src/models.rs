use board_sim::{
    CasePhase, ControllerSnapshot, HistoryEntry, Message, PatientChart, PeerPlan,
    PerformanceMetrics,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCaseRequest {
    /// Requested case flavor, e.g. "Lung", "Breast", "Random High Yield".
    pub case_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTurnRequest {
    pub message: String,
}

/// Full controller snapshot returned by every board endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub active: bool,
    pub case_label: String,
    pub phase: CasePhase,
    pub chart: PatientChart,
    pub messages: Vec<Message>,
    pub metrics: PerformanceMetrics,
    pub peer_plans: Vec<PeerPlan>,
    pub awaiting_turn: bool,
    pub illustration_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ControllerSnapshot> for BoardResponse {
    fn from(snapshot: ControllerSnapshot) -> Self {
        Self {
            active: snapshot.session.is_active,
            case_label: snapshot.case_label,
            phase: snapshot.session.phase,
            chart: snapshot.session.chart,
            messages: snapshot.session.messages,
            metrics: snapshot.session.metrics,
            peer_plans: snapshot.session.peer_plans,
            awaiting_turn: snapshot.awaiting_turn,
            illustration_pending: snapshot.illustration_pending,
            error: snapshot.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}
