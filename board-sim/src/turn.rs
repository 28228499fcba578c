use serde::{Deserialize, Serialize};

use crate::{
    chart::{ChartUpdate, PatientChart},
    metrics::PerformanceUpdate,
    phase::CasePhase,
    transcript::Message,
};

/// A simulated competing treatment proposal presented for critique during the
/// PeerReview phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerPlan {
    pub resident_name: String,
    pub plan: String,
    pub rationale: String,
}

/// Everything the reasoning collaborator needs to produce the next turn.
///
/// `history` has already been filtered by the controller: system-role entries
/// and the in-flight user message are excluded.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRequest {
    pub phase: CasePhase,
    pub chart: PatientChart,
    pub history: Vec<Message>,
    pub user_text: String,
    pub case_label: String,
}

/// Structured turn result returned by the reasoning collaborator.
///
/// `feedback`, `next_phase` and `question_to_resident` are required; a reply
/// missing any of them fails to parse and the turn is rejected. Everything
/// else is a partial update with an explicit empty/absent default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub feedback: String,
    #[serde(default)]
    pub chart_updates: ChartUpdate,
    pub next_phase: CasePhase,
    pub question_to_resident: String,
    #[serde(default)]
    pub performance_update: Option<PerformanceUpdate>,
    #[serde(default)]
    pub peer_plans: Vec<PeerPlan>,
    #[serde(default)]
    pub visual_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_parses_with_only_required_fields() {
        let outcome: TurnOutcome = serde_json::from_str(
            r#"{
                "feedback": "Good start.",
                "nextPhase": "Imaging",
                "questionToResident": "What imaging would you order?"
            }"#,
        )
        .unwrap();

        assert_eq!(outcome.next_phase, CasePhase::Imaging);
        assert!(outcome.chart_updates.imaging.is_empty());
        assert!(outcome.performance_update.is_none());
        assert!(outcome.peer_plans.is_empty());
        assert!(outcome.visual_description.is_none());
    }

    #[test]
    fn outcome_without_feedback_is_rejected() {
        let result = serde_json::from_str::<TurnOutcome>(
            r#"{"nextPhase": "Imaging", "questionToResident": "Next?"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn peer_plans_parse_from_camel_case_wire_form() {
        let outcome: TurnOutcome = serde_json::from_str(
            r#"{
                "feedback": "Two colleagues have submitted plans.",
                "nextPhase": "PeerReview",
                "questionToResident": "Critique both plans.",
                "peerPlans": [
                    {"residentName": "Resident A", "plan": "60 Gy / 30 fx", "rationale": "Standard fractionation"},
                    {"residentName": "Resident B", "plan": "70 Gy / 28 fx", "rationale": "Dose escalation"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(outcome.peer_plans.len(), 2);
        assert_eq!(outcome.peer_plans[0].resident_name, "Resident A");
    }
}
