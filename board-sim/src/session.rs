use serde::{Deserialize, Serialize};

use crate::{
    chart::PatientChart,
    metrics::PerformanceMetrics,
    phase::CasePhase,
    transcript::Message,
    turn::{PeerPlan, TurnOutcome},
};

/// The live case session. Ephemeral and memory-only: starting a new case
/// replaces it wholesale after the old metrics are archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSession {
    pub is_active: bool,
    pub phase: CasePhase,
    pub chart: PatientChart,
    pub messages: Vec<Message>,
    pub metrics: PerformanceMetrics,
    pub peer_plans: Vec<PeerPlan>,
}

impl Default for CaseSession {
    fn default() -> Self {
        Self {
            is_active: false,
            phase: CasePhase::Vignette,
            chart: PatientChart::default(),
            messages: Vec::new(),
            metrics: PerformanceMetrics::default(),
            peer_plans: Vec::new(),
        }
    }
}

impl CaseSession {
    /// Reconcile a turn result into the session.
    ///
    /// Chart scalars overwrite only when non-empty, chart lists append, metric
    /// scores overwrite when present, citation/improvement sets union, and
    /// peer plans are wholesale-replaced only by a non-empty incoming list.
    /// The phase is adopted through the transition hook. Transcript entries
    /// are appended by the controller, not here.
    pub fn apply_turn(&mut self, outcome: &TurnOutcome) {
        self.chart.apply_update(&outcome.chart_updates);

        if let Some(update) = &outcome.performance_update {
            self.metrics.apply_update(update);
        }

        if !outcome.peer_plans.is_empty() {
            self.peer_plans = outcome.peer_plans.clone();
        }

        self.phase = self.phase.validate_transition(outcome.next_phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartUpdate;
    use crate::metrics::PerformanceUpdate;

    fn planning_session() -> CaseSession {
        CaseSession {
            is_active: true,
            phase: CasePhase::Planning,
            peer_plans: vec![PeerPlan {
                resident_name: "Resident A".to_string(),
                plan: "60 Gy / 30 fx".to_string(),
                rationale: "Standard of care".to_string(),
            }],
            ..CaseSession::default()
        }
    }

    fn outcome(next_phase: CasePhase) -> TurnOutcome {
        TurnOutcome {
            feedback: "Noted.".to_string(),
            chart_updates: ChartUpdate::default(),
            next_phase,
            question_to_resident: "Continue.".to_string(),
            performance_update: None,
            peer_plans: Vec::new(),
            visual_description: None,
        }
    }

    #[test]
    fn empty_peer_plan_list_preserves_prior_plans() {
        let mut session = planning_session();
        let before = session.peer_plans.clone();

        session.apply_turn(&outcome(CasePhase::Planning));

        assert_eq!(session.peer_plans, before);
    }

    #[test]
    fn non_empty_peer_plan_list_replaces_wholesale() {
        let mut session = planning_session();

        let plan_a = PeerPlan {
            resident_name: "Resident B".to_string(),
            plan: "70 Gy / 28 fx".to_string(),
            rationale: "Dose escalation".to_string(),
        };
        let plan_b = PeerPlan {
            resident_name: "Resident C".to_string(),
            plan: "54 Gy / 3 fx SBRT".to_string(),
            rationale: "Aggressive hypofractionation".to_string(),
        };

        let mut turn = outcome(CasePhase::PeerReview);
        turn.peer_plans = vec![plan_a.clone(), plan_b.clone()];
        session.apply_turn(&turn);

        assert_eq!(session.phase, CasePhase::PeerReview);
        assert_eq!(session.peer_plans, vec![plan_a, plan_b]);
    }

    #[test]
    fn turn_merges_chart_and_metrics_together() {
        let mut session = planning_session();

        let mut turn = outcome(CasePhase::Planning);
        turn.chart_updates.staging = Some("cT2N1M0".to_string());
        turn.chart_updates.imaging = vec!["4D-CT simulation acquired".to_string()];
        turn.performance_update = Some(PerformanceUpdate {
            guideline_adherence: Some(65.0),
            improvement_areas: Some(vec!["Define treatment intent".to_string()]),
            ..PerformanceUpdate::default()
        });

        session.apply_turn(&turn);

        assert_eq!(session.chart.staging, "cT2N1M0");
        assert_eq!(session.chart.imaging, vec!["4D-CT simulation acquired"]);
        assert_eq!(session.metrics.guideline_adherence, 65.0);
        assert_eq!(session.metrics.clinical_reasoning, 100.0);
        assert_eq!(
            session.metrics.improvement_areas,
            vec!["Define treatment intent"]
        );
    }
}
