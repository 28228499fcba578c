use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Stages of a simulated tumor board case, in their intended order.
///
/// Which phase comes next is decided by the reasoning collaborator, not by
/// this crate. The controller adopts whatever phase the collaborator returns,
/// routed through [`CasePhase::validate_transition`] so that legality checks
/// have a single place to live if they are ever tightened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasePhase {
    Vignette,
    Imaging,
    Pathology,
    Staging,
    Planning,
    PeerReview,
    Completed,
}

impl CasePhase {
    /// Position of this phase in the intended forward progression.
    pub fn step_index(self) -> usize {
        match self {
            CasePhase::Vignette => 0,
            CasePhase::Imaging => 1,
            CasePhase::Pathology => 2,
            CasePhase::Staging => 3,
            CasePhase::Planning => 4,
            CasePhase::PeerReview => 5,
            CasePhase::Completed => 6,
        }
    }

    /// Transition hook. Currently permissive: every reported phase is
    /// accepted, with regressions and skips logged so they are visible.
    pub fn validate_transition(self, next: CasePhase) -> CasePhase {
        if next.step_index() < self.step_index() {
            warn!(from = %self, to = %next, "collaborator reported a phase regression");
        } else if next.step_index() > self.step_index() + 1 {
            warn!(from = %self, to = %next, "collaborator skipped ahead in the case flow");
        }
        next
    }
}

impl fmt::Display for CasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CasePhase::Vignette => "Vignette",
            CasePhase::Imaging => "Imaging",
            CasePhase::Pathology => "Pathology",
            CasePhase::Staging => "Staging",
            CasePhase::Planning => "Planning",
            CasePhase::PeerReview => "PeerReview",
            CasePhase::Completed => "Completed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_serialize_as_pascal_case_names() {
        let json = serde_json::to_string(&CasePhase::PeerReview).unwrap();
        assert_eq!(json, "\"PeerReview\"");

        let parsed: CasePhase = serde_json::from_str("\"Imaging\"").unwrap();
        assert_eq!(parsed, CasePhase::Imaging);
    }

    #[test]
    fn unknown_phase_names_fail_to_parse() {
        assert!(serde_json::from_str::<CasePhase>("\"Recovery\"").is_err());
    }

    #[test]
    fn transitions_are_accepted_even_when_irregular() {
        // The hook is permissive today: regressions and skips pass through.
        assert_eq!(
            CasePhase::Planning.validate_transition(CasePhase::Vignette),
            CasePhase::Vignette
        );
        assert_eq!(
            CasePhase::Vignette.validate_transition(CasePhase::Completed),
            CasePhase::Completed
        );
    }
}
