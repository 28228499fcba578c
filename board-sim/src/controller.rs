use serde::Serialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::{
    chart::PatientChart,
    collaborator::{IllustrationCollaborator, ReasoningCollaborator},
    error::{Result, SimError},
    history::{HistoryEntry, HistoryStore},
    metrics::PerformanceMetrics,
    phase::CasePhase,
    session::CaseSession,
    transcript::{Message, Role},
    turn::TurnRequest,
};

const START_TURN_TEXT: &str = "Start Case";
const CONNECTION_ERROR_TEXT: &str = "Connection Error: Please try again.";
const START_FAILURE_TEXT: &str = "Failed to generate the opening case. Please try again.";

/// Read-only view of controller state for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub session: CaseSession,
    pub case_label: String,
    pub awaiting_turn: bool,
    pub illustration_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct ControllerState {
    session: CaseSession,
    case_label: String,
    awaiting_turn: bool,
    illustration_pending: bool,
    error: Option<String>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            session: CaseSession::default(),
            case_label: "Random".to_string(),
            awaiting_turn: false,
            illustration_pending: false,
            error: None,
        }
    }
}

/// Shared between the controller and its detached illustration tasks.
struct ControllerInner {
    state: Mutex<ControllerState>,
    generation: AtomicU64,
}

impl ControllerInner {
    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Single owner of the live simulation state.
///
/// All mutation happens here: the controller issues turn requests to the
/// reasoning collaborator and reconciles the structured results into the
/// session. Exactly one turn may be in flight at a time; illustration
/// requests are detached and never gate a turn.
///
/// Every start/turn captures the current session generation. A result whose
/// generation no longer matches (because a new case started meanwhile) is
/// discarded instead of overwriting fresher state, and the same check keeps a
/// superseded session from receiving a stale illustration.
pub struct SessionController {
    inner: Arc<ControllerInner>,
    reasoning: Arc<dyn ReasoningCollaborator>,
    illustrator: Option<Arc<dyn IllustrationCollaborator>>,
    history: Arc<dyn HistoryStore>,
}

impl SessionController {
    pub fn new(
        reasoning: Arc<dyn ReasoningCollaborator>,
        illustrator: Option<Arc<dyn IllustrationCollaborator>>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(ControllerState::default()),
                generation: AtomicU64::new(0),
            }),
            reasoning,
            illustrator,
            history,
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.inner.state.lock().unwrap();
        ControllerSnapshot {
            session: state.session.clone(),
            case_label: state.case_label.clone(),
            awaiting_turn: state.awaiting_turn,
            illustration_pending: state.illustration_pending,
            error: state.error.clone(),
        }
    }

    /// Start a new case, archiving the previous session's metrics when it saw
    /// at least one exchange beyond the opening message.
    pub async fn start_case(&self, case_label: impl Into<String>) -> Result<()> {
        let case_label = case_label.into();

        // The generation bump and the session reset happen under one lock, so
        // no concurrent start or submit can pair a stale generation with the
        // new session.
        let (generation, archived) = {
            let mut state = self.inner.state.lock().unwrap();
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let archive = (state.session.is_active && state.session.messages.len() > 1).then(|| {
                HistoryEntry::new(state.case_label.clone(), state.session.metrics.clone())
            });

            state.session = CaseSession {
                is_active: true,
                ..CaseSession::default()
            };
            state.case_label = case_label.clone();
            state.awaiting_turn = true;
            state.illustration_pending = false;
            state.error = None;
            (generation, archive)
        };

        if let Some(entry) = archived {
            if let Err(e) = self.history.append(entry).await {
                warn!(error = %e, "failed to archive the previous session");
            }
        }

        info!(case_label = %case_label, generation, "starting new case");

        let request = TurnRequest {
            phase: CasePhase::Vignette,
            chart: PatientChart::default(),
            history: Vec::new(),
            user_text: START_TURN_TEXT.to_string(),
            case_label: case_label.clone(),
        };

        match self.reasoning.generate_turn(request).await {
            Ok(outcome) => {
                {
                    let mut state = self.inner.state.lock().unwrap();
                    if self.inner.current_generation() != generation {
                        info!(generation, "discarding case opening for a superseded session");
                        return Ok(());
                    }

                    let opening = format!(
                        "**CASE STARTED**\n\n{}\n\n**{}**",
                        outcome.feedback, outcome.question_to_resident
                    );
                    state.session.messages = vec![Message::assistant(opening)];
                    state.session.chart.apply_update(&outcome.chart_updates);
                    state.session.phase =
                        state.session.phase.validate_transition(outcome.next_phase);
                    // A fresh case always starts from full-scale metrics, even
                    // if the opening turn carries a performance update.
                    state.session.metrics = PerformanceMetrics::default();
                    state.awaiting_turn = false;
                }
                self.spawn_illustration(generation, outcome.visual_description);
                Ok(())
            }
            Err(e) => {
                let mut state = self.inner.state.lock().unwrap();
                if self.inner.current_generation() == generation {
                    state.session.is_active = false;
                    state.awaiting_turn = false;
                    state.error = Some(START_FAILURE_TEXT.to_string());
                }
                Err(e)
            }
        }
    }

    /// Submit the resident's reply for the current turn.
    ///
    /// The user message is appended optimistically and retained even when the
    /// turn request fails; a failed turn surfaces as a single system-role
    /// transcript entry and leaves every other piece of state untouched.
    pub async fn submit_turn(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();

        // The generation is read under the same lock that guards the session,
        // so the captured value always belongs to the session this turn is
        // dispatched against.
        let (generation, request) = {
            let mut state = self.inner.state.lock().unwrap();
            if !state.session.is_active {
                return Err(SimError::NoActiveCase);
            }
            if state.awaiting_turn {
                return Err(SimError::TurnInFlight);
            }
            let generation = self.inner.current_generation();

            // The collaborator sees the prior conversation only: no
            // system-role entries and not the message being submitted now.
            let history: Vec<Message> = state
                .session
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned()
                .collect();

            state.session.messages.push(Message::user(text.clone()));
            state.awaiting_turn = true;

            let request = TurnRequest {
                phase: state.session.phase,
                chart: state.session.chart.clone(),
                history,
                user_text: text,
                case_label: state.case_label.clone(),
            };
            (generation, request)
        };

        debug!(phase = %request.phase, generation, "dispatching turn request");

        match self.reasoning.generate_turn(request).await {
            Ok(outcome) => {
                {
                    let mut state = self.inner.state.lock().unwrap();
                    if self.inner.current_generation() != generation {
                        info!(generation, "discarding turn result for a superseded session");
                        return Ok(());
                    }

                    state.session.apply_turn(&outcome);
                    state.session.messages.push(Message::assistant(format!(
                        "{}\n\n**{}**",
                        outcome.feedback, outcome.question_to_resident
                    )));
                    state.awaiting_turn = false;
                }
                self.spawn_illustration(generation, outcome.visual_description);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "turn request failed");
                let mut state = self.inner.state.lock().unwrap();
                if self.inner.current_generation() == generation {
                    state.awaiting_turn = false;
                    state
                        .session
                        .messages
                        .push(Message::system(CONNECTION_ERROR_TEXT));
                }
                Ok(())
            }
        }
    }

    /// Fire-and-forget illustration request. The result is applied through
    /// the generation check, so a superseded session never receives a stale
    /// image, and failures are absorbed silently.
    fn spawn_illustration(&self, generation: u64, description: Option<String>) {
        let Some(description) = description else {
            return;
        };
        let Some(illustrator) = self.illustrator.clone() else {
            return;
        };

        {
            let mut state = self.inner.state.lock().unwrap();
            if self.inner.current_generation() != generation {
                return;
            }
            state.illustration_pending = true;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = illustrator.generate_illustration(&description).await;

            let mut state = inner.state.lock().unwrap();
            if inner.current_generation() != generation {
                debug!(generation, "discarding illustration for a superseded session");
                return;
            }
            state.illustration_pending = false;

            match result {
                Ok(url) if !url.is_empty() => {
                    state.session.chart.illustration_url = Some(url);
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "illustration generation failed");
                }
            }
        });
    }
}
