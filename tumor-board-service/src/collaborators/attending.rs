use async_trait::async_trait;
use board_sim::{
    Message, ReasoningCollaborator, Role, SimError, TurnOutcome, TurnRequest,
};
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::{Chat, Message as RigMessage},
    providers::openrouter,
};
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

const ATTENDING_PROMPT: &str = r#"You are an expert Radiation Oncology Attending leading a Multidisciplinary Tumor Board simulation for a resident.

**Phases:**
1. **Vignette**: Present the patient. Generate a 'visualDescription' for the medical illustrator here.
   - **ILLUSTRATION RULE**: The description MUST be written for a medical illustrator creating a plate for the Netter Atlas. It needs anatomical precision. NOT "a tumor in the lung". BUT "Right lateral thoracotomy view showing a 4cm spiculated mass in the RUL apicoposterior segment, retracting the visceral pleura, adjacent to the azygos vein."
2. **Imaging/Pathology/Staging**: Reveal the workup sequentially.
3. **Planning**: Discuss intent, dose, fractionation, OARs.
   - **CRITICAL**: If the resident proposes a dose/fractionation/technique, you MUST ask them to explicitly define the **Intent of Treatment** (Radical, Adjuvant, Palliative) if they haven't already. Do not accept the plan without establishing intent.
   - **DYNAMIC OAR ILLUSTRATION**: When the resident mentions specific Organs At Risk (OARs) (e.g., "optic chiasm", "rectum", "brainstem"), you MUST generate a new 'visualDescription' as a zoomed-in anatomical view highlighting the spatial relationship between the tumor and those OARs.
4. **PeerReview**: After the resident commits to a plan AND intent, switch to this phase.
   - Generate 2 "Simulated Peer Plans" (e.g., from "Resident A" and "Resident B").
   - One plan should be reasonable but slightly different (e.g., different fractionation).
   - One plan should have a minor or major flaw (e.g., missing an OAR, aggressive dose).
   - Ask the user to critique these plans.
5. **Completed**: Final wrap-up.

**Performance Dashboard**:
- Evaluate every user response.
- Provide scores (0-100) for Reasoning, Guideline Adherence, and Safety.
- Log specific guidelines (NCCN/ASTRO) and "Improvement Areas" if they make mistakes.

**Tone**:
- Strict but educational.
- Challenge the resident if they miss OARs or Guidelines."#;

const RESPONSE_CONTRACT: &str = r#"Respond with a SINGLE JSON object and nothing else. Fields:
- "feedback" (string, required): detailed clinical feedback, Markdown allowed.
- "nextPhase" (string, required): one of "Vignette", "Imaging", "Pathology", "Staging", "Planning", "PeerReview", "Completed".
- "questionToResident" (string, required): the next question to ask the resident.
- "chartUpdates" (object, optional): any of "demographics", "hpi", "staging", "comorbidities", "labs" (strings, only when new information is revealed) and "imaging", "pathology" (arrays of strings holding ONLY the newly revealed findings).
- "performanceUpdate" (object, optional): any of "clinicalReasoning", "guidelineAdherence", "safetyAwareness" (numbers 0-100, include a score ONLY when you graded this turn; a 0 is a real failing grade), "guidelinesCited", "improvementAreas" (arrays of strings).
- "peerPlans" (array, optional): exactly 2 objects with "residentName", "plan", "rationale" — ONLY when transitioning to PeerReview.
- "visualDescription" (string, optional): a surgical-grade anatomical description for the medical illustrator, specifying orientation, landmark structures, the pathology's exact relationship to them, and the style cue "in the style of Netter Atlas"."#;

/// Turn-generation client backed by an OpenRouter chat agent.
pub struct AttendingClient {
    agent: Agent<openrouter::CompletionModel>,
}

impl AttendingClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
        let model =
            std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        info!(model = %model, "creating attending agent");

        let client = openrouter::Client::new(&api_key);
        let preamble = format!("{}\n\n{}", ATTENDING_PROMPT, RESPONSE_CONTRACT);
        let agent = client
            .agent(&model)
            .preamble(&preamble)
            .temperature(0.4)
            .build();
        Ok(Self { agent })
    }
}

#[async_trait]
impl ReasoningCollaborator for AttendingClient {
    async fn generate_turn(&self, request: TurnRequest) -> board_sim::Result<TurnOutcome> {
        let history = to_rig_messages(&request.history);
        let prompt = build_turn_prompt(&request);

        debug!(phase = %request.phase, history_len = history.len(), "requesting turn from attending model");

        let response = self
            .agent
            .chat(prompt.as_str(), history)
            .await
            .map_err(|e| SimError::Collaborator(e.to_string()))?;

        parse_turn_outcome(&response)
    }
}

fn to_rig_messages(messages: &[Message]) -> Vec<RigMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::User => RigMessage::user(m.content.clone()),
            Role::Assistant => RigMessage::assistant(m.content.clone()),
            // System entries are filtered out upstream; map any stray one to
            // a tagged user message since rig history has no system role.
            Role::System => RigMessage::user(format!("[SYSTEM] {}", m.content)),
        })
        .collect()
}

fn build_turn_prompt(request: &TurnRequest) -> String {
    let chart_json =
        serde_json::to_string(&request.chart).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"Current Phase: {phase}
Current Patient Chart Data: {chart}
Case Type Requested (if start): {case_label}

Resident's Latest Response: "{user_text}"

Instruction:
- Advance phase only if the resident satisfies the current step.
- If in Planning and the resident gives a solid plan with intent, move to PeerReview and generate peerPlans.
- If in PeerReview and the resident critiques well, move to Completed.
- Update performance metrics based on this specific turn."#,
        phase = request.phase,
        chart = chart_json,
        case_label = request.case_label,
        user_text = request.user_text,
    )
}

/// Parse the model reply into a turn outcome.
///
/// Strips a fenced code block when present, then falls back to the outermost
/// braces for models that wrap the JSON in prose.
fn parse_turn_outcome(raw: &str) -> board_sim::Result<TurnOutcome> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SimError::Contract("empty response body".to_string()));
    }

    let stripped = strip_code_fence(trimmed);
    match serde_json::from_str::<TurnOutcome>(stripped) {
        Ok(outcome) => Ok(outcome),
        Err(first_err) => {
            if let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) {
                if start < end {
                    if let Ok(outcome) =
                        serde_json::from_str::<TurnOutcome>(&stripped[start..=end])
                    {
                        return Ok(outcome);
                    }
                }
            }
            Err(SimError::Contract(format!(
                "malformed turn response: {}",
                first_err
            )))
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
