use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use board_sim::{
    FileHistoryStore, HistoryStore, IllustrationCollaborator, SessionController, SimError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    collaborators::{AttendingClient, NetterIllustrator},
    models::{BoardResponse, HistoryResponse, StartCaseRequest, SubmitTurnRequest},
};

/// Presentation-time bound on the history endpoint.
const HISTORY_DISPLAY_LIMIT: usize = 10;
const DEFAULT_HISTORY_PATH: &str = "tumor_board_history.json";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub history: Arc<dyn HistoryStore>,
}

pub async fn create_app() -> Router {
    let app_state = create_app_state();
    build_router(app_state)
}

fn create_app_state() -> AppState {
    let attending = AttendingClient::from_env().unwrap_or_else(|e| {
        error!("Failed to create attending client: {}", e);
        std::process::exit(1);
    });

    let illustrator: Option<Arc<dyn IllustrationCollaborator>> = NetterIllustrator::from_env()
        .map(|client| Arc::new(client) as Arc<dyn IllustrationCollaborator>);

    let history_path =
        std::env::var("HISTORY_PATH").unwrap_or_else(|_| DEFAULT_HISTORY_PATH.to_string());
    let history: Arc<dyn HistoryStore> = Arc::new(FileHistoryStore::new(history_path));

    let controller = Arc::new(SessionController::new(
        Arc::new(attending),
        illustrator,
        history.clone(),
    ));

    AppState {
        controller,
        history,
    }
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/board/start", post(start_case))
        .route("/board/turn", post(submit_turn))
        .route("/board", get(get_board))
        .route("/board/history", get(get_history))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Tumor Board Simulation Service",
        "version": "1.0.0",
        "description": "AI-driven radiation oncology tumor board simulation for residents",
        "endpoints": {
            "POST /board/start": "Start a new case (archives the previous one)",
            "POST /board/turn": "Submit the resident's reply for the current turn",
            "GET /board": "Current session snapshot",
            "GET /board/history": "Most recent archived sessions",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn start_case(
    State(state): State<AppState>,
    Json(request): Json<StartCaseRequest>,
) -> ApiResult<BoardResponse> {
    if request.case_type.trim().is_empty() {
        return Err(bad_request_error("Case type is required"));
    }

    info!("Starting new tumor board case: {}", request.case_type);

    match state.controller.start_case(request.case_type).await {
        Ok(()) => Ok(Json(state.controller.snapshot().into())),
        Err(e) => {
            error!("Failed to start case: {}", e);
            Err(internal_error("Failed to start case", &e.to_string()))
        }
    }
}

async fn submit_turn(
    State(state): State<AppState>,
    Json(request): Json<SubmitTurnRequest>,
) -> ApiResult<BoardResponse> {
    if request.message.trim().is_empty() {
        return Err(bad_request_error("Message cannot be empty"));
    }

    match state.controller.submit_turn(request.message).await {
        // A failed collaborator call still resolves Ok here: it surfaces as a
        // system-role transcript entry in the snapshot.
        Ok(()) => Ok(Json(state.controller.snapshot().into())),
        Err(SimError::TurnInFlight) => {
            Err(conflict_error("A turn is already being processed"))
        }
        Err(SimError::NoActiveCase) => {
            Err(bad_request_error("No active case; start one first"))
        }
        Err(e) => {
            error!("Failed to process turn: {}", e);
            Err(internal_error("Failed to process turn", &e.to_string()))
        }
    }
}

async fn get_board(State(state): State<AppState>) -> Json<BoardResponse> {
    Json(state.controller.snapshot().into())
}

async fn get_history(State(state): State<AppState>) -> ApiResult<HistoryResponse> {
    match state.history.load().await {
        Ok(mut entries) => {
            entries.truncate(HISTORY_DISPLAY_LIMIT);
            Ok(Json(HistoryResponse { entries }))
        }
        Err(e) => {
            error!("Failed to load history: {}", e);
            Err(internal_error("Failed to load history", &e.to_string()))
        }
    }
}
