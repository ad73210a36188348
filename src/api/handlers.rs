//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AnswerRequest, ChatRequest, ErrorResponse, LanguageRequest, QueuedResponse, SchemeInfo,
    SchemesResponse, SessionResponse, StartEligibilityRequest, SuccessResponse,
};
use super::AppState;
use crate::runtime::SseEvent;
use crate::schemes::Scheme;
use crate::session::Language;
use crate::state_machine::Event;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions/new", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/eligibility", post(start_eligibility))
        .route("/api/sessions/:id/answer", post(send_answer))
        .route("/api/sessions/:id/language", post(set_language))
        // Static metadata
        .route("/api/schemes", get(list_schemes))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let session = state.runtime.create_session().await;
    session_response(&state, &session.id)
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    session_response(&state, &id)
}

fn session_response(state: &AppState, id: &str) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .runtime
        .store()
        .get_session(id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    let messages = state
        .runtime
        .store()
        .get_messages(id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let chat_state = state
        .runtime
        .state_json(id)
        .map_err(AppError::Internal)?;

    Ok(Json(SessionResponse {
        session,
        messages,
        busy: state.runtime.is_busy(id),
        state: chat_state,
    }))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .runtime
        .store()
        .get_session(&id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    let messages = state
        .runtime
        .store()
        .get_messages(&id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let broadcast_rx = state
        .runtime
        .subscribe(&id)
        .await
        .map_err(AppError::Internal)?;

    let json_msgs: Vec<Value> = messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
        .collect();

    let init_event = SseEvent::Init {
        session: serde_json::to_value(&session).unwrap_or(Value::Null),
        messages: json_msgs,
        busy: state.runtime.is_busy(&id),
        state: state.runtime.state_json(&id).map_err(AppError::Internal)?,
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .runtime
        .send_event(&id, Event::SubmitQuery { text: req.text })
        .await
        .map_err(AppError::BadRequest)?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn start_eligibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StartEligibilityRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .runtime
        .send_event(
            &id,
            Event::StartEligibility {
                scheme_name: req.scheme_name,
            },
        )
        .await
        .map_err(AppError::BadRequest)?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn send_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .runtime
        .send_event(&id, Event::Answer { value: req.answer })
        .await
        .map_err(AppError::BadRequest)?;

    Ok(Json(QueuedResponse { queued: true }))
}

async fn set_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .runtime
        .store()
        .set_language(&id, req.language)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Static Metadata
// ============================================================

async fn list_schemes() -> Json<SchemesResponse> {
    let schemes = Scheme::all()
        .iter()
        .map(|scheme| SchemeInfo {
            name: scheme.name().to_string(),
            question_count: scheme.questions().len(),
        })
        .collect();

    let languages = Language::all()
        .iter()
        .map(|lang| lang.name().to_string())
        .collect();

    Json(SchemesResponse { schemes, languages })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("sarkari-mitra ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
