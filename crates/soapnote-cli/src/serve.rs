//! HTTP transport: status, a message log and transcription structuring.
//!
//! State is in-memory only. Engine work runs on the blocking pool because
//! capabilities (remote inference, ONNX) are synchronous.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Local;
use serde::Serialize;
use serde_json::{Value, json};
use soapnote_ai::NoteEngine;
use soapnote_core::SoapNote;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct AppState {
    engine: Arc<NoteEngine>,
    log: Arc<Mutex<Log>>,
}

impl AppState {
    pub fn new(engine: Arc<NoteEngine>) -> Self {
        Self {
            engine,
            log: Arc::default(),
        }
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut Log) -> T) -> Result<T, ApiError> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| ApiError::internal("message log unavailable"))?;
        Ok(f(&mut log))
    }
}

#[derive(Default)]
struct Log {
    messages: Vec<Entry>,
    transcriptions: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize)]
struct Entry {
    #[serde(rename = "message")]
    body: String,
    timestamp: String,
}

impl Entry {
    fn now(body: String) -> Self {
        Self {
            body,
            timestamp: Local::now().format(TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Serialize)]
struct Analysis {
    soap: SoapNote,
    entities: BTreeMap<String, Vec<String>>,
}

/// JSON error body with a status code.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/messages", get(list_messages).post(add_message))
        .route("/api/transcribe", post(transcribe))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run(addr: &str, engine: Arc<NoteEngine>) -> anyhow::Result<()> {
    let app = router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let (messages, transcriptions) =
        state.with_log(|log| (log.messages.len(), log.transcriptions.len()))?;
    Ok(Json(json!({
        "status": "online",
        "time": Local::now().format(TIME_FORMAT).to_string(),
        "messages_count": messages,
        "transcriptions_count": transcriptions,
    })))
}

async fn list_messages(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let messages = state.with_log(|log| log.messages.clone())?;
    Ok(Json(json!({ "messages": messages })))
}

async fn add_message(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload.map_err(|_| ApiError::bad_request("Invalid request format"))?;
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("No message provided"))?
        .to_string();

    state.with_log(|log| log.messages.push(Entry::now(message)))?;
    Ok(Json(json!({ "status": "success" })))
}

async fn transcribe(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload.map_err(|_| ApiError::bad_request("Invalid request format"))?;
    let text = body
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No text provided"))?
        .to_string();

    let count = state.with_log(|log| {
        log.transcriptions.push(Entry::now(text.clone()));
        log.transcriptions.len()
    })?;
    info!(chars = text.len(), transcriptions = count, "structuring transcription");

    let engine = Arc::clone(&state.engine);
    let (note, entities) = tokio::task::spawn_blocking(move || {
        let note = engine.process(&text);
        let entities = engine.entities(&text);
        (note, entities)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "structuring task failed");
        ApiError::internal(e.to_string())
    })?;
    let soap = note.map_err(|e| ApiError::bad_request(e.to_string()))?;

    let analysis = Analysis { soap, entities };
    Ok(Json(json!({ "status": "success", "analysis": analysis })))
}
