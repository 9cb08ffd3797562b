//! Axum route handlers for the session form API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{analyze, AnalysisError, NO_INPUT_MESSAGE};
use crate::errors::AppError;
use crate::form::registry::SharedForm;
use crate::form::store::{Applied, FormSnapshot, FormStore, Rejected};
use crate::models::analysis::AnalysisResult;
use crate::models::profile::Mode;
use crate::render::{render, serialize, ResultView};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub form: FormSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchModeRequest {
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_name: String,
    /// Characters written into the active profile's content.
    pub extracted_chars: usize,
    pub form: FormSnapshot,
}

async fn session(state: &AppState, id: Uuid) -> Result<SharedForm, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// The last successful analysis. When there is none, the message carries
/// the error of the most recent failed attempt, if any.
fn current_result(form: &FormStore) -> Result<&AnalysisResult, AppError> {
    form.result().ok_or_else(|| match form.error() {
        Some(error) => AppError::NotFound(format!("No analysis result yet: {error}")),
        None => AppError::NotFound("No analysis result yet".to_string()),
    })
}

fn parse_mode(raw: &str) -> Result<Mode, AppError> {
    Ok(raw.parse::<Mode>()?)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let (session_id, form) = state.sessions.create().await;
    let form = form.lock().await.snapshot();
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id, form }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormSnapshot>, AppError> {
    let form = session(&state, id).await?;
    let snapshot = form.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// PUT /api/v1/sessions/:id/profiles/:mode/fields/:field
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path((id, mode, field)): Path<(Uuid, String, String)>,
    Json(request): Json<SetFieldRequest>,
) -> Result<Json<FormSnapshot>, AppError> {
    let mode = parse_mode(&mode)?;
    let form = session(&state, id).await?;
    let mut form = form.lock().await;
    form.set_field(mode, &field, request.value)?;
    Ok(Json(form.snapshot()))
}

/// POST /api/v1/sessions/:id/mode
pub async fn handle_switch_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SwitchModeRequest>,
) -> Result<Json<FormSnapshot>, AppError> {
    let mode = parse_mode(&request.mode)?;
    let form = session(&state, id).await?;
    let mut form = form.lock().await;
    info!("Session {id}: switching mode {} -> {mode}", form.mode());
    form.switch_mode(mode);
    Ok(Json(form.snapshot()))
}

/// POST /api/v1/sessions/:id/profiles/:mode/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path((id, mode)): Path<(Uuid, String)>,
) -> Result<Json<FormSnapshot>, AppError> {
    let mode = parse_mode(&mode)?;
    let form = session(&state, id).await?;
    let mut form = form.lock().await;
    form.reset(mode);
    Ok(Json(form.snapshot()))
}

/// POST /api/v1/sessions/:id/upload
///
/// Multipart body with a `file` part. The extracted text replaces the active
/// profile's content, unless the form changed while extraction ran.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = session(&state, id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.txt").to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) = upload
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    let ticket = form.lock().await.begin_extraction(&file_name);
    info!(
        "Session {id}: extracting {file_name} into {} profile",
        ticket.mode
    );

    let outcome = state.extractors.extract(&file_name, bytes).await;

    let mut form = form.lock().await;
    match outcome {
        Ok(text) => {
            let extracted_chars = text.chars().count();
            match form.finish_extraction(ticket, Ok(text)) {
                Applied::Applied => Ok(Json(UploadResponse {
                    file_name,
                    extracted_chars,
                    form: form.snapshot(),
                })),
                Applied::Discarded => Err(AppError::Stale),
            }
        }
        Err(e) => {
            form.finish_extraction(ticket, Err(e.to_string()));
            Err(AppError::Extraction(e))
        }
    }
}

/// DELETE /api/v1/sessions/:id/upload
pub async fn handle_remove_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormSnapshot>, AppError> {
    let form = session(&state, id).await?;
    let mut form = form.lock().await;
    form.remove_file();
    Ok(Json(form.snapshot()))
}

/// POST /api/v1/sessions/:id/analyze
///
/// Runs one analysis of the active profile and returns the rendered cards.
/// Refused while an upload or another analysis is in flight.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultView>, AppError> {
    let form = session(&state, id).await?;

    let (ticket, profile) = {
        let mut form = form.lock().await;
        form.begin_analysis().map_err(|rejected| match rejected {
            Rejected::Busy => {
                debug!(
                    "Session {id}: analysis refused (parsing: {}, loading: {})",
                    form.upload().parsing,
                    form.is_loading()
                );
                AppError::Busy
            }
            Rejected::NoInput => AppError::Input(NO_INPUT_MESSAGE.to_string()),
        })?
    };

    let outcome = analyze(&profile, state.model.as_ref()).await;

    let mut form = form.lock().await;
    match outcome {
        Ok(result) => {
            let view = render(&result);
            match form.finish_analysis(ticket, Ok(result)) {
                Applied::Applied => Ok(Json(view)),
                Applied::Discarded => Err(AppError::Stale),
            }
        }
        Err(e) => {
            let message = e.to_string();
            form.finish_analysis(ticket, Err(message.clone()));
            Err(match e {
                AnalysisError::NoInput => AppError::Input(message),
                _ => AppError::Analysis(message),
            })
        }
    }
}

/// GET /api/v1/sessions/:id/result
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultView>, AppError> {
    let form = session(&state, id).await?;
    let form = form.lock().await;
    Ok(Json(render(current_result(&form)?)))
}

/// GET /api/v1/sessions/:id/result/text
///
/// Clipboard rendering of the current result.
pub async fn handle_get_result_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let form = session(&state, id).await?;
    let form = form.lock().await;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        serialize(current_result(&form)?),
    ))
}
