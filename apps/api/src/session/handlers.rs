//! Axum route handlers for builder sessions.
//!
//! Locking discipline: snapshot what a slow call needs under a short lock,
//! drop the lock across every await on the assistant or the export engine,
//! then re-acquire to merge. Assistant merges go through staleness tickets,
//! so navigation is never blocked by an outstanding call.

use std::str::FromStr;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assistant::prompts::{
    achievements_context, project_description_context, summary_context, PromptContext,
};
use crate::assistant::{CvAnalysis, OptimizationAnalysis, TargetJob};
use crate::draft::DraftHandle;
use crate::errors::AppError;
use crate::export::{self, ExportFormat};
use crate::model::{CVDocument, SectionKind, SectionUpdate};
use crate::session::{AssistantTarget, AssistantTicket, BuilderSession, MergeOutcome, UpdateOutcome};
use crate::state::AppState;
use crate::templates::find_template;
use crate::wizard::{CompletionReport, Transition};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Seed the session from the persisted draft, when one exists.
    #[serde(default = "default_true")]
    pub resume_draft: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub document: CVDocument,
    pub active_step: usize,
    pub completion: CompletionReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionResponse {
    #[serde(flatten)]
    pub outcome: UpdateOutcome,
    pub completion: CompletionReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResponse {
    pub active_step: usize,
    pub label: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub section: SectionKind,
    pub entry_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub outcome: MergeOutcome,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub target_job: TargetJob,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub analysis: OptimizationAnalysis,
    /// The proposed replacement document. A preview only; nothing is committed.
    pub preview: CVDocument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: String,
    /// Optional override used for this render only; not written back.
    pub template_id: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let resume_draft = body.map(|Json(b)| b.resume_draft).unwrap_or(true);

    let session = if resume_draft {
        match state.drafts.load().await? {
            Some(doc) => {
                info!("Resuming builder session from saved draft");
                BuilderSession::with_document(doc)
            }
            None => BuilderSession::new(),
        }
    } else {
        BuilderSession::new()
    };

    let response = session_response(&session);
    state.sessions.write().await.insert(session.id, session);
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let sessions = state.sessions.read().await;
    let session = get_session(&sessions, session_id)?;
    Ok(Json(session_response(session)))
}

/// DELETE /api/v1/sessions/:id — explicit discard.
pub async fn handle_discard_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = state.sessions.write().await.remove(&session_id);
    if removed.is_none() {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Editing
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/sessions/:id/sections
pub async fn handle_update_section(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(update): Json<SectionUpdate>,
) -> Result<Json<UpdateSectionResponse>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = get_session_mut(&mut sessions, session_id)?;
    let outcome = session.update_section(update);
    Ok(Json(UpdateSectionResponse {
        completion: session.completion(),
        outcome,
    }))
}

/// POST /api/v1/sessions/:id/navigate
pub async fn handle_navigate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(transition): Json<Transition>,
) -> Result<Json<NavigateResponse>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = get_session_mut(&mut sessions, session_id)?;
    let active_step = session.navigate(transition)?;
    Ok(Json(NavigateResponse {
        active_step,
        label: crate::wizard::STEPS[active_step].label,
    }))
}

/// GET /api/v1/sessions/:id/completion
pub async fn handle_completion(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CompletionReport>, AppError> {
    let sessions = state.sessions.read().await;
    let session = get_session(&sessions, session_id)?;
    Ok(Json(session.completion()))
}

/// POST /api/v1/sessions/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DraftHandle>, AppError> {
    let doc = {
        let sessions = state.sessions.read().await;
        get_session(&sessions, session_id)?.document().clone()
    };
    let handle = state.drafts.save(&doc)?;
    Ok(Json(handle))
}

// ────────────────────────────────────────────────────────────────────────────
// Assistant
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/assistant/generate
///
/// The session lock is NOT held across the assistant call. The merge is
/// staleness-checked: if the user navigated away while the call was in
/// flight, the result is returned but never applied to the document.
pub async fn handle_assistant_generate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let (ticket, context) = {
        let sessions = state.sessions.read().await;
        let session = get_session(&sessions, session_id)?;
        build_generation_plan(session, &request)?
    };

    let content = state.assistant.generate(&context).await?;

    let mut sessions = state.sessions.write().await;
    let session = get_session_mut(&mut sessions, session_id)?;
    let outcome = session.apply_generated(ticket, &content);
    Ok(Json(GenerateResponse { outcome, content }))
}

/// POST /api/v1/sessions/:id/assistant/analyze
pub async fn handle_assistant_analyze(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CvAnalysis>, AppError> {
    let doc = {
        let sessions = state.sessions.read().await;
        get_session(&sessions, session_id)?.document().clone()
    };
    let analysis = state.assistant.analyze(&doc).await?;
    Ok(Json(analysis))
}

/// POST /api/v1/sessions/:id/assistant/optimize
///
/// Stages the optimized document as a preview. Committing requires the
/// explicit confirm endpoint; the preview never touches the document.
pub async fn handle_assistant_optimize(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    let doc = {
        let sessions = state.sessions.read().await;
        get_session(&sessions, session_id)?.document().clone()
    };

    let optimization = state
        .assistant
        .optimize_for_target(&doc, &request.target_job)
        .await?;
    let response = OptimizeResponse {
        analysis: optimization.analysis.clone(),
        preview: optimization.optimized.clone(),
    };

    let mut sessions = state.sessions.write().await;
    let session = get_session_mut(&mut sessions, session_id)?;
    session.stage_optimization(optimization);
    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/assistant/optimize/confirm
pub async fn handle_optimize_confirm(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = get_session_mut(&mut sessions, session_id)?;
    session
        .confirm_optimization()
        .ok_or_else(|| AppError::NotFound("No staged optimization to confirm".to_string()))?;
    Ok(Json(session_response(session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/export
///
/// Long-running: the writer runs on the blocking pool under a bounded
/// timeout. A failed export never mutates the source document, so export is
/// always retryable.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let format = ExportFormat::from_str(&request.format)?;

    let (tree, filename) = {
        let mut sessions = state.sessions.write().await;
        let session = get_session_mut(&mut sessions, session_id)?;
        let override_selection = match &request.template_id {
            Some(template_id) => Some(
                find_template(template_id)
                    .ok_or_else(|| AppError::NotFound(format!("Template {template_id} not found")))?
                    .selection(),
            ),
            None => None,
        };
        let tree = session.render_for_export(override_selection, Utc::now().date_naive())?;
        let filename = export::suggested_filename(session.document(), format);
        (tree, filename)
    };

    let timeout = Duration::from_secs(state.config.export_timeout_secs);
    let blob = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || export::export(&tree, format)),
    )
    .await
    .map_err(|_| AppError::ExportTimedOut)?
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Export task failed: {e}")))??;

    info!("Exported {filename} ({} bytes)", blob.len());

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        blob,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

type SessionMap = std::collections::HashMap<Uuid, BuilderSession>;

fn get_session(sessions: &SessionMap, id: Uuid) -> Result<&BuilderSession, AppError> {
    sessions
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

fn get_session_mut(sessions: &mut SessionMap, id: Uuid) -> Result<&mut BuilderSession, AppError> {
    sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

fn session_response(session: &BuilderSession) -> SessionResponse {
    SessionResponse {
        session_id: session.id,
        document: session.document().clone(),
        active_step: session.active_step(),
        completion: session.completion(),
    }
}

fn build_generation_plan(
    session: &BuilderSession,
    request: &GenerateRequest,
) -> Result<(AssistantTicket, PromptContext), AppError> {
    let doc = session.document();
    match request.section {
        SectionKind::PersonalInfo => Ok((
            session.assistant_ticket(AssistantTarget::Summary),
            summary_context(doc),
        )),
        SectionKind::Experience => {
            let entry_id = request.entry_id.ok_or_else(|| {
                AppError::Validation("entryId is required for experience generation".to_string())
            })?;
            let entry = doc
                .experience
                .iter()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!("Experience entry {entry_id} not found"))
                })?;
            Ok((
                session.assistant_ticket(AssistantTarget::ExperienceAchievements { entry_id }),
                achievements_context(entry),
            ))
        }
        SectionKind::Projects => {
            let entry_id = request.entry_id.ok_or_else(|| {
                AppError::Validation("entryId is required for project generation".to_string())
            })?;
            let project = doc
                .projects
                .iter()
                .find(|p| p.id == entry_id)
                .ok_or_else(|| AppError::NotFound(format!("Project {entry_id} not found")))?;
            Ok((
                session.assistant_ticket(AssistantTarget::ProjectDescription { entry_id }),
                project_description_context(project),
            ))
        }
        other => Err(AppError::Validation(format!(
            "AI generation is not available for section '{}'",
            other.key()
        ))),
    }
}
