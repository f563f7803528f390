use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::super::error::ApiError;
use super::super::identity::CurrentUser;
use super::super::state::{AppState, CallSlot};
use crate::call::{CallConfig, PracticeCall, Turn};
use crate::error::PitchError;
use crate::feedback::FeedbackView;
use crate::store::{FeedbackId, SessionId, SessionStatus, SessionSummary, TemplateId, UserId};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub session_id: SessionId,
    pub call_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCallResponse {
    pub session_id: SessionId,
    pub turns_count: usize,
    /// None when the call produced no transcript to score
    pub feedback_id: Option<FeedbackId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFeedbackRequest {
    #[serde(default)]
    pub transcript: Vec<Turn>,
    /// Regenerate this feedback instead of creating a new one
    pub feedback_id: Option<FeedbackId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFeedbackResponse {
    pub session_id: SessionId,
    pub feedback_id: FeedbackId,
}

async fn owned_session(
    state: &AppState,
    session_id: SessionId,
    user_id: UserId,
) -> Result<SessionSummary, ApiError> {
    state
        .store
        .owned_session(session_id, user_id)
        .await?
        .ok_or_else(|| PitchError::not_found("session").into())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /practice/:template_id/start
/// Pay for and open a new practice session
pub async fn start_practice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(template_id): Path<TemplateId>,
) -> Result<impl IntoResponse, ApiError> {
    let started = state.lifecycle.start_session(user.id, template_id).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// GET /sessions
/// The user's most recent sessions
pub async fn recent_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.recent_sessions(user.id).await?))
}

/// POST /sessions/:id/call/start
/// Start the voice call for an open session
pub async fn start_call(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&state, session_id, user.id).await?;
    if session.status != SessionStatus::InProgress {
        return Err(ApiError::conflict("session is already completed"));
    }

    // Reserve the slot so a concurrent start for this session is refused
    // while the voice channel connects.
    {
        let mut calls = state.calls.write().await;
        match calls.entry(session_id) {
            Entry::Occupied(_) => {
                return Err(ApiError::conflict("a call is already running for this session"));
            }
            Entry::Vacant(slot) => {
                slot.insert(CallSlot::Starting);
            }
        }
    }

    let launched = launch_call(&state, &session).await;

    let mut calls = state.calls.write().await;
    let call = match launched {
        Ok(call) => call,
        Err(e) => {
            calls.remove(&session_id);
            return Err(e);
        }
    };

    let call_id = call.call_id().to_string();
    calls.insert(session_id, CallSlot::Running(Arc::new(call)));
    drop(calls);

    info!(session_id, call_id = %call_id, "Practice call running");

    Ok(Json(StartCallResponse {
        session_id,
        call_id,
        status: "active".to_string(),
    }))
}

async fn launch_call(state: &AppState, session: &SessionSummary) -> Result<PracticeCall, ApiError> {
    let template = state
        .store
        .template_by_id(session.template_id)
        .await?
        .ok_or_else(|| PitchError::not_found("template"))?;

    let call = PracticeCall::new(CallConfig::for_session(session.id, &state.voice))
        .await
        .map_err(|e| {
            error!(session_id = session.id, "Failed to create call: {:#}", e);
            ApiError::voice_unavailable()
        })?;

    if let Err(e) = call.start(&template.questions).await {
        error!(session_id = session.id, "Failed to start call: {:#}", e);
        return Err(ApiError::voice_unavailable());
    }

    Ok(call)
}

/// POST /sessions/:id/call/stop
/// Hang up and score the transcript
pub async fn stop_call(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    owned_session(&state, session_id, user.id).await?;

    let call = {
        let mut calls = state.calls.write().await;
        match calls.remove(&session_id) {
            Some(CallSlot::Running(call)) => call,
            Some(CallSlot::Starting) => {
                calls.insert(session_id, CallSlot::Starting);
                return Err(ApiError::conflict("the call is still starting"));
            }
            None => return Err(PitchError::not_found("call").into()),
        }
    };

    let turns = call.stop().await.map_err(|e| {
        error!(session_id, "Failed to stop call: {:#}", e);
        ApiError::internal()
    })?;

    if turns.is_empty() {
        warn!(session_id, "Call ended without a transcript, no feedback generated");
        return Ok(Json(StopCallResponse {
            session_id,
            turns_count: 0,
            feedback_id: None,
        }));
    }

    let turns_count = turns.len();
    let feedback_id = score_call_transcript(&state, session_id, user.id, turns).await?;

    Ok(Json(StopCallResponse {
        session_id,
        turns_count,
        feedback_id: Some(feedback_id),
    }))
}

/// Score a transcript collected by the server. When scoring or storage
/// fails the transcript is kept, and an empty `POST /sessions/:id/feedback`
/// retries with it.
async fn score_call_transcript(
    state: &AppState,
    session_id: SessionId,
    user_id: UserId,
    turns: Vec<Turn>,
) -> Result<FeedbackId, ApiError> {
    match state
        .generator
        .generate_feedback(session_id, user_id, &turns, None)
        .await
    {
        Ok(feedback_id) => Ok(feedback_id),
        Err(e) => {
            if matches!(
                e,
                PitchError::FeedbackGenerationFailed(_) | PitchError::PersistenceFailed(_)
            ) {
                warn!(
                    session_id,
                    turns = turns.len(),
                    "Transcript kept for a feedback retry"
                );
                state.unscored.write().await.insert(session_id, turns);
            }
            Err(e.into())
        }
    }
}

/// GET /sessions/:id/call/status
pub async fn call_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    owned_session(&state, session_id, user.id).await?;

    let calls = state.calls.read().await;
    match calls.get(&session_id) {
        Some(CallSlot::Running(call)) => Ok(Json(call.stats())),
        Some(CallSlot::Starting) => Err(ApiError::conflict("the call is still starting")),
        None => Err(PitchError::not_found("call").into()),
    }
}

/// POST /sessions/:id/feedback
/// Score a transcript collected by the client. An empty transcript retries
/// the kept transcript of a call whose scoring failed.
pub async fn generate_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
    Json(req): Json<GenerateFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_session(&state, session_id, user.id).await?;

    let feedback_id = if req.transcript.is_empty() {
        let kept = state.unscored.write().await.remove(&session_id);
        let turns = kept.ok_or_else(|| ApiError::bad_request("transcript must not be empty"))?;
        info!(session_id, turns = turns.len(), "Retrying feedback for a kept transcript");
        score_call_transcript(&state, session_id, user.id, turns).await?
    } else {
        let feedback_id = state
            .generator
            .generate_feedback(session_id, user.id, &req.transcript, req.feedback_id)
            .await?;
        state.unscored.write().await.remove(&session_id);
        feedback_id
    };

    let status = if req.feedback_id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(GenerateFeedbackResponse {
            session_id,
            feedback_id,
        }),
    ))
}

/// GET /sessions/:id/feedback
pub async fn get_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .store
        .feedback_for_session(session_id, user.id)
        .await?
        .ok_or_else(|| PitchError::not_found("feedback"))?;

    let view = FeedbackView::try_from(row).map_err(|e| {
        error!(session_id, "Stored feedback is unreadable: {}", e);
        ApiError::internal()
    })?;

    Ok(Json(view))
}

/// POST /sessions/:id/complete
/// Only sessions that already have feedback can be completed
pub async fn complete_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    owned_session(&state, session_id, user.id).await?;

    if state.store.feedback_count_for_session(session_id).await? == 0 {
        return Err(ApiError::conflict("session has no feedback yet"));
    }

    state.lifecycle.complete_session(session_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
