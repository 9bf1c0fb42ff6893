use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::SessionRecord;
use crate::interview::session::{InterviewSession, InterviewState, Reply, SessionSnapshot};
use crate::state::AppState;

/// Longest accepted candidate message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
    pub reply: Reply,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), AppError> {
    let (session_id, session) = state.sessions.create().await;
    let reply = session.lock().await.start().await;

    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse { session_id, reply }),
    ))
}

/// POST /api/v1/sessions/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Reply>, AppError> {
    if req.text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;

    let mut session = session.lock().await;
    let reply = session.handle_input(&req.text).await;
    Ok(Json(finish_if_concluding(&mut session, reply).await))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;

    let snapshot = session.lock().await.snapshot();
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
        Err(AppError::NotFound(format!("session {id}")))
    }
}

/// GET /api/v1/records
pub async fn handle_list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionRecord>>, AppError> {
    let records = state.services.store.list().await?;
    Ok(Json(records))
}

/// Runs the conclusion step in the same request, so the candidate gets the
/// closing message and the decision summary together.
async fn finish_if_concluding(session: &mut InterviewSession, reply: Reply) -> Reply {
    if reply.state != InterviewState::Conclusion {
        return reply;
    }

    let closing = session.conclude().await;
    let mut warnings = reply.warnings;
    for warning in closing.warnings {
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    Reply {
        message: format!("{}\n\n{}", reply.message, closing.message),
        state: closing.state,
        accepted: reply.accepted,
        warnings,
    }
}
