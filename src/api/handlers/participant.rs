//! Participant handlers: join, leave, get, list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{JoinRequest, ParticipantDto, ParticipantListResponse};
use crate::app_state::AppState;
use crate::domain::participant::ParticipantId;
use crate::error::{EngineError, ErrorResponse};

/// `POST /participants` — Join the pairing queue.
///
/// # Errors
///
/// Returns [`EngineError::AlreadyQueued`] if the participant is already
/// queued or paired, or [`EngineError::InvalidRequest`] for an empty id.
#[utoipa::path(
    post,
    path = "/api/v1/participants",
    tag = "Participants",
    summary = "Join the pairing queue",
    description = "Adds the participant to the queue for the next matching round. Re-queues an idle participant; rejects one already queued or paired.",
    request_body = JoinRequest,
    responses(
        (status = 201, description = "Participant queued", body = ParticipantDto),
        (status = 400, description = "Invalid participant id", body = ErrorResponse),
        (status = 409, description = "Already queued or paired", body = ErrorResponse),
    )
)]
pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, EngineError> {
    if req.participant_id.trim().is_empty() {
        return Err(EngineError::InvalidRequest(
            "participant_id must not be empty".to_string(),
        ));
    }
    let participant = state
        .engine
        .join(ParticipantId::new(req.participant_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ParticipantDto::from(participant))))
}

/// `DELETE /participants/{id}` — Leave the pool.
///
/// Unknown ids are a no-op; the response is 204 either way. Leaving
/// cancels any pending pair immediately (it expires without a history
/// record).
#[utoipa::path(
    delete,
    path = "/api/v1/participants/{id}",
    tag = "Participants",
    summary = "Leave the pool",
    description = "Removes the participant regardless of state, cascading any pending pair into Expired.",
    params(("id" = String, Path, description = "Participant identifier")),
    responses(
        (status = 204, description = "Participant removed (or was never tracked)"),
    )
)]
pub async fn leave(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    state.engine.leave(&ParticipantId::new(id)).await;
    StatusCode::NO_CONTENT
}

/// `GET /participants/{id}` — Get a participant's state.
///
/// # Errors
///
/// Returns [`EngineError::UnknownParticipant`] if the id is not tracked.
#[utoipa::path(
    get,
    path = "/api/v1/participants/{id}",
    tag = "Participants",
    summary = "Get participant state",
    params(("id" = String, Path, description = "Participant identifier")),
    responses(
        (status = 200, description = "Participant state", body = ParticipantDto),
        (status = 404, description = "Unknown participant", body = ErrorResponse),
    )
)]
pub async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let participant = state.engine.participant(&ParticipantId::new(id)).await?;
    Ok(Json(ParticipantDto::from(participant)))
}

/// `GET /participants` — List all tracked participants.
#[utoipa::path(
    get,
    path = "/api/v1/participants",
    tag = "Participants",
    summary = "List participants",
    description = "Returns every tracked participant in queue order.",
    responses(
        (status = 200, description = "Participant list", body = ParticipantListResponse),
    )
)]
pub async fn list_participants(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<ParticipantDto> = state
        .engine
        .participants()
        .await
        .into_iter()
        .map(ParticipantDto::from)
        .collect();
    let total = data.len();
    Json(ParticipantListResponse { data, total })
}

/// Participant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/participants", post(join).get(list_participants))
        .route("/participants/{id}", get(get_participant).delete(leave))
}
