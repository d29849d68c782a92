//! Pair session handlers: acknowledge, complete, get, list.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{AcknowledgeRequest, PairDto, PairListResponse};
use crate::app_state::AppState;
use crate::domain::pair::PairId;
use crate::domain::participant::ParticipantId;
use crate::error::{EngineError, ErrorResponse};

/// `POST /pairs/{id}/acknowledge` — Accept a proposed session.
///
/// Once both members have acknowledged, the session becomes active and
/// its acceptance deadline is replaced by the session duration timer.
///
/// # Errors
///
/// Returns [`EngineError::UnknownPair`] for unknown or finished
/// sessions, [`EngineError::UnknownParticipant`] if the acknowledger is
/// not a member, and [`EngineError::InvalidTransition`] if the session
/// is no longer in its proposal window.
#[utoipa::path(
    post,
    path = "/api/v1/pairs/{id}/acknowledge",
    tag = "Pairs",
    summary = "Acknowledge a proposed session",
    params(("id" = uuid::Uuid, Path, description = "Pair session identifier")),
    request_body = AcknowledgeRequest,
    responses(
        (status = 200, description = "Acknowledgement recorded", body = PairDto),
        (status = 404, description = "Unknown pair or non-member participant", body = ErrorResponse),
        (status = 409, description = "Session is not awaiting acknowledgement", body = ErrorResponse),
    )
)]
pub async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AcknowledgeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let session = state
        .engine
        .acknowledge(PairId::from_uuid(id), &ParticipantId::new(req.participant_id))
        .await?;
    Ok(Json(PairDto::from(session)))
}

/// `POST /pairs/{id}/complete` — Finish an active session.
///
/// Records the pairing in the history ledger and returns both members
/// to the idle state.
///
/// # Errors
///
/// Returns [`EngineError::UnknownPair`] for unknown or finished
/// sessions, and [`EngineError::InvalidTransition`] if the session was
/// never activated.
#[utoipa::path(
    post,
    path = "/api/v1/pairs/{id}/complete",
    tag = "Pairs",
    summary = "Complete an active session",
    params(("id" = uuid::Uuid, Path, description = "Pair session identifier")),
    responses(
        (status = 200, description = "Session completed", body = PairDto),
        (status = 404, description = "Unknown pair", body = ErrorResponse),
        (status = 409, description = "Session is not active", body = ErrorResponse),
    )
)]
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, EngineError> {
    let session = state.engine.complete(PairId::from_uuid(id)).await?;
    Ok(Json(PairDto::from(session)))
}

/// `GET /pairs/{id}` — Get a live session.
///
/// Finished sessions are dropped from the live table; their outcomes
/// are observable through lifecycle events.
///
/// # Errors
///
/// Returns [`EngineError::UnknownPair`] if the session is not live.
#[utoipa::path(
    get,
    path = "/api/v1/pairs/{id}",
    tag = "Pairs",
    summary = "Get a live session",
    params(("id" = uuid::Uuid, Path, description = "Pair session identifier")),
    responses(
        (status = 200, description = "Session", body = PairDto),
        (status = 404, description = "Unknown pair", body = ErrorResponse),
    )
)]
pub async fn get_pair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, EngineError> {
    let session = state.engine.session(PairId::from_uuid(id)).await?;
    Ok(Json(PairDto::from(session)))
}

/// `GET /pairs` — List live sessions.
#[utoipa::path(
    get,
    path = "/api/v1/pairs",
    tag = "Pairs",
    summary = "List live sessions",
    responses(
        (status = 200, description = "Live sessions", body = PairListResponse),
    )
)]
pub async fn list_pairs(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<PairDto> = state
        .engine
        .sessions()
        .await
        .into_iter()
        .map(PairDto::from)
        .collect();
    let total = data.len();
    Json(PairListResponse { data, total })
}

/// Pair session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pairs", get(list_pairs))
        .route("/pairs/{id}", get(get_pair))
        .route("/pairs/{id}/acknowledge", post(acknowledge))
        .route("/pairs/{id}/complete", post(complete))
}
