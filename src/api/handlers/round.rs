//! Round handlers: manual execution and current status.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{RoundResponse, RoundStatusResponse, RunRoundRequest};
use crate::app_state::AppState;
use crate::error::{EngineError, ErrorResponse};

/// `POST /rounds` — Run a matching round now.
///
/// An optional `lookback_override` replaces the configured no-repeat
/// window for this round only. Passing `0` disables the constraint,
/// which is the documented remedy for a starvation report.
///
/// # Errors
///
/// Returns [`EngineError::StarvationDetected`] when queued participants
/// have exceeded the starvation threshold and no override was given.
/// The pool is left untouched in that case.
#[utoipa::path(
    post,
    path = "/api/v1/rounds",
    tag = "Rounds",
    summary = "Run a matching round",
    request_body = RunRoundRequest,
    responses(
        (status = 200, description = "Round executed", body = RoundResponse),
        (status = 409, description = "Starvation detected, retry with a lookback override", body = ErrorResponse),
    )
)]
pub async fn run_round(
    State(state): State<AppState>,
    Json(req): Json<RunRoundRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let report = state.engine.run_round(req.lookback_override).await?;
    Ok(Json(RoundResponse::from(report)))
}

/// `GET /rounds/current` — Current round counter and queue depth.
#[utoipa::path(
    get,
    path = "/api/v1/rounds/current",
    tag = "Rounds",
    summary = "Get round status",
    responses(
        (status = 200, description = "Round status", body = RoundStatusResponse),
    )
)]
pub async fn round_status(State(state): State<AppState>) -> impl IntoResponse {
    let round = state.engine.current_round().await;
    let queued = state.engine.queued_count().await;
    Json(RoundStatusResponse { round, queued })
}

/// Round routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rounds", post(run_round))
        .route("/rounds/current", get(round_status))
}
