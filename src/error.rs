//! Engine error types with HTTP status code mapping.
//!
//! [`EngineError`] is the central error type for the service. Every error
//! is local to the offending operation: operations validate before they
//! mutate, so a failed call never corrupts pool or ledger state. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::participant::ParticipantId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "participant already queued: alice",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`EngineError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 4000–4999 | Matching        | 409 Conflict                 |
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reference to a participant the pool (or pair) does not know.
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// Reference to a nonexistent pair session.
    #[error("unknown pair: {0}")]
    UnknownPair(uuid::Uuid),

    /// Join attempted while the participant is already queued or paired.
    #[error("participant already queued: {0}")]
    AlreadyQueued(ParticipantId),

    /// Operation attempted against a session or participant that is not
    /// in the required state.
    #[error("invalid transition: {operation}: {detail}")]
    InvalidTransition {
        /// The operation that was attempted.
        operation: &'static str,
        /// What the operation found instead of the required state.
        detail: String,
    },

    /// One or more participants have been queued beyond the configured
    /// round threshold without a match. Surfaced so the caller can widen
    /// the no-repeat lookback window; never auto-resolved.
    #[error("starvation detected for {} participant(s) at round {round}", starving.len())]
    StarvationDetected {
        /// Participants queued beyond the threshold.
        starving: Vec<ParticipantId>,
        /// The round at which starvation was detected.
        round: u64,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownParticipant(_) => 2001,
            Self::UnknownPair(_) => 2002,
            Self::AlreadyQueued(_) => 2101,
            Self::InvalidTransition { .. } => 2102,
            Self::StarvationDetected { .. } => 4001,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownParticipant(_) | Self::UnknownPair(_) => StatusCode::NOT_FOUND,
            Self::AlreadyQueued(_)
            | Self::InvalidTransition { .. }
            | Self::StarvationDetected { .. } => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::StarvationDetected { starving, .. } => {
                let ids: Vec<&str> = starving.iter().map(ParticipantId::as_str).collect();
                Some(ids.join(", "))
            }
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
