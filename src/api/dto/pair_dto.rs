//! Pair session DTOs for acknowledge, complete, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::pair::{PairId, PairSession, SessionState};
use crate::domain::participant::ParticipantId;

/// Request body for `POST /pairs/{id}/acknowledge`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcknowledgeRequest {
    /// The acknowledging participant.
    pub participant_id: String,
}

/// A pair session as exposed over the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct PairDto {
    /// Session identifier.
    #[schema(value_type = uuid::Uuid)]
    pub pair_id: PairId,
    /// Both members of the pair.
    #[schema(value_type = Vec<String>)]
    pub participants: [ParticipantId; 2],
    /// Round in which the pair was formed.
    pub round: u64,
    /// Current lifecycle state.
    #[schema(value_type = String)]
    pub state: SessionState,
    /// Members that have acknowledged the proposal so far.
    #[schema(value_type = Vec<String>)]
    pub acknowledged: Vec<ParticipantId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<PairSession> for PairDto {
    fn from(session: PairSession) -> Self {
        let mut acknowledged = Vec::with_capacity(2);
        if session.first_acked {
            acknowledged.push(session.first.clone());
        }
        if session.second_acked {
            acknowledged.push(session.second.clone());
        }
        Self {
            pair_id: session.pair_id,
            participants: session.participants(),
            round: session.round,
            state: session.state,
            acknowledged,
            created_at: session.created_at,
        }
    }
}

/// Response body for `GET /pairs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PairListResponse {
    /// Live (non-terminal) sessions in creation order.
    pub data: Vec<PairDto>,
    /// Total number of live sessions.
    pub total: usize,
}
