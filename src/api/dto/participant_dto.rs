//! Participant DTOs for join, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::participant::{Participant, ParticipantId, ParticipantState};

/// Request body for `POST /participants`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// Opaque unique participant identifier.
    pub participant_id: String,
}

/// A participant as exposed over the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantDto {
    /// Participant identifier.
    #[schema(value_type = String)]
    pub participant_id: ParticipantId,
    /// Current availability state.
    #[schema(value_type = String)]
    pub state: ParticipantState,
    /// When the participant entered the queue.
    pub joined_at: DateTime<Utc>,
    /// Round counter value when the participant became queued.
    pub queued_at_round: u64,
}

impl From<Participant> for ParticipantDto {
    fn from(p: Participant) -> Self {
        Self {
            participant_id: p.id,
            state: p.state,
            joined_at: p.joined_at,
            queued_at_round: p.queued_at_round,
        }
    }
}

/// Response body for `GET /participants`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantListResponse {
    /// Tracked participants in queue order.
    pub data: Vec<ParticipantDto>,
    /// Total number of tracked participants.
    pub total: usize,
}
