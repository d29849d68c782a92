//! Round execution DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pair_dto::PairDto;
use crate::domain::participant::ParticipantId;
use crate::engine::RoundReport;

/// Request body for `POST /rounds`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RunRoundRequest {
    /// Replaces the configured no-repeat lookback for this round only.
    /// `0` disables the constraint; used to resolve reported starvation.
    #[serde(default)]
    pub lookback_override: Option<u64>,
}

/// Response body for `POST /rounds`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundResponse {
    /// The round that was executed.
    pub round: u64,
    /// Sessions proposed this round.
    pub pairs: Vec<PairDto>,
    /// Participants carried forward to the next round.
    #[schema(value_type = Vec<String>)]
    pub unmatched: Vec<ParticipantId>,
}

impl From<RoundReport> for RoundResponse {
    fn from(report: RoundReport) -> Self {
        Self {
            round: report.round,
            pairs: report.pairs.into_iter().map(PairDto::from).collect(),
            unmatched: report.unmatched,
        }
    }
}

/// Response body for `GET /rounds/current`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundStatusResponse {
    /// The most recently executed round.
    pub round: u64,
    /// Number of participants currently queued.
    pub queued: usize,
}
