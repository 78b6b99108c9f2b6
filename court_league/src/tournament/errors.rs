//! Tournament error types.

use super::models::{GroupId, MatchId, MatchStatus, TeamId, TournamentId};
use crate::db::timeouts::TimeoutError;
use std::time::Duration;
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Malformed input (bad identifier, too many players, foreign winner)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Fixtures exist already; use regeneration to replace them
    #[error("Fixtures already generated for group {0}")]
    FixturesAlreadyGenerated(GroupId),

    /// Both player slots are taken
    #[error("Team {0} already has two players")]
    TeamFull(TeamId),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TimeoutError> for TournamentError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => TournamentError::Timeout(duration),
            TimeoutError::Database(e) => TournamentError::Database(e),
        }
    }
}

impl TournamentError {
    /// Whether the error refers to a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TournamentError::TournamentNotFound(_)
                | TournamentError::GroupNotFound(_)
                | TournamentError::TeamNotFound(_)
                | TournamentError::MatchNotFound(_)
        )
    }

    /// Whether the request clashes with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            TournamentError::FixturesAlreadyGenerated(_)
                | TournamentError::TeamFull(_)
                | TournamentError::InvalidTransition { .. }
        )
    }

    /// Get a client-safe error message
    ///
    /// Storage errors are reduced to a generic message so SQL details never reach callers.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_)
            | TournamentError::Serialization(_)
            | TournamentError::Timeout(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

/// Reject non-positive identifiers
pub(crate) fn validate_id(kind: &str, id: i64) -> TournamentResult<()> {
    if id <= 0 {
        return Err(TournamentError::Validation(format!(
            "malformed {kind} id: {id}"
        )));
    }
    Ok(())
}
