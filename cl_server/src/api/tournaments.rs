//! Tournament API handlers.
//!
//! Setup (tournaments, groups, teams), fixture generation, score entry and
//! standings. Domain errors map onto HTTP status codes in [`error_response`].
//!
//! # Examples
//!
//! Generate fixtures for a group:
//! ```bash
//! curl -X POST http://localhost:7878/api/v1/groups/2/fixtures
//! ```
//!
//! Record a result:
//! ```bash
//! curl -X PUT http://localhost:7878/api/v1/matches/9/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"sets": [{"team1": 6, "team2": 2}, {"team1": 6, "team2": 3}], "status": "in_progress"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use court_league::tournament::{
    Group, GroupId, Match, MatchId, MatchResultUpdate, MatchStatus, PlayerRef, SetScore, Standing,
    Team, TeamId, Tournament, TournamentError, TournamentFormat, TournamentId,
    models::MAX_SETS,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::AppState;
use crate::logging::{log_api_error, log_performance};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    #[serde(default)]
    pub format: TournamentFormat,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub venue: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterTeamRequest {
    #[serde(default)]
    pub players: Vec<PlayerRef>,
}

/// Body of `PUT /matches/{id}/result`
///
/// `sets` lists the played sets in order; absent sets count as not played.
#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    #[serde(default)]
    pub sets: Vec<SetScore>,
    pub status: MatchStatus,
    pub winner: Option<TeamId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
}

impl TryFrom<RecordResultRequest> for MatchResultUpdate {
    type Error = TournamentError;

    fn try_from(request: RecordResultRequest) -> Result<Self, Self::Error> {
        if request.sets.len() > MAX_SETS {
            return Err(TournamentError::Validation(format!(
                "at most {MAX_SETS} sets, got {}",
                request.sets.len()
            )));
        }

        let mut sets = [SetScore::NOT_PLAYED; MAX_SETS];
        sets[..request.sets.len()].copy_from_slice(&request.sets);

        Ok(MatchResultUpdate {
            sets,
            status: request.status,
            winner: request.winner,
            scheduled_at: request.scheduled_at,
            venue: request.venue,
        })
    }
}

/// Map a domain error onto a status code and client-safe body
///
/// - Validation: `400 Bad Request`
/// - Missing entity: `404 Not Found`
/// - Conflict or forbidden status change: `409 Conflict`
/// - Storage failures: `500 Internal Server Error`, details only in the log
pub fn error_response(operation: &str, err: TournamentError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        TournamentError::Validation(_) => StatusCode::BAD_REQUEST,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        e if e.is_conflict() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    log_api_error(operation, status.as_u16(), &err.to_string());

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Create a tournament.
///
/// # Response
///
/// Returns `201 Created` with the stored tournament.
///
/// # Errors
///
/// - `400 Bad Request`: Empty name
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<Tournament>)> {
    state
        .tournament_manager
        .create_tournament(&request.name, request.format)
        .await
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(|e| error_response("create_tournament", e))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    state
        .tournament_manager
        .get_tournament(tournament_id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_tournament", e))
}

/// Create a group inside a tournament.
///
/// The optional `venue` is copied onto every fixture of the group.
pub async fn create_group(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    state
        .tournament_manager
        .create_group(tournament_id, &request.name, request.venue.as_deref())
        .await
        .map(|g| (StatusCode::CREATED, Json(g)))
        .map_err(|e| error_response("create_group", e))
}

/// Register a team of up to two players.
///
/// # Errors
///
/// - `400 Bad Request`: More than two players, duplicate or malformed player ids
/// - `404 Not Found`: Unknown tournament or group
pub async fn register_team(
    State(state): State<AppState>,
    Path((tournament_id, group_id)): Path<(TournamentId, GroupId)>,
    Json(request): Json<RegisterTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    state
        .tournament_manager
        .register_team(tournament_id, group_id, &request.players)
        .await
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(|e| error_response("register_team", e))
}

/// Add a player to the first free slot of a team.
///
/// # Errors
///
/// - `404 Not Found`: Unknown team
/// - `409 Conflict`: Team already has two players
pub async fn assign_player(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
    Json(player): Json<PlayerRef>,
) -> ApiResult<Json<Team>> {
    state
        .tournament_manager
        .assign_player(team_id, player)
        .await
        .map(Json)
        .map_err(|e| error_response("assign_player", e))
}

/// Generate the round-robin fixtures of a group.
///
/// # Response
///
/// Returns `201 Created` with the new matches; an empty list when the group
/// has fewer than two teams.
///
/// # Errors
///
/// - `404 Not Found`: Unknown group
/// - `409 Conflict`: Fixtures exist already (use `PUT` to regenerate)
pub async fn generate_fixtures(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<(StatusCode, Json<Vec<Match>>)> {
    let start = Instant::now();
    let matches = state
        .tournament_manager
        .generate_fixtures(group_id)
        .await
        .map_err(|e| error_response("generate_fixtures", e))?;

    log_performance(
        "generate_fixtures",
        start.elapsed().as_millis() as u64,
        Some(&format!("group {group_id}")),
    );
    Ok((StatusCode::CREATED, Json(matches)))
}

/// Discard every match of a group and generate a fresh fixture set.
pub async fn regenerate_fixtures(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<Match>>> {
    state
        .tournament_manager
        .regenerate_fixtures(group_id)
        .await
        .map(Json)
        .map_err(|e| error_response("regenerate_fixtures", e))
}

pub async fn list_matches(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> ApiResult<Json<Vec<Match>>> {
    state
        .tournament_manager
        .list_matches(group_id)
        .await
        .map(Json)
        .map_err(|e| error_response("list_matches", e))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<Match>> {
    state
        .tournament_manager
        .get_match(match_id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_match", e))
}

/// Record set scores and status for a match.
///
/// Standings of the match's group are recomputed before the response is sent.
///
/// # Errors
///
/// - `400 Bad Request`: More than three sets, or a winner not in the match
/// - `404 Not Found`: Unknown match
/// - `409 Conflict`: Status change not allowed (e.g. leaving `cancelled`)
pub async fn record_match_result(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(request): Json<RecordResultRequest>,
) -> ApiResult<Json<Match>> {
    let update =
        MatchResultUpdate::try_from(request).map_err(|e| error_response("record_match_result", e))?;

    let start = Instant::now();
    let recorded = state
        .tournament_manager
        .record_match_result(match_id, update)
        .await
        .map_err(|e| error_response("record_match_result", e))?;

    log_performance(
        "record_match_result",
        start.elapsed().as_millis() as u64,
        Some(&format!("match {match_id}")),
    );
    Ok(Json(recorded))
}

/// Ranked standings of a group.
///
/// # Response
///
/// ```json
/// [
///   {
///     "tournament_id": 1, "group_id": 2, "team_id": 3,
///     "played": 1, "won": 1, "lost": 0, "drawn": 0,
///     "points_for": 12, "points_against": 5, "point_difference": 7,
///     "points": 3, "position": 1
///   }
/// ]
/// ```
pub async fn get_standings(
    State(state): State<AppState>,
    Path((tournament_id, group_id)): Path<(TournamentId, GroupId)>,
) -> ApiResult<Json<Vec<Standing>>> {
    state
        .tournament_manager
        .get_standings(tournament_id, group_id)
        .await
        .map(Json)
        .map_err(|e| error_response("get_standings", e))
}

/// Force a full standings rebuild for a group.
pub async fn recompute_standings(
    State(state): State<AppState>,
    Path((tournament_id, group_id)): Path<(TournamentId, GroupId)>,
) -> ApiResult<Json<Vec<Standing>>> {
    state
        .tournament_manager
        .recompute_standings(tournament_id, group_id)
        .await
        .map(Json)
        .map_err(|e| error_response("recompute_standings", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(sets: Vec<SetScore>) -> RecordResultRequest {
        RecordResultRequest {
            sets,
            status: MatchStatus::InProgress,
            winner: None,
            scheduled_at: None,
            venue: None,
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TournamentError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (TournamentError::MatchNotFound(4), StatusCode::NOT_FOUND),
            (TournamentError::FixturesAlreadyGenerated(2), StatusCode::CONFLICT),
            (
                TournamentError::InvalidTransition {
                    from: MatchStatus::Cancelled,
                    to: MatchStatus::Scheduled,
                },
                StatusCode::CONFLICT,
            ),
            (
                TournamentError::Timeout(Duration::from_secs(5)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(error_response("test", err).0, expected);
        }
    }

    #[test]
    fn test_infrastructure_errors_are_sanitised() {
        let cause = serde_json::from_str::<Standing>("{").unwrap_err();
        let (status, Json(body)) = error_response("test", TournamentError::Serialization(cause));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }

    #[test]
    fn test_missing_sets_are_not_played() {
        let update = MatchResultUpdate::try_from(request(vec![SetScore::new(6, 4)])).unwrap();
        assert_eq!(update.sets[0], SetScore::new(6, 4));
        assert_eq!(update.sets[1], SetScore::NOT_PLAYED);
        assert_eq!(update.sets[2], SetScore::NOT_PLAYED);
    }

    #[test]
    fn test_four_sets_rejected() {
        let result = MatchResultUpdate::try_from(request(vec![SetScore::new(6, 4); 4]));
        assert!(matches!(result, Err(TournamentError::Validation(_))));
    }
}
