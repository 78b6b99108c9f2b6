//! Tournament data models for round-robin group play.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = i64;

/// Group ID type
pub type GroupId = i64;

/// Team ID type
pub type TeamId = i64;

/// Match ID type
pub type MatchId = i64;

/// Player ID type
pub type PlayerId = i64;

/// Number of set-score slots carried by every match
pub const MAX_SETS: usize = 3;

/// Upper bound on the games (or points) one side can record in a set
pub const MAX_SET_GAMES: u32 = 999;

/// Round-robin format configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRobinConfig {
    /// Number of groups the field is split into
    pub group_count: u32,
    /// Target number of teams per group
    pub teams_per_group: u32,
    /// Maximum number of sets per match (best of N)
    pub sets_per_match: u32,
}

impl Default for RoundRobinConfig {
    fn default() -> Self {
        Self {
            group_count: 1,
            teams_per_group: 4,
            sets_per_match: MAX_SETS as u32,
        }
    }
}

/// Americano format configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmericanoConfig {
    /// Points played in every match
    pub points_per_match: u32,
    /// Courts available per round
    pub courts: u32,
}

impl Default for AmericanoConfig {
    fn default() -> Self {
        Self {
            points_per_match: 32,
            courts: 2,
        }
    }
}

/// Tournament format with its format-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Teams play every other team of their group once
    RoundRobin(RoundRobinConfig),
    /// Rotating-partner format, points based
    Americano(AmericanoConfig),
}

impl TournamentFormat {
    /// Stable name of the format kind, as stored in the database
    pub fn kind(&self) -> &'static str {
        match self {
            TournamentFormat::RoundRobin(_) => "round_robin",
            TournamentFormat::Americano(_) => "americano",
        }
    }
}

impl Default for TournamentFormat {
    fn default() -> Self {
        TournamentFormat::RoundRobin(RoundRobinConfig::default())
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    /// Tournament ID
    pub id: TournamentId,
    /// Tournament name
    pub name: String,
    /// Format and format-specific configuration
    pub format: TournamentFormat,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

/// A pool of teams playing a self-contained round robin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: GroupId,
    /// Owning tournament
    pub tournament_id: TournamentId,
    /// Display name ("Group A")
    pub name: String,
    /// Venue copied onto generated fixtures
    pub venue: Option<String>,
}

/// Reference to a player along with the rating used for the team aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Player ID
    pub id: PlayerId,
    /// Player rating at registration time
    pub rating: i32,
}

/// Team of up to two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team ID
    pub id: TeamId,
    /// Owning tournament
    pub tournament_id: TournamentId,
    /// Group the team plays in
    pub group_id: GroupId,
    /// First player slot
    pub player1: Option<PlayerId>,
    /// Second player slot
    pub player2: Option<PlayerId>,
    /// Sum of player ratings at creation; never recalculated
    pub rating: i32,
}

impl Team {
    /// Whether both player slots are taken
    pub fn is_full(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }
}

/// Unsaved team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub tournament_id: TournamentId,
    pub group_id: GroupId,
    pub player1: Option<PlayerId>,
    pub player2: Option<PlayerId>,
    pub rating: i32,
}

/// Score of a single set
///
/// `(0, 0)` means the set has not been played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetScore {
    /// Games won by the first team
    pub team1: u32,
    /// Games won by the second team
    pub team2: u32,
}

impl SetScore {
    /// Sentinel for a set that has not been played yet
    pub const NOT_PLAYED: SetScore = SetScore { team1: 0, team2: 0 };

    pub const fn new(team1: u32, team2: u32) -> Self {
        Self { team1, team2 }
    }

    /// Whether this set was actually contested
    pub fn is_decisive(&self) -> bool {
        *self != Self::NOT_PLAYED
    }

    /// Whether both sides stay within `MAX_SET_GAMES`
    pub fn is_within_bounds(&self) -> bool {
        self.team1 <= MAX_SET_GAMES && self.team2 <= MAX_SET_GAMES
    }
}

impl From<(u32, u32)> for SetScore {
    fn from((team1, team2): (u32, u32)) -> Self {
        Self::new(team1, team2)
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Whether a caller may move a match from `self` to `next`
    ///
    /// Completed matches may be reopened for score corrections. Any status other
    /// than Cancelled may move to Cancelled, and Cancelled is terminal.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        use MatchStatus::*;

        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (Scheduled, InProgress)
                | (InProgress, Completed)
                | (Completed, InProgress)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
                | (Completed, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(MatchStatus::Scheduled),
            "in_progress" => Some(MatchStatus::InProgress),
            "completed" => Some(MatchStatus::Completed),
            "cancelled" => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }
}

/// Phase of the competition a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Group,
    Knockout,
}

impl MatchPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchPhase::Group => "group",
            MatchPhase::Knockout => "knockout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "group" => Some(MatchPhase::Group),
            "knockout" => Some(MatchPhase::Knockout),
            _ => None,
        }
    }
}

/// Persisted match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match ID
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub group_id: GroupId,
    /// Round number (1-indexed)
    pub round: u32,
    pub phase: MatchPhase,
    pub team1: TeamId,
    pub team2: TeamId,
    /// Set scores, unplayed sets hold `SetScore::NOT_PLAYED`
    pub sets: [SetScore; MAX_SETS],
    pub winner: Option<TeamId>,
    pub status: MatchStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
}

impl Match {
    /// Whether `team_id` plays in this match
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team1 == team_id || self.team2 == team_id
    }
}

/// Unsaved match, as produced by fixture generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub tournament_id: TournamentId,
    pub group_id: GroupId,
    pub round: u32,
    pub phase: MatchPhase,
    pub team1: TeamId,
    pub team2: TeamId,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
}

/// Score entry for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultUpdate {
    /// Up to three set scores; missing sets are `(0, 0)`
    pub sets: [SetScore; MAX_SETS],
    /// Status requested by the caller
    pub status: MatchStatus,
    /// Explicit winner; derived from the sets when absent
    pub winner: Option<TeamId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
}

impl MatchResultUpdate {
    /// Build an update from the played sets, leaving the rest unplayed
    pub fn from_sets(played: &[(u32, u32)], status: MatchStatus) -> Self {
        let mut sets = [SetScore::NOT_PLAYED; MAX_SETS];
        for (slot, score) in sets.iter_mut().zip(played) {
            *slot = SetScore::from(*score);
        }

        Self {
            sets,
            status,
            winner: None,
            scheduled_at: None,
            venue: None,
        }
    }
}

/// Aggregated record of one team within one group
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Standing {
    pub tournament_id: TournamentId,
    pub group_id: GroupId,
    pub team_id: TeamId,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub drawn: u32,
    pub points_for: i64,
    pub points_against: i64,
    pub point_difference: i64,
    /// Competition points
    pub points: u32,
    /// 1-based rank, 0 until ranked
    pub position: u32,
}

impl Standing {
    /// Zeroed record for a team
    pub fn new(tournament_id: TournamentId, group_id: GroupId, team_id: TeamId) -> Self {
        Self {
            tournament_id,
            group_id,
            team_id,
            ..Self::default()
        }
    }
}
