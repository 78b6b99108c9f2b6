//! Match result evaluation from set scores.

use super::models::{MAX_SETS, SetScore, TeamId};
use serde::{Deserialize, Serialize};

/// Sets a side must win to take a best-of-three match
pub const SETS_TO_WIN: u32 = 2;

/// Side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchSide {
    Team1,
    Team2,
}

/// Outcome derived from a match's set scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// A side has won two decisive sets
    pub is_complete: bool,
    /// Winning side, only present when complete
    pub winner: Option<MatchSide>,
    /// Points won by the first team over decisive sets
    pub team1_total: i64,
    /// Points won by the second team over decisive sets
    pub team2_total: i64,
}

impl MatchOutcome {
    /// Resolve the winning side to a team id
    pub fn winner_id(&self, team1: TeamId, team2: TeamId) -> Option<TeamId> {
        self.winner.map(|side| match side {
            MatchSide::Team1 => team1,
            MatchSide::Team2 => team2,
        })
    }

    /// Complete without a winner; unreachable under the two-set rule
    pub fn is_draw(&self) -> bool {
        self.is_complete && self.winner.is_none()
    }
}

/// Evaluate up to three set scores
///
/// `(0, 0)` sets are not played and are ignored entirely. Totals are reported
/// even for incomplete matches.
pub fn evaluate(sets: &[SetScore; MAX_SETS]) -> MatchOutcome {
    let mut team1_sets = 0;
    let mut team2_sets = 0;
    let mut team1_total = 0i64;
    let mut team2_total = 0i64;

    for set in sets.iter().filter(|s| s.is_decisive()) {
        team1_total += i64::from(set.team1);
        team2_total += i64::from(set.team2);

        if set.team1 > set.team2 {
            team1_sets += 1;
        } else if set.team2 > set.team1 {
            team2_sets += 1;
        }
    }

    let winner = if team1_sets >= SETS_TO_WIN && team1_sets > team2_sets {
        Some(MatchSide::Team1)
    } else if team2_sets >= SETS_TO_WIN && team2_sets > team1_sets {
        Some(MatchSide::Team2)
    } else {
        None
    };

    MatchOutcome {
        is_complete: winner.is_some(),
        winner,
        team1_total,
        team2_total,
    }
}
