//! Round-robin fixture generation using the circle method.
//!
//! The first slot stays fixed while the others rotate one position per round.
//! An odd field gets a phantom bye slot appended; whoever meets the bye sits out
//! that round and no match is produced for the pairing.

use super::models::TeamId;
use serde::{Deserialize, Serialize};

/// One generated pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    /// Round number (1-indexed)
    pub round: u32,
    pub team1: TeamId,
    pub team2: TeamId,
}

/// Immutable description of one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Round number (1-indexed)
    pub number: u32,
    /// Real matches of the round
    pub pairings: Vec<(TeamId, TeamId)>,
    /// Team paired with the bye, odd fields only
    pub bye: Option<TeamId>,
}

impl Round {
    /// Fixtures of this round
    pub fn fixtures(&self) -> impl Iterator<Item = Fixture> + '_ {
        self.pairings.iter().map(|&(team1, team2)| Fixture {
            round: self.number,
            team1,
            team2,
        })
    }
}

/// Number of rounds needed for `team_count` teams
///
/// `n - 1` for an even field, `n` for an odd one, zero below two teams.
pub fn round_count(team_count: usize) -> usize {
    match team_count {
        0 | 1 => 0,
        n if n % 2 == 0 => n - 1,
        n => n,
    }
}

/// Compute the pairings of round `round_index` (0-indexed)
///
/// Pure function of the team order and the index: the same inputs always
/// produce the same round. Returns an empty round for fewer than two teams
/// or an index past the last round.
pub fn round_pairings(teams: &[TeamId], round_index: usize) -> Round {
    let number = round_index as u32 + 1;

    if round_index >= round_count(teams.len()) {
        return Round {
            number,
            pairings: Vec::new(),
            bye: None,
        };
    }

    let mut slots: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let size = slots.len();
    let rotating = size - 1;

    // Slot 0 is fixed; slot k > 0 holds the rotating entry advanced by the round index.
    let slot_at = |position: usize| -> Option<TeamId> {
        if position == 0 {
            slots[0]
        } else {
            slots[1 + (position - 1 + round_index) % rotating]
        }
    };

    let mut pairings = Vec::with_capacity(size / 2);
    let mut bye = None;

    for i in 0..size / 2 {
        match (slot_at(i), slot_at(size - 1 - i)) {
            (Some(a), Some(b)) => pairings.push((a, b)),
            (Some(idle), None) | (None, Some(idle)) => bye = Some(idle),
            (None, None) => {}
        }
    }

    Round {
        number,
        pairings,
        bye,
    }
}

/// Every round of the schedule, in order
pub fn rounds(teams: &[TeamId]) -> Vec<Round> {
    (0..round_count(teams.len()))
        .map(|index| round_pairings(teams, index))
        .collect()
}

/// Generate the full round-robin fixture list for a group
///
/// Every unordered pair of teams meets exactly once. Fewer than two teams
/// yields an empty list.
pub fn generate_fixtures(teams: &[TeamId]) -> Vec<Fixture> {
    rounds(teams)
        .iter()
        .flat_map(|round| round.fixtures().collect::<Vec<_>>())
        .collect()
}
