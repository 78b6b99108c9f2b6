//! Standings aggregation and ranking.
//!
//! Standings are always rebuilt from the full match list of a group. Scores can be
//! edited and matches reopened, so nothing is ever patched incrementally.

use super::{
    evaluator::evaluate,
    models::{GroupId, Match, Standing, TeamId, TournamentId},
};
use log::warn;
use std::collections::HashMap;

/// Competition points for a win
pub const POINTS_PER_WIN: u32 = 3;

/// Competition points for a draw
pub const POINTS_PER_DRAW: u32 = 1;

/// Fold every complete match of a group into per-team records
///
/// Records come back in the order of `teams`, with positions unset. Matches that
/// reference a team outside `teams` are logged and that team is left out; the
/// opponent still gets credit.
pub fn aggregate(
    tournament_id: TournamentId,
    group_id: GroupId,
    teams: &[TeamId],
    matches: &[Match],
) -> Vec<Standing> {
    let mut records: Vec<Standing> = teams
        .iter()
        .map(|&team_id| Standing::new(tournament_id, group_id, team_id))
        .collect();
    let index: HashMap<TeamId, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, &team_id)| (team_id, i))
        .collect();

    for m in matches {
        let outcome = evaluate(&m.sets);
        if !outcome.is_complete {
            continue;
        }

        let winner = outcome.winner_id(m.team1, m.team2);
        let sides = [
            (m.team1, outcome.team1_total, outcome.team2_total),
            (m.team2, outcome.team2_total, outcome.team1_total),
        ];

        for (team_id, scored, conceded) in sides {
            let Some(&i) = index.get(&team_id) else {
                warn!(
                    "Match {} in group {} references team {} which is not in the group; skipping",
                    m.id, group_id, team_id
                );
                continue;
            };

            let record = &mut records[i];
            record.played += 1;
            match winner {
                Some(w) if w == team_id => record.won += 1,
                Some(_) => record.lost += 1,
                None => record.drawn += 1,
            }
            record.points_for += scored;
            record.points_against += conceded;
        }
    }

    for record in &mut records {
        record.point_difference = record.points_for - record.points_against;
        record.points = POINTS_PER_WIN * record.won + POINTS_PER_DRAW * record.drawn;
    }

    records
}

/// Sort standings and assign 1-based positions
///
/// Ordering: competition points, then point difference, then points for, all
/// descending. Remaining ties keep their input order.
pub fn rank(mut standings: Vec<Standing>) -> Vec<Standing> {
    standings.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.point_difference.cmp(&a.point_difference))
            .then_with(|| b.points_for.cmp(&a.points_for))
    });

    for (i, standing) in standings.iter_mut().enumerate() {
        standing.position = i as u32 + 1;
    }

    standings
}

/// Aggregate then rank
pub fn compute_standings(
    tournament_id: TournamentId,
    group_id: GroupId,
    teams: &[TeamId],
    matches: &[Match],
) -> Vec<Standing> {
    rank(aggregate(tournament_id, group_id, teams, matches))
}
