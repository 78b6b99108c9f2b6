//! In-memory implementation of the repository traits.
//!
//! Used by the test suites and by the server when no database is configured.
//! Data lives for as long as the repository does.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::repository::{
    MatchRepository, StandingRepository, TeamRepository, TournamentRepository,
};
use crate::tournament::{
    TournamentResult,
    models::{
        Group, GroupId, MAX_SETS, Match, MatchId, MatchStatus, NewMatch, NewTeam, SetScore,
        Standing, Team, TeamId, Tournament, TournamentFormat, TournamentId,
    },
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    tournaments: BTreeMap<TournamentId, Tournament>,
    groups: BTreeMap<GroupId, Group>,
    teams: BTreeMap<TeamId, Team>,
    matches: BTreeMap<MatchId, Match>,
    standings: BTreeMap<(TournamentId, GroupId, TeamId), Standing>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_matches(&mut self, matches: &[NewMatch]) -> Vec<Match> {
        matches
            .iter()
            .map(|m| {
                let created = Match {
                    id: self.allocate_id(),
                    tournament_id: m.tournament_id,
                    group_id: m.group_id,
                    round: m.round,
                    phase: m.phase,
                    team1: m.team1,
                    team2: m.team2,
                    sets: [SetScore::NOT_PLAYED; MAX_SETS],
                    winner: None,
                    status: MatchStatus::Scheduled,
                    scheduled_at: m.scheduled_at,
                    venue: m.venue.clone(),
                };
                self.matches.insert(created.id, created.clone());
                created
            })
            .collect()
    }
}

/// Repository backed by process memory
///
/// IDs are allocated from a single counter shared by every entity kind, so
/// the same value never identifies two records.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a match record as-is, bypassing fixture generation
    pub fn insert_match(&self, m: Match) {
        self.tables().matches.insert(m.id, m);
    }
}

#[async_trait]
impl TournamentRepository for InMemoryRepository {
    async fn create_tournament(
        &self,
        name: &str,
        format: &TournamentFormat,
    ) -> TournamentResult<Tournament> {
        let mut tables = self.tables();
        let tournament = Tournament {
            id: tables.allocate_id(),
            name: name.to_string(),
            format: format.clone(),
            created_at: Utc::now(),
        };
        tables.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.tables().tournaments.get(&id).cloned())
    }

    async fn create_group(
        &self,
        tournament_id: TournamentId,
        name: &str,
        venue: Option<&str>,
    ) -> TournamentResult<Group> {
        let mut tables = self.tables();
        let group = Group {
            id: tables.allocate_id(),
            tournament_id,
            name: name.to_string(),
            venue: venue.map(str::to_string),
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_group(&self, id: GroupId) -> TournamentResult<Option<Group>> {
        Ok(self.tables().groups.get(&id).cloned())
    }
}

#[async_trait]
impl TeamRepository for InMemoryRepository {
    async fn create_team(&self, team: &NewTeam) -> TournamentResult<Team> {
        let mut tables = self.tables();
        let created = Team {
            id: tables.allocate_id(),
            tournament_id: team.tournament_id,
            group_id: team.group_id,
            player1: team.player1,
            player2: team.player2,
            rating: team.rating,
        };
        tables.teams.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_team(&self, id: TeamId) -> TournamentResult<Option<Team>> {
        Ok(self.tables().teams.get(&id).cloned())
    }

    async fn list_group_teams(&self, group_id: GroupId) -> TournamentResult<Vec<Team>> {
        Ok(self
            .tables()
            .teams
            .values()
            .filter(|t| t.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn update_team_players(&self, team: &Team) -> TournamentResult<()> {
        if let Some(stored) = self.tables().teams.get_mut(&team.id) {
            stored.player1 = team.player1;
            stored.player2 = team.player2;
        }
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for InMemoryRepository {
    async fn create_matches(&self, matches: &[NewMatch]) -> TournamentResult<Vec<Match>> {
        Ok(self.tables().insert_matches(matches))
    }

    async fn replace_group_matches(
        &self,
        group_id: GroupId,
        matches: &[NewMatch],
    ) -> TournamentResult<Vec<Match>> {
        let mut tables = self.tables();
        tables.matches.retain(|_, m| m.group_id != group_id);
        Ok(tables.insert_matches(matches))
    }

    async fn list_group_matches(&self, group_id: GroupId) -> TournamentResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .tables()
            .matches
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.id));
        Ok(matches)
    }

    async fn find_match(&self, id: MatchId) -> TournamentResult<Option<Match>> {
        Ok(self.tables().matches.get(&id).cloned())
    }

    async fn update_match(&self, m: &Match) -> TournamentResult<()> {
        if let Some(stored) = self.tables().matches.get_mut(&m.id) {
            *stored = m.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl StandingRepository for InMemoryRepository {
    async fn list_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
    ) -> TournamentResult<Vec<Standing>> {
        let mut standings: Vec<Standing> = self
            .tables()
            .standings
            .values()
            .filter(|s| s.tournament_id == tournament_id && s.group_id == group_id)
            .cloned()
            .collect();
        standings.sort_by_key(|s| (s.position, s.team_id));
        Ok(standings)
    }

    async fn upsert_standing(&self, standing: &Standing) -> TournamentResult<()> {
        let key = (standing.tournament_id, standing.group_id, standing.team_id);
        self.tables().standings.insert(key, standing.clone());
        Ok(())
    }

    async fn replace_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
        standings: &[Standing],
    ) -> TournamentResult<()> {
        let mut tables = self.tables();
        tables
            .standings
            .retain(|&(t, g, _), _| !(t == tournament_id && g == group_id));
        for s in standings {
            tables
                .standings
                .insert((s.tournament_id, s.group_id, s.team_id), s.clone());
        }
        Ok(())
    }
}
