//! Tournament manager: fixture generation, score entry and standings.

use super::{
    errors::{TournamentError, TournamentResult, validate_id},
    evaluator::evaluate,
    fixtures,
    models::{
        Group, GroupId, MAX_SET_GAMES, Match, MatchId, MatchPhase, MatchResultUpdate, NewMatch,
        NewTeam, PlayerRef, Standing, Team, TeamId, Tournament, TournamentFormat, TournamentId,
    },
    standings::compute_standings,
};
use crate::db::{
    MatchRepository, PgRepository, StandingRepository, TeamRepository, TournamentRepository,
};
use log::{debug, info, warn};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Maximum number of players on a team
pub const MAX_TEAM_PLAYERS: usize = 2;

type GroupKey = (TournamentId, GroupId);

/// Tournament manager
///
/// Cheap to clone; clones share storage and group locks.
#[derive(Clone)]
pub struct TournamentManager {
    tournaments: Arc<dyn TournamentRepository>,
    teams: Arc<dyn TeamRepository>,
    matches: Arc<dyn MatchRepository>,
    standings: Arc<dyn StandingRepository>,
    /// Serialises writes and recomputation per (tournament, group)
    group_locks: Arc<Mutex<HashMap<GroupKey, Arc<AsyncMutex<()>>>>>,
}

impl TournamentManager {
    /// Create a manager backed by PostgreSQL
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_repository(Arc::new(PgRepository::new(pool)))
    }

    /// Create a manager over any store implementing every repository trait
    pub fn with_repository<R>(repo: Arc<R>) -> Self
    where
        R: TournamentRepository
            + TeamRepository
            + MatchRepository
            + StandingRepository
            + 'static,
    {
        Self {
            tournaments: repo.clone(),
            teams: repo.clone(),
            matches: repo.clone(),
            standings: repo,
            group_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn group_lock(&self, key: GroupKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .group_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop locks nobody holds or waits on; only the map still references them.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key).or_default().clone()
    }

    /// Create a new tournament
    pub async fn create_tournament(
        &self,
        name: &str,
        format: TournamentFormat,
    ) -> TournamentResult<Tournament> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::Validation(
                "tournament name must not be empty".to_string(),
            ));
        }

        let tournament = self.tournaments.create_tournament(name, &format).await?;
        info!(
            "Created {} tournament {} ({})",
            format.kind(),
            tournament.id,
            tournament.name
        );
        Ok(tournament)
    }

    /// Get tournament by ID
    pub async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        validate_id("tournament", tournament_id)?;
        self.tournaments
            .find_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::TournamentNotFound(tournament_id))
    }

    /// Create a group inside a tournament
    ///
    /// `venue` is copied onto every fixture generated for the group.
    pub async fn create_group(
        &self,
        tournament_id: TournamentId,
        name: &str,
        venue: Option<&str>,
    ) -> TournamentResult<Group> {
        self.get_tournament(tournament_id).await?;
        let group = self
            .tournaments
            .create_group(tournament_id, name, venue)
            .await?;
        debug!("Created group {} in tournament {}", group.id, tournament_id);
        Ok(group)
    }

    /// Get group by ID
    pub async fn get_group(&self, group_id: GroupId) -> TournamentResult<Group> {
        validate_id("group", group_id)?;
        self.tournaments
            .find_group(group_id)
            .await?
            .ok_or(TournamentError::GroupNotFound(group_id))
    }

    /// Get a group, requiring it to belong to `tournament_id`
    async fn get_tournament_group(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
    ) -> TournamentResult<Group> {
        validate_id("tournament", tournament_id)?;
        let group = self.get_group(group_id).await?;
        if group.tournament_id != tournament_id {
            return Err(TournamentError::GroupNotFound(group_id));
        }
        Ok(group)
    }

    /// Register a team of up to two players in a group
    ///
    /// The team rating is the sum of the player ratings now and is never updated.
    pub async fn register_team(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
        players: &[PlayerRef],
    ) -> TournamentResult<Team> {
        self.get_tournament_group(tournament_id, group_id).await?;

        if players.len() > MAX_TEAM_PLAYERS {
            return Err(TournamentError::Validation(format!(
                "a team has at most {MAX_TEAM_PLAYERS} players, got {}",
                players.len()
            )));
        }
        for player in players {
            validate_id("player", player.id)?;
        }
        if let [a, b] = players {
            if a.id == b.id {
                return Err(TournamentError::Validation(format!(
                    "player {} listed twice",
                    a.id
                )));
            }
        }

        let team = self
            .teams
            .create_team(&NewTeam {
                tournament_id,
                group_id,
                player1: players.first().map(|p| p.id),
                player2: players.get(1).map(|p| p.id),
                rating: players.iter().map(|p| p.rating).sum(),
            })
            .await?;

        info!(
            "Registered team {} in group {} (rating {})",
            team.id, group_id, team.rating
        );
        Ok(team)
    }

    /// Put a player into the first free slot of a team
    ///
    /// The team rating stays frozen at its registration value.
    pub async fn assign_player(&self, team_id: TeamId, player: PlayerRef) -> TournamentResult<Team> {
        validate_id("team", team_id)?;
        validate_id("player", player.id)?;

        let mut team = self
            .teams
            .find_team(team_id)
            .await?
            .ok_or(TournamentError::TeamNotFound(team_id))?;

        if team.player1 == Some(player.id) || team.player2 == Some(player.id) {
            return Err(TournamentError::Validation(format!(
                "player {} is already on team {team_id}",
                player.id
            )));
        }

        if team.player1.is_none() {
            team.player1 = Some(player.id);
        } else if team.player2.is_none() {
            team.player2 = Some(player.id);
        } else {
            return Err(TournamentError::TeamFull(team_id));
        }

        self.teams.update_team_players(&team).await?;
        Ok(team)
    }

    fn fixtures_for(group: &Group, teams: &[Team]) -> Vec<NewMatch> {
        let order: Vec<TeamId> = teams.iter().map(|t| t.id).collect();

        fixtures::generate_fixtures(&order)
            .into_iter()
            .map(|f| NewMatch {
                tournament_id: group.tournament_id,
                group_id: group.id,
                round: f.round,
                phase: MatchPhase::Group,
                team1: f.team1,
                team2: f.team2,
                scheduled_at: None,
                // Placeholder; no check for clashes at the same venue.
                venue: group.venue.clone(),
            })
            .collect()
    }

    /// Generate the round-robin fixtures of a group
    ///
    /// Fails with [`TournamentError::FixturesAlreadyGenerated`] when the group has
    /// matches already. A group with fewer than two teams yields no matches.
    pub async fn generate_fixtures(&self, group_id: GroupId) -> TournamentResult<Vec<Match>> {
        let group = self.get_group(group_id).await?;
        let lock = self.group_lock((group.tournament_id, group.id));
        let _guard = lock.lock().await;

        if !self.matches.list_group_matches(group_id).await?.is_empty() {
            return Err(TournamentError::FixturesAlreadyGenerated(group_id));
        }

        let teams = self.teams.list_group_teams(group_id).await?;
        if teams.len() < 2 {
            warn!(
                "Group {} has {} team(s); no fixtures generated",
                group_id,
                teams.len()
            );
            return Ok(Vec::new());
        }

        let created = self
            .matches
            .create_matches(&Self::fixtures_for(&group, &teams))
            .await?;
        info!(
            "Generated {} fixtures over {} rounds for group {}",
            created.len(),
            fixtures::round_count(teams.len()),
            group_id
        );

        self.recompute_locked(&group).await?;
        Ok(created)
    }

    /// Replace every match of a group with a freshly generated fixture set
    ///
    /// Scores entered so far are discarded and standings are reset.
    pub async fn regenerate_fixtures(&self, group_id: GroupId) -> TournamentResult<Vec<Match>> {
        let group = self.get_group(group_id).await?;
        let lock = self.group_lock((group.tournament_id, group.id));
        let _guard = lock.lock().await;

        let teams = self.teams.list_group_teams(group_id).await?;
        let created = self
            .matches
            .replace_group_matches(group_id, &Self::fixtures_for(&group, &teams))
            .await?;
        info!(
            "Regenerated fixtures for group {}: {} matches",
            group_id,
            created.len()
        );

        self.recompute_locked(&group).await?;
        Ok(created)
    }

    /// Get match by ID
    pub async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        validate_id("match", match_id)?;
        self.matches
            .find_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    /// Matches of a group, by round
    pub async fn list_matches(&self, group_id: GroupId) -> TournamentResult<Vec<Match>> {
        self.get_group(group_id).await?;
        self.matches.list_group_matches(group_id).await
    }

    /// Record scores and status for a match, then recompute its group standings
    ///
    /// The status is taken from the caller and must be a legal transition; it is
    /// never inferred from the sets. Without an explicit winner, the winner is
    /// derived from the sets. Once the sets decide the match, an explicit winner
    /// must agree with them; on undecided sets it is stored as given (walkover or
    /// retirement) and does not count in the standings. Schedule and venue are
    /// kept when not given.
    pub async fn record_match_result(
        &self,
        match_id: MatchId,
        update: MatchResultUpdate,
    ) -> TournamentResult<Match> {
        if let Some(set) = update.sets.iter().find(|set| !set.is_within_bounds()) {
            return Err(TournamentError::Validation(format!(
                "set score {}-{} exceeds {MAX_SET_GAMES} games",
                set.team1, set.team2
            )));
        }

        let found = self.get_match(match_id).await?;
        let group = self
            .get_tournament_group(found.tournament_id, found.group_id)
            .await?;
        let lock = self.group_lock((group.tournament_id, group.id));
        let _guard = lock.lock().await;

        // Re-read under the lock so concurrent writers see each other's changes.
        let mut m = self.get_match(match_id).await?;

        if !m.status.can_transition_to(update.status) {
            return Err(TournamentError::InvalidTransition {
                from: m.status,
                to: update.status,
            });
        }

        if let Some(winner) = update.winner {
            if !m.involves(winner) {
                return Err(TournamentError::Validation(format!(
                    "team {winner} does not play in match {match_id}"
                )));
            }
        }

        let outcome = evaluate(&update.sets);
        if outcome.is_complete {
            let derived = outcome.winner_id(m.team1, m.team2);
            if update.winner.is_some() && update.winner != derived {
                return Err(TournamentError::Validation(format!(
                    "winner of match {match_id} contradicts its set scores"
                )));
            }
        }

        m.sets = update.sets;
        m.status = update.status;
        m.winner = update.winner.or(outcome.winner_id(m.team1, m.team2));
        if update.scheduled_at.is_some() {
            m.scheduled_at = update.scheduled_at;
        }
        if update.venue.is_some() {
            m.venue = update.venue;
        }

        self.matches.update_match(&m).await?;
        debug!(
            "Recorded result for match {}: complete={} totals={}-{}",
            m.id, outcome.is_complete, outcome.team1_total, outcome.team2_total
        );

        self.recompute_locked(&group).await?;
        Ok(m)
    }

    /// Rebuild and persist the ranked standings of a group from its matches
    pub async fn recompute_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
    ) -> TournamentResult<Vec<Standing>> {
        let group = self.get_tournament_group(tournament_id, group_id).await?;
        let lock = self.group_lock((tournament_id, group_id));
        let _guard = lock.lock().await;

        self.recompute_locked(&group).await
    }

    /// Caller must hold the group lock
    async fn recompute_locked(&self, group: &Group) -> TournamentResult<Vec<Standing>> {
        let teams: Vec<TeamId> = self
            .teams
            .list_group_teams(group.id)
            .await?
            .into_iter()
            .filter(|team| {
                let consistent = team.tournament_id == group.tournament_id;
                if !consistent {
                    warn!(
                        "Team {} is in group {} but belongs to tournament {}; omitted from standings",
                        team.id, group.id, team.tournament_id
                    );
                }
                consistent
            })
            .map(|team| team.id)
            .collect();
        let matches = self.matches.list_group_matches(group.id).await?;

        let standings = compute_standings(group.tournament_id, group.id, &teams, &matches);
        self.standings
            .replace_standings(group.tournament_id, group.id, &standings)
            .await?;

        debug!(
            "Recomputed standings for group {} from {} matches",
            group.id,
            matches.len()
        );
        Ok(standings)
    }

    /// Current ranked standings of a group
    pub async fn get_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
    ) -> TournamentResult<Vec<Standing>> {
        self.get_tournament_group(tournament_id, group_id).await?;
        self.standings.list_standings(tournament_id, group_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRepository;
    use crate::tournament::models::MatchStatus;

    async fn setup(team_count: usize) -> (TournamentManager, Group, Vec<Team>) {
        let manager = TournamentManager::with_repository(Arc::new(InMemoryRepository::new()));
        let tournament = manager
            .create_tournament("Club Cup", TournamentFormat::default())
            .await
            .unwrap();
        let group = manager
            .create_group(tournament.id, "A", Some("Central Court"))
            .await
            .unwrap();

        let mut teams = Vec::new();
        for i in 0..team_count as i64 {
            let players = [
                PlayerRef {
                    id: 100 + i * 2,
                    rating: 1000,
                },
                PlayerRef {
                    id: 101 + i * 2,
                    rating: 1200,
                },
            ];
            teams.push(
                manager
                    .register_team(tournament.id, group.id, &players)
                    .await
                    .unwrap(),
            );
        }

        (manager, group, teams)
    }

    #[tokio::test]
    async fn test_register_team_freezes_rating() {
        let (_, _, teams) = setup(1).await;
        assert_eq!(teams[0].rating, 2200);
        assert!(teams[0].is_full());
    }

    #[tokio::test]
    async fn test_register_team_rejects_three_players() {
        let (manager, group, _) = setup(0).await;
        let players = [
            PlayerRef { id: 1, rating: 1 },
            PlayerRef { id: 2, rating: 1 },
            PlayerRef { id: 3, rating: 1 },
        ];
        let result = manager
            .register_team(group.tournament_id, group.id, &players)
            .await;
        assert!(matches!(result, Err(TournamentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_player_fills_then_conflicts() {
        let (manager, group, _) = setup(0).await;
        let team = manager
            .register_team(group.tournament_id, group.id, &[PlayerRef { id: 7, rating: 900 }])
            .await
            .unwrap();

        let team = manager
            .assign_player(team.id, PlayerRef { id: 8, rating: 1500 })
            .await
            .unwrap();
        assert_eq!(team.player2, Some(8));
        assert_eq!(team.rating, 900);

        let result = manager
            .assign_player(team.id, PlayerRef { id: 9, rating: 1000 })
            .await;
        assert!(matches!(result, Err(TournamentError::TeamFull(id)) if id == team.id));
    }

    #[tokio::test]
    async fn test_generate_fixtures_copies_group_venue() {
        let (manager, group, _) = setup(4).await;
        let matches = manager.generate_fixtures(group.id).await.unwrap();

        assert_eq!(matches.len(), 6);
        assert!(
            matches
                .iter()
                .all(|m| m.venue.as_deref() == Some("Central Court"))
        );
        assert!(matches.iter().all(|m| m.status == MatchStatus::Scheduled));
    }

    #[tokio::test]
    async fn test_generate_fixtures_twice_conflicts() {
        let (manager, group, _) = setup(3).await;
        manager.generate_fixtures(group.id).await.unwrap();

        let result = manager.generate_fixtures(group.id).await;
        assert!(matches!(
            result,
            Err(TournamentError::FixturesAlreadyGenerated(id)) if id == group.id
        ));
    }

    #[tokio::test]
    async fn test_single_team_group_yields_no_fixtures() {
        let (manager, group, _) = setup(1).await;
        assert!(manager.generate_fixtures(group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_fixtures_initialises_standings() {
        let (manager, group, teams) = setup(4).await;
        manager.generate_fixtures(group.id).await.unwrap();

        let standings = manager
            .get_standings(group.tournament_id, group.id)
            .await
            .unwrap();
        assert_eq!(standings.len(), teams.len());
        assert!(standings.iter().all(|s| s.played == 0));
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected() {
        let (manager, _, _) = setup(0).await;
        assert!(matches!(
            manager.get_match(0).await,
            Err(TournamentError::Validation(_))
        ));
        assert!(matches!(
            manager.generate_fixtures(-1).await,
            Err(TournamentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_idle_group_locks_are_dropped() {
        let (manager, group, _) = setup(2).await;
        let mut groups = vec![group.clone()];
        for name in ["B", "C"] {
            groups.push(
                manager
                    .create_group(group.tournament_id, name, None)
                    .await
                    .unwrap(),
            );
        }

        for g in &groups {
            manager.generate_fixtures(g.id).await.unwrap();
            manager
                .recompute_standings(g.tournament_id, g.id)
                .await
                .unwrap();
        }

        let held = manager.group_lock((group.tournament_id, group.id));
        let idle = manager.group_lock((group.tournament_id, groups[1].id));
        drop(idle);
        let locks = manager.group_locks.lock().unwrap();
        assert_eq!(locks.len(), 2);
        assert!(Arc::ptr_eq(&locks[&(group.tournament_id, group.id)], &held));
    }

    #[tokio::test]
    async fn test_group_of_other_tournament_is_not_found() {
        let (manager, group, _) = setup(2).await;
        let other = manager
            .create_tournament("Other", TournamentFormat::default())
            .await
            .unwrap();

        let result = manager.get_standings(other.id, group.id).await;
        assert!(matches!(result, Err(TournamentError::GroupNotFound(_))));
    }
}
