//! Repository traits for tournament storage and their PostgreSQL implementation.
//!
//! The traits keep `TournamentManager` independent of the storage backend so it
//! can be driven by [`super::InMemoryRepository`] in tests.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

use super::timeouts::{with_default_timeout, with_transaction_timeout};
use crate::tournament::{
    TournamentResult,
    models::{
        Group, GroupId, MAX_SETS, Match, MatchId, MatchPhase, MatchStatus, NewMatch, NewTeam,
        SetScore, Standing, Team, TeamId, Tournament, TournamentFormat, TournamentId,
    },
};

/// Tournament and group records
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Create a tournament
    async fn create_tournament(
        &self,
        name: &str,
        format: &TournamentFormat,
    ) -> TournamentResult<Tournament>;

    /// Find tournament by ID
    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// Create a group inside a tournament
    async fn create_group(
        &self,
        tournament_id: TournamentId,
        name: &str,
        venue: Option<&str>,
    ) -> TournamentResult<Group>;

    /// Find group by ID
    async fn find_group(&self, id: GroupId) -> TournamentResult<Option<Group>>;
}

/// Team records
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team
    async fn create_team(&self, team: &NewTeam) -> TournamentResult<Team>;

    /// Find team by ID
    async fn find_team(&self, id: TeamId) -> TournamentResult<Option<Team>>;

    /// Teams of a group, in registration order
    async fn list_group_teams(&self, group_id: GroupId) -> TournamentResult<Vec<Team>>;

    /// Persist the player slots of a team
    async fn update_team_players(&self, team: &Team) -> TournamentResult<()>;
}

/// Match records
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert matches, returning them with their new IDs in input order
    async fn create_matches(&self, matches: &[NewMatch]) -> TournamentResult<Vec<Match>>;

    /// Atomically drop every match of a group and insert `matches`
    async fn replace_group_matches(
        &self,
        group_id: GroupId,
        matches: &[NewMatch],
    ) -> TournamentResult<Vec<Match>>;

    /// Matches of a group ordered by round, then ID
    async fn list_group_matches(&self, group_id: GroupId) -> TournamentResult<Vec<Match>>;

    /// Find match by ID
    async fn find_match(&self, id: MatchId) -> TournamentResult<Option<Match>>;

    /// Persist scores, winner, status, schedule and venue of a match
    async fn update_match(&self, m: &Match) -> TournamentResult<()>;
}

/// Standing records
#[async_trait]
pub trait StandingRepository: Send + Sync {
    /// Standings of a group ordered by position
    async fn list_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
    ) -> TournamentResult<Vec<Standing>>;

    /// Insert or overwrite the standing of one team
    async fn upsert_standing(&self, standing: &Standing) -> TournamentResult<()>;

    /// Atomically replace all standings of a group
    async fn replace_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
        standings: &[Standing],
    ) -> TournamentResult<()>;
}

/// PostgreSQL implementation of every repository trait
#[derive(Clone)]
pub struct PgRepository {
    pool: Arc<PgPool>,
}

impl PgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

/// Convert a set score to its INTEGER column value
fn score_to_column(games: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(games)
        .map_err(|_| sqlx::Error::Encode(format!("set score {games} out of range").into()))
}

/// Read a set score back from its INTEGER column value
fn score_from_column(column: &str, value: i32) -> Result<u32, sqlx::Error> {
    u32::try_from(value)
        .map_err(|_| decode_error(format!("negative set score in {column}: {value}")))
}

fn tournament_from_row(row: &PgRow) -> TournamentResult<Tournament> {
    let format: TournamentFormat = serde_json::from_value(row.get("format"))?;

    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        format,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn group_from_row(row: &PgRow) -> Group {
    Group {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        name: row.get("name"),
        venue: row.get("venue"),
    }
}

fn team_from_row(row: &PgRow) -> Team {
    Team {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        group_id: row.get("group_id"),
        player1: row.get("player1_id"),
        player2: row.get("player2_id"),
        rating: row.get("rating"),
    }
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    let phase: String = row.get("phase");
    let status: String = row.get("status");

    let mut sets = [SetScore::NOT_PLAYED; MAX_SETS];
    for (i, set) in sets.iter_mut().enumerate() {
        let n = i + 1;
        let (col1, col2) = (format!("set{n}_team1"), format!("set{n}_team2"));
        let team1 = score_from_column(&col1, row.try_get(col1.as_str())?)?;
        let team2 = score_from_column(&col2, row.try_get(col2.as_str())?)?;
        *set = SetScore::new(team1, team2);
    }

    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        group_id: row.get("group_id"),
        round: row.get::<i32, _>("round") as u32,
        phase: MatchPhase::parse(&phase)
            .ok_or_else(|| decode_error(format!("unknown match phase: {phase}")))?,
        team1: row.get("team1_id"),
        team2: row.get("team2_id"),
        sets,
        winner: row.get("winner_id"),
        status: MatchStatus::parse(&status)
            .ok_or_else(|| decode_error(format!("unknown match status: {status}")))?,
        scheduled_at: row.get("scheduled_at"),
        venue: row.get("venue"),
    })
}

fn standing_from_row(row: &PgRow) -> Standing {
    Standing {
        tournament_id: row.get("tournament_id"),
        group_id: row.get("group_id"),
        team_id: row.get("team_id"),
        played: row.get::<i32, _>("played") as u32,
        won: row.get::<i32, _>("won") as u32,
        lost: row.get::<i32, _>("lost") as u32,
        drawn: row.get::<i32, _>("drawn") as u32,
        points_for: row.get("points_for"),
        points_against: row.get("points_against"),
        point_difference: row.get("point_difference"),
        points: row.get::<i32, _>("points") as u32,
        position: row.get::<i32, _>("position") as u32,
    }
}

const MATCH_COLUMNS: &str = "id, tournament_id, group_id, round, phase, team1_id, team2_id, \
     set1_team1, set1_team2, set2_team1, set2_team2, set3_team1, set3_team2, \
     winner_id, status, scheduled_at, venue";

async fn insert_matches(
    tx: &mut Transaction<'_, Postgres>,
    matches: &[NewMatch],
) -> Result<Vec<Match>, sqlx::Error> {
    let mut created = Vec::with_capacity(matches.len());

    for m in matches {
        let row = sqlx::query(
            r#"
            INSERT INTO matches (tournament_id, group_id, round, phase, team1_id, team2_id, status, scheduled_at, venue)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(m.tournament_id)
        .bind(m.group_id)
        .bind(m.round as i32)
        .bind(m.phase.as_str())
        .bind(m.team1)
        .bind(m.team2)
        .bind(MatchStatus::Scheduled.as_str())
        .bind(m.scheduled_at)
        .bind(&m.venue)
        .fetch_one(&mut **tx)
        .await?;

        created.push(Match {
            id: row.get("id"),
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
        });
    }

    Ok(created)
}

async fn insert_standing(
    tx: &mut Transaction<'_, Postgres>,
    s: &Standing,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO standings (tournament_id, group_id, team_id, played, won, lost, drawn,
                               points_for, points_against, point_difference, points, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (tournament_id, group_id, team_id) DO UPDATE SET
            played = EXCLUDED.played,
            won = EXCLUDED.won,
            lost = EXCLUDED.lost,
            drawn = EXCLUDED.drawn,
            points_for = EXCLUDED.points_for,
            points_against = EXCLUDED.points_against,
            point_difference = EXCLUDED.point_difference,
            points = EXCLUDED.points,
            position = EXCLUDED.position
        "#,
    )
    .bind(s.tournament_id)
    .bind(s.group_id)
    .bind(s.team_id)
    .bind(s.played as i32)
    .bind(s.won as i32)
    .bind(s.lost as i32)
    .bind(s.drawn as i32)
    .bind(s.points_for)
    .bind(s.points_against)
    .bind(s.point_difference)
    .bind(s.points as i32)
    .bind(s.position as i32)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl TournamentRepository for PgRepository {
    async fn create_tournament(
        &self,
        name: &str,
        format: &TournamentFormat,
    ) -> TournamentResult<Tournament> {
        let format_json = serde_json::to_value(format)?;

        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO tournaments (name, format_kind, format)
                VALUES ($1, $2, $3)
                RETURNING id, name, format, created_at
                "#,
            )
            .bind(name)
            .bind(format.kind())
            .bind(format_json)
            .fetch_one(self.pool.as_ref()),
        )
        .await?;

        tournament_from_row(&row)
    }

    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, name, format, created_at FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn create_group(
        &self,
        tournament_id: TournamentId,
        name: &str,
        venue: Option<&str>,
    ) -> TournamentResult<Group> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO tournament_groups (tournament_id, name, venue)
                VALUES ($1, $2, $3)
                RETURNING id, tournament_id, name, venue
                "#,
            )
            .bind(tournament_id)
            .bind(name)
            .bind(venue)
            .fetch_one(self.pool.as_ref()),
        )
        .await?;

        Ok(group_from_row(&row))
    }

    async fn find_group(&self, id: GroupId) -> TournamentResult<Option<Group>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, tournament_id, name, venue FROM tournament_groups WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.as_ref().map(group_from_row))
    }
}

#[async_trait]
impl TeamRepository for PgRepository {
    async fn create_team(&self, team: &NewTeam) -> TournamentResult<Team> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO teams (tournament_id, group_id, player1_id, player2_id, rating)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, tournament_id, group_id, player1_id, player2_id, rating
                "#,
            )
            .bind(team.tournament_id)
            .bind(team.group_id)
            .bind(team.player1)
            .bind(team.player2)
            .bind(team.rating)
            .fetch_one(self.pool.as_ref()),
        )
        .await?;

        Ok(team_from_row(&row))
    }

    async fn find_team(&self, id: TeamId) -> TournamentResult<Option<Team>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, group_id, player1_id, player2_id, rating FROM teams WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.as_ref().map(team_from_row))
    }

    async fn list_group_teams(&self, group_id: GroupId) -> TournamentResult<Vec<Team>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, tournament_id, group_id, player1_id, player2_id, rating
                FROM teams
                WHERE group_id = $1
                ORDER BY id
                "#,
            )
            .bind(group_id)
            .fetch_all(self.pool.as_ref()),
        )
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn update_team_players(&self, team: &Team) -> TournamentResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE teams SET player1_id = $1, player2_id = $2 WHERE id = $3")
                .bind(team.player1)
                .bind(team.player2)
                .bind(team.id)
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MatchRepository for PgRepository {
    async fn create_matches(&self, matches: &[NewMatch]) -> TournamentResult<Vec<Match>> {
        let created = with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;
            let created = insert_matches(&mut tx, matches).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(created)
        })
        .await?;

        Ok(created)
    }

    async fn replace_group_matches(
        &self,
        group_id: GroupId,
        matches: &[NewMatch],
    ) -> TournamentResult<Vec<Match>> {
        let created = with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM matches WHERE group_id = $1")
                .bind(group_id)
                .execute(&mut *tx)
                .await?;

            let created = insert_matches(&mut tx, matches).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(created)
        })
        .await?;

        Ok(created)
    }

    async fn list_group_matches(&self, group_id: GroupId) -> TournamentResult<Vec<Match>> {
        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE group_id = $1 ORDER BY round, id"
        );
        let rows = with_default_timeout(
            sqlx::query(&query)
                .bind(group_id)
                .fetch_all(self.pool.as_ref()),
        )
        .await?;

        let matches = rows
            .iter()
            .map(match_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    async fn find_match(&self, id: MatchId) -> TournamentResult<Option<Match>> {
        let query = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&query)
                .bind(id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn update_match(&self, m: &Match) -> TournamentResult<()> {
        let mut columns = [0i32; 2 * MAX_SETS];
        for (pair, set) in columns.chunks_exact_mut(2).zip(&m.sets) {
            pair[0] = score_to_column(set.team1)?;
            pair[1] = score_to_column(set.team2)?;
        }
        let [s1t1, s1t2, s2t1, s2t2, s3t1, s3t2] = columns;

        with_default_timeout(
            sqlx::query(
                r#"
                UPDATE matches
                SET set1_team1 = $1, set1_team2 = $2,
                    set2_team1 = $3, set2_team2 = $4,
                    set3_team1 = $5, set3_team2 = $6,
                    winner_id = $7, status = $8, scheduled_at = $9, venue = $10
                WHERE id = $11
                "#,
            )
            .bind(s1t1)
            .bind(s1t2)
            .bind(s2t1)
            .bind(s2t2)
            .bind(s3t1)
            .bind(s3t2)
            .bind(m.winner)
            .bind(m.status.as_str())
            .bind(m.scheduled_at)
            .bind(&m.venue)
            .bind(m.id)
            .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StandingRepository for PgRepository {
    async fn list_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
    ) -> TournamentResult<Vec<Standing>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT tournament_id, group_id, team_id, played, won, lost, drawn,
                       points_for, points_against, point_difference, points, position
                FROM standings
                WHERE tournament_id = $1 AND group_id = $2
                ORDER BY position, team_id
                "#,
            )
            .bind(tournament_id)
            .bind(group_id)
            .fetch_all(self.pool.as_ref()),
        )
        .await?;

        Ok(rows.iter().map(standing_from_row).collect())
    }

    async fn upsert_standing(&self, standing: &Standing) -> TournamentResult<()> {
        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;
            insert_standing(&mut tx, standing).await?;
            tx.commit().await
        })
        .await?;

        Ok(())
    }

    async fn replace_standings(
        &self,
        tournament_id: TournamentId,
        group_id: GroupId,
        standings: &[Standing],
    ) -> TournamentResult<()> {
        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM standings WHERE tournament_id = $1 AND group_id = $2")
                .bind(tournament_id)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;

            for standing in standings {
                insert_standing(&mut tx, standing).await?;
            }

            tx.commit().await
        })
        .await?;

        Ok(())
    }
}
