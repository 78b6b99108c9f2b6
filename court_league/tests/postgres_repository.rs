//! Integration tests for the PostgreSQL repository.
//!
//! These run against the database named by `DATABASE_URL` and are skipped when
//! it is not set. The schema is applied from the bundled migration first.

use court_league::db::{
    Database, DatabaseConfig, MatchRepository, PgRepository, StandingRepository, TeamRepository,
    TournamentRepository,
};
use court_league::tournament::models::{NewMatch, NewTeam};
use court_league::tournament::{
    Group, MatchPhase, MatchStatus, SetScore, Standing, TournamentError, TournamentFormat,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Helper to connect and migrate, or `None` without a database
async fn setup_test_db() -> Option<Arc<PgPool>> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL repository test");
        return None;
    };

    let db = Database::new(&DatabaseConfig::with_url(database_url))
        .await
        .expect("Failed to create test database");
    sqlx::raw_sql(include_str!("../migrations/001_initial_schema.sql"))
        .execute(db.pool())
        .await
        .expect("Failed to apply schema");

    Some(Arc::new(db.pool().clone()))
}

/// Helper to create a fresh tournament group
async fn seed_group(repo: &PgRepository) -> Group {
    let tournament = repo
        .create_tournament("Repository Test Cup", &TournamentFormat::default())
        .await
        .expect("Failed to create tournament");
    repo.create_group(tournament.id, "Group A", Some("Court 1"))
        .await
        .expect("Failed to create group")
}

/// Helper to cleanup test tournament
async fn cleanup_tournament(pool: &PgPool, tournament_id: i64) {
    for table in ["standings", "matches", "teams", "tournament_groups"] {
        let _ = sqlx::query(&format!("DELETE FROM {table} WHERE tournament_id = $1"))
            .bind(tournament_id)
            .execute(pool)
            .await;
    }
    let _ = sqlx::query("DELETE FROM tournaments WHERE id = $1")
        .bind(tournament_id)
        .execute(pool)
        .await;
}

#[tokio::test]
async fn test_upsert_standing_overwrites_team_row() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PgRepository::new(pool.clone());
    let group = seed_group(&repo).await;
    let team = repo
        .create_team(&NewTeam {
            tournament_id: group.tournament_id,
            group_id: group.id,
            player1: Some(1),
            player2: Some(2),
            rating: 2400,
        })
        .await
        .unwrap();

    let mut standing = Standing::new(group.tournament_id, group.id, team.id);
    repo.upsert_standing(&standing).await.unwrap();

    standing.played = 1;
    standing.won = 1;
    standing.points = 3;
    standing.position = 1;
    repo.upsert_standing(&standing).await.unwrap();

    let listed = repo
        .list_standings(group.tournament_id, group.id)
        .await
        .unwrap();
    assert_eq!(listed, vec![standing]);

    cleanup_tournament(&pool, group.tournament_id).await;
}

#[tokio::test]
async fn test_set_scores_outside_column_range_fail() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PgRepository::new(pool.clone());
    let group = seed_group(&repo).await;

    let mut team_ids = Vec::new();
    for player in [10, 20] {
        let team = repo
            .create_team(&NewTeam {
                tournament_id: group.tournament_id,
                group_id: group.id,
                player1: Some(player),
                player2: Some(player + 1),
                rating: 2000,
            })
            .await
            .unwrap();
        team_ids.push(team.id);
    }

    let created = repo
        .create_matches(&[NewMatch {
            tournament_id: group.tournament_id,
            group_id: group.id,
            round: 1,
            phase: MatchPhase::Group,
            team1: team_ids[0],
            team2: team_ids[1],
            scheduled_at: None,
            venue: group.venue.clone(),
        }])
        .await
        .unwrap();

    let mut m = created[0].clone();
    m.sets[0] = SetScore::new(u32::MAX, 0);
    m.status = MatchStatus::InProgress;
    let result = repo.update_match(&m).await;
    assert!(matches!(result, Err(TournamentError::Database(sqlx::Error::Encode(_)))));

    let stored = repo.find_match(m.id).await.unwrap().unwrap();
    assert_eq!(stored.sets[0], SetScore::NOT_PLAYED);
    assert_eq!(stored.status, MatchStatus::Scheduled);

    sqlx::query("UPDATE matches SET set2_team1 = -4 WHERE id = $1")
        .bind(m.id)
        .execute(pool.as_ref())
        .await
        .unwrap();
    let result = repo.find_match(m.id).await;
    assert!(matches!(result, Err(TournamentError::Database(sqlx::Error::Decode(_)))));

    cleanup_tournament(&pool, group.tournament_id).await;
}
