//! Tournament module for round-robin group play.
//!
//! This module provides:
//! - Fixture generation (circle method, one bye per round for odd groups)
//! - Match result evaluation from best-of-three set scores
//! - Standings aggregation, recomputed from scratch after every score change
//! - Ranking by competition points, point difference and points for
//!
//! ## Example
//!
//! ```no_run
//! use court_league::db::InMemoryRepository;
//! use court_league::tournament::{
//!     MatchResultUpdate, MatchStatus, PlayerRef, TournamentFormat, TournamentManager,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::with_repository(Arc::new(InMemoryRepository::new()));
//!
//!     let tournament = manager
//!         .create_tournament("Spring Open", TournamentFormat::default())
//!         .await?;
//!     let group = manager
//!         .create_group(tournament.id, "Group A", Some("Court 1"))
//!         .await?;
//!     for id in 1..=4 {
//!         let player = PlayerRef { id, rating: 1000 };
//!         manager.register_team(tournament.id, group.id, &[player]).await?;
//!     }
//!
//!     let fixtures = manager.generate_fixtures(group.id).await?;
//!     let first = &fixtures[0];
//!     manager
//!         .record_match_result(
//!             first.id,
//!             MatchResultUpdate::from_sets(&[(6, 2), (6, 3)], MatchStatus::InProgress),
//!         )
//!         .await?;
//!
//!     for standing in manager.get_standings(tournament.id, group.id).await? {
//!         println!("{}. team {} ({} pts)", standing.position, standing.team_id, standing.points);
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod evaluator;
pub mod fixtures;
pub mod manager;
pub mod models;
pub mod standings;

pub use errors::{TournamentError, TournamentResult};
pub use evaluator::{MatchOutcome, MatchSide, evaluate};
pub use fixtures::{Fixture, Round, generate_fixtures, round_pairings};
pub use manager::TournamentManager;
pub use models::{
    AmericanoConfig, Group, GroupId, Match, MatchId, MatchPhase, MatchResultUpdate, MatchStatus,
    PlayerId, PlayerRef, RoundRobinConfig, SetScore, Standing, Team, TeamId, Tournament,
    TournamentFormat, TournamentId,
};
pub use standings::{aggregate, compute_standings, rank};
