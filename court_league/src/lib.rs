//! # Court League
//!
//! Round-robin fixtures and standings for padel-style tournaments.
//!
//! Teams of up to two players are split into groups. Each group plays a
//! single round robin; matches are best of three sets and standings are
//! rebuilt from the group's full match list whenever a score changes.
//!
//! ## Core Modules
//!
//! - [`tournament`]: models, fixture generation, result evaluation, standings,
//!   and the [`TournamentManager`] facade
//! - [`db`]: repository traits with PostgreSQL and in-memory implementations

/// Storage layer.
pub mod db;

/// Tournament logic and models.
pub mod tournament;

pub use tournament::{TournamentError, TournamentManager, TournamentResult};
