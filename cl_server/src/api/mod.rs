//! HTTP API for the league server.
//!
//! A thin JSON surface over [`TournamentManager`]: every handler parses its
//! input, calls one manager operation and maps the outcome to a status code.
//!
//! # Endpoints Overview
//!
//! ## Setup
//! - `POST /api/v1/tournaments` - Create tournament
//! - `POST /api/v1/tournaments/{tournament_id}/groups` - Create group
//! - `POST /api/v1/tournaments/{tournament_id}/groups/{group_id}/teams` - Register team
//! - `POST /api/v1/teams/{team_id}/players` - Add a player to a team
//!
//! ## Fixtures and scores
//! - `POST /api/v1/groups/{group_id}/fixtures` - Generate fixtures
//! - `PUT /api/v1/groups/{group_id}/fixtures` - Regenerate fixtures
//! - `GET /api/v1/groups/{group_id}/matches` - List matches
//! - `PUT /api/v1/matches/{match_id}/result` - Record a result
//!
//! ## Standings
//! - `GET /api/v1/tournaments/{tournament_id}/groups/{group_id}/standings`
//! - `POST /api/v1/tournaments/{tournament_id}/groups/{group_id}/standings/recompute`
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cl_server::api::{AppState, create_router};
//! use court_league::{TournamentManager, db::InMemoryRepository};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = TournamentManager::with_repository(Arc::new(InMemoryRepository::new()));
//! let app = create_router(AppState::new(manager, None));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7878").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use court_league::{TournamentManager, db::Database};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub tournament_manager: Arc<TournamentManager>,
    /// Present when running against PostgreSQL, used by the health check
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(tournament_manager: TournamentManager, database: Option<Database>) -> Self {
        Self {
            tournament_manager: Arc::new(tournament_manager),
            database,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET  /health
/// POST /api/v1/tournaments
/// POST /api/v1/tournaments/{tournament_id}/groups
/// POST /api/v1/tournaments/{tournament_id}/groups/{group_id}/teams
/// GET  /api/v1/tournaments/{tournament_id}/groups/{group_id}/standings
/// POST /api/v1/tournaments/{tournament_id}/groups/{group_id}/standings/recompute
/// POST /api/v1/teams/{team_id}/players
/// POST /api/v1/groups/{group_id}/fixtures
/// PUT  /api/v1/groups/{group_id}/fixtures
/// GET  /api/v1/groups/{group_id}/matches
/// GET  /api/v1/matches/{match_id}
/// PUT  /api/v1/matches/{match_id}/result
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    let setup_routes = Router::new()
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{tournament_id}",
            get(tournaments::get_tournament),
        )
        .route(
            "/tournaments/{tournament_id}/groups",
            post(tournaments::create_group),
        )
        .route(
            "/tournaments/{tournament_id}/groups/{group_id}/teams",
            post(tournaments::register_team),
        )
        .route("/teams/{team_id}/players", post(tournaments::assign_player));

    let play_routes = Router::new()
        .route(
            "/groups/{group_id}/fixtures",
            post(tournaments::generate_fixtures).put(tournaments::regenerate_fixtures),
        )
        .route("/groups/{group_id}/matches", get(tournaments::list_matches))
        .route("/matches/{match_id}", get(tournaments::get_match))
        .route(
            "/matches/{match_id}/result",
            put(tournaments::record_match_result),
        )
        .route(
            "/tournaments/{tournament_id}/groups/{group_id}/standings",
            get(tournaments::get_standings),
        )
        .route(
            "/tournaments/{tournament_id}/groups/{group_id}/standings/recompute",
            post(tournaments::recompute_standings),
        );

    Router::new().merge(setup_routes).merge(play_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable` otherwise.
/// The in-memory backend is always healthy.
///
/// ```bash
/// curl http://localhost:7878/health
/// # {"status":"healthy","storage":"postgres","database":true,"timestamp":"2026-03-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
