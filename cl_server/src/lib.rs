//! HTTP server for court_league: configuration, logging and the JSON API.

pub mod api;
pub mod config;
pub mod logging;
