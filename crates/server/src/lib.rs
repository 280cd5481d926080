//! HTTP transport for the trip-telemetry ingestion and analytics service.
//!
//! Thin layer: every handler in [`http`] does input parsing and status-code
//! mapping only, delegating to [`tripindex::writer::Writer`] and
//! [`tripindex::planner::Planner`] for all real work.

pub mod http;
pub mod state;
pub mod sweep;

pub use http::run_server;
pub use state::AppState;
