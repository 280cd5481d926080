//! Shared application state threaded through every HTTP handler.

use crate::sweep::TouchedPrefixes;
use std::sync::Arc;
use tripindex::planner::Planner;
use tripindex::writer::Writer;

#[derive(Clone)]
pub struct AppState {
    pub writer: Arc<Writer>,
    pub planner: Arc<Planner>,
    /// `Some` only when `PREFIX_SWEEP_INTERVAL_SECONDS` enables the sweep task.
    pub touched_prefixes: Option<Arc<TouchedPrefixes>>,
}
