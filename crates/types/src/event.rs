//! The wire shape of a trip-telemetry event (§3 of the specification).

use crate::error::CoordinateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three event kinds a trip source emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Begin,
    Update,
    End,
}

impl EventKind {
    pub fn is_begin_or_end(self) -> bool {
        matches!(self, EventKind::Begin | EventKind::End)
    }
}

/// A single trip-telemetry event, as received on `POST /trips/`.
///
/// `fare` is required exactly when `event == End`; the server stamps every event
/// with its own arrival time rather than trusting a client-supplied timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "tripId")]
    pub trip_id: i64,
    pub event: EventKind,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fare: Option<f64>,
}

/// Why an [`Event`] was rejected before any store mutation occurred.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedEvent {
    #[error("end event for trip {0} is missing the required 'fare' field")]
    MissingFare(i64),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
    #[error("invalid request body: {0}")]
    Invalid(String),
}

impl Event {
    /// Validate the event against the invariants in §3: `fare` must be present
    /// iff `event == End`, and `(lat, lng)` must be within WGS84 bounds.
    pub fn validate(&self) -> Result<(), MalformedEvent> {
        if self.event == EventKind::End && self.fare.is_none() {
            return Err(MalformedEvent::MissingFare(self.trip_id));
        }
        crate::geohash::Coordinate::new(self.lat, self.lng)?;
        Ok(())
    }
}
