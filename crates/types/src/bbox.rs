//! The rectangle a Q3/Q4 query is resolved against.

use crate::error::CoordinateError;
use crate::geohash::{Coordinate, GeoHash};
use serde::{Deserialize, Serialize};

/// A query bounding box, given as two opposite corners.
///
/// This is a query input, not a geometric guarantee: the corners need not be
/// ordered (min/max is not enforced), matching the two free-form lat/lng pairs a
/// caller supplies in `/query/trips_passed_through/` and `/query/trips_start_stop/`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub corner1: Coordinate,
    pub corner2: Coordinate,
}

impl BoundingBox {
    pub fn new(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<Self, CoordinateError> {
        Ok(Self {
            corner1: Coordinate::new(lat1, lng1)?,
            corner2: Coordinate::new(lat2, lng2)?,
        })
    }

    /// The longest geohash prefix shared by both corners (§4.1 rationale). Empty
    /// if the corners disagree at the first character — the box is large enough
    /// that the query planner falls back to scanning every first-character prefix.
    pub fn common_geohash_prefix(&self) -> Result<String, CoordinateError> {
        let gh1 = GeoHash::encode(&self.corner1)?;
        let gh2 = GeoHash::encode(&self.corner2)?;
        Ok(gh1.common_prefix(&gh2).to_string())
    }
}
