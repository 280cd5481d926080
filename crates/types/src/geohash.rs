//! The Spatial Encoder: `(lat, lng)` → fixed-precision geohash, and prefix extraction.

use crate::error::CoordinateError;
use serde::{Deserialize, Serialize};

/// A validated `(lat, lng)` pair, guaranteed to lie within WGS84 bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::InvalidLatitude(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A base-32 geohash string of fixed precision [`GeoHash::PRECISION`].
///
/// Two points inside a bounding box whose corners have geohashes sharing prefix π
/// are themselves in cells sharing prefix π — a property of the Z-order curve the
/// geohash alphabet encodes. The query planner exploits this to reduce a 2D range
/// query to a 1D prefix enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoHash(String);

impl GeoHash {
    /// Precision sufficient for ≤1 m resolution; every geohash in this system has
    /// exactly this many characters.
    pub const PRECISION: usize = 12;

    /// Encode a coordinate at [`GeoHash::PRECISION`].
    pub fn encode(coord: &Coordinate) -> Result<Self, CoordinateError> {
        let cell = geohash::encode(
            geo::Coord {
                x: coord.lng(),
                y: coord.lat(),
            },
            Self::PRECISION,
        )
        // geohash::encode only fails on out-of-range input, which Coordinate already rejects.
        .expect("Coordinate is pre-validated to be within WGS84 bounds");
        Ok(Self(cell))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The longest shared prefix of `self` and `other`. Both geohashes are the same
    /// length, so this never exceeds [`GeoHash::PRECISION`].
    pub fn common_prefix<'a>(&'a self, other: &GeoHash) -> &'a str {
        let a = self.0.as_bytes();
        let b = other.0.as_bytes();
        let mut n = 0;
        while n < a.len() && n < b.len() && a[n] == b[n] {
            n += 1;
        }
        &self.0[..n]
    }

    /// Prefixes of length `1..PRECISION` — the keys the prefix index is written under.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        (1..Self::PRECISION).map(move |k| &self.0[..k])
    }
}

impl std::fmt::Display for GeoHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
