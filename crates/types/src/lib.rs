//! # tripindex-types
//!
//! Core event, geospatial, and time-window types for the trip-telemetry index.
//!
//! This crate provides the fundamental vocabulary shared by the index writer and
//! the query planner:
//!
//! - **Event types**: [`Event`], [`EventKind`] — the wire shape emitted by trip sources.
//! - **Geospatial types**: [`Coordinate`], [`GeoHash`] — the spatial encoder's inputs/outputs.
//! - **Bounding boxes**: [`BoundingBox`] — the rectangle a query is resolved against.
//! - **Time windows**: [`Window`] — a trailing `Nd`/`Nw` range.
//! - **Buckets**: [`DateBucket`], [`WeekBucket`] — the day/week suffixes used in store keys.
//!
//! ## Example
//!
//! ```
//! use tripindex_types::{Coordinate, GeoHash};
//!
//! let coit_tower = Coordinate::new(37.8025, -122.4058).unwrap();
//! let gh = GeoHash::encode(&coit_tower).unwrap();
//! assert_eq!(gh.as_str().len(), GeoHash::PRECISION);
//! ```

pub mod bbox;
pub mod error;
pub mod event;
pub mod geohash;
pub mod time;
pub mod window;

pub use bbox::BoundingBox;
pub use error::CoordinateError;
pub use event::{Event, EventKind};
pub use geohash::{Coordinate, GeoHash};
pub use time::{DateBucket, WeekBucket};
pub use window::Window;
