//! # tripindex
//!
//! The event-to-index pipeline and query planner for the trip-telemetry service:
//! an [`Index Writer`](writer::Writer) that fans each arriving event out across
//! a family of time-bucketed store keys, and a [`Query Planner`](planner::Planner)
//! that answers the four analytic queries by probing exactly the buckets that
//! can contain an answer.
//!
//! Both are generic over the [`Store`](store::Store) trait, so the whole crate
//! runs against an in-memory fake with no external Redis required.

pub mod config;
pub mod error;
pub mod planner;
pub mod store;
pub mod writer;

pub mod prelude {
    pub use crate::config::{Config, StoreBackend};
    pub use crate::error::{QueryError, StoreError, WriterError};
    pub use crate::planner::{Planner, StartStopFare};
    pub use crate::store::{MemoryStore, Store};
    pub use crate::writer::Writer;
}
