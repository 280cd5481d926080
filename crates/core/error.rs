//! Error taxonomy (§7): validation errors short-circuit before any mutation, store
//! errors propagate verbatim.

use thiserror::Error;
use tripindex_types::error::{CoordinateError, WindowError};
use tripindex_types::event::MalformedEvent;

/// A transient failure talking to the backing store, or exhaustion of the
/// optimistic-retry loop guarding the counter transaction.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation timed out")]
    Timeout,
    #[error("store transaction retries exhausted after {0} attempts")]
    TransactionExhausted(u32),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors the Index Writer can return from [`crate::writer::Writer::apply`].
#[derive(Debug, Error)]
pub enum WriterError {
    #[error(transparent)]
    Malformed(#[from] MalformedEvent),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors the Query Planner can return. Absence of data is never an error (§7,
/// `NotFound` renders as numeric 0); only malformed input or a failing store call
/// reach this type.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
    #[error("invalid time instant: {0}")]
    InvalidTime(String),
    #[error("invalid window: {0}")]
    InvalidWindow(#[from] WindowError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
