use thiserror::Error;

/// A latitude or longitude (or bounding-box corner) outside its valid range.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} out of range [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} out of range [-180, 180]")]
    InvalidLongitude(f64),
}

/// A malformed trailing window string (expected `Nd` or `Nw`).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WindowError {
    #[error("window string is empty")]
    Empty,
    #[error("window {0:?} has no unit suffix ('d' or 'w')")]
    MissingUnit(String),
    #[error("window {0:?} has an invalid count")]
    InvalidCount(String),
}
