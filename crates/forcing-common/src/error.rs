//! Error types shared across the forcing crates.

use thiserror::Error;

use crate::bbox::BboxParseError;
use crate::crs::CrsParseError;
use crate::series::AlignmentError;
use crate::time::TimeParseError;

/// Result type alias using ForcingError.
pub type ForcingResult<T> = Result<T, ForcingError>;

/// Errors raised while building or slicing a [`GeoGrid`](crate::GeoGrid).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GridError {
    #[error("value array of length {actual} does not match shape {shape:?}")]
    ShapeMismatch { shape: Vec<usize>, actual: usize },

    #[error("{dims} dimension names given for a {rank}-dimensional shape")]
    RankMismatch { dims: usize, rank: usize },

    #[error("coordinate '{name}' has {actual} values, expected {expected}")]
    CoordinateLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("index {index} out of range for dimension '{dim}' of length {len}")]
    IndexOutOfRange {
        dim: String,
        index: usize,
        len: usize,
    },
}

/// Umbrella error for the common types.
#[derive(Debug, Error)]
pub enum ForcingError {
    #[error("Invalid CRS: {0}")]
    InvalidCrs(#[from] CrsParseError),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(#[from] BboxParseError),

    #[error("Invalid time specification: {0}")]
    InvalidTime(#[from] TimeParseError),

    #[error("Invalid grid: {0}")]
    InvalidGrid(#[from] GridError),

    #[error("Misaligned series: {0}")]
    MisalignedSeries(#[from] AlignmentError),
}
