//! Error types for NetCDF decoding.

use forcing_common::time::TimeParseError;
use forcing_common::GridError;
use thiserror::Error;

/// Result type for NetCDF decoding operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF decoding.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Values and coordinates do not assemble into a grid
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    /// Undecodable time axis
    #[error("Invalid time axis: {0}")]
    Time(#[from] TimeParseError),

    /// Built without the `native` feature
    #[error("NetCDF decoding unavailable: {0}")]
    Unsupported(String),
}
