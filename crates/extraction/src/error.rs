//! Error types for extraction.

use forcing_common::{AlignmentError, GridError};
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while extracting points from a grid.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Coordinate and value arrays do not fit together, or a coordinate is missing.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// A retained point could not be reprojected.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Steps of a series do not share the same points.
    #[error("misaligned series: {0}")]
    MisalignedSeries(#[from] AlignmentError),

    /// Invalid extractor configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExtractionError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }
}

impl From<GridError> for ExtractionError {
    fn from(err: GridError) -> Self {
        Self::InvalidGrid(err.to_string())
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
