//! Error types for the forcing writers.

use std::path::PathBuf;

use forcing_common::AlignmentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("nothing to write: the series has no time steps")]
    EmptySeries,

    #[error("columnar output needs identical points in every step: {0}")]
    MisalignedSeries(#[from] AlignmentError),

    #[error("unknown output format '{0}' (expected a or b)")]
    UnknownFormat(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WriterError>;
