//! Error types for domain loading.

use std::path::PathBuf;

use forcing_common::crs::CrsParseError;
use projection::ProjectionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid shapefile: {0}")]
    InvalidShapefile(String),

    #[error("unsupported shape type {0}")]
    UnsupportedShapeType(i32),

    #[error("cannot determine CRS from projection file: {0}")]
    UnknownCrs(String),

    #[error("no .prj next to {0}; pass the domain CRS explicitly")]
    MissingCrs(PathBuf),

    #[error("domain {0} has no vertices")]
    Empty(PathBuf),

    #[error(transparent)]
    Crs(#[from] CrsParseError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl DomainError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidShapefile(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
