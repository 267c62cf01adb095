//! Rainfall forcing export.
//!
//! Cuts gridded rainfall (forecasts or observations from the coverage
//! service, or local NetCDF files) down to a simulation domain, reprojects
//! the retained points into the domain CRS and writes them as a forcing
//! file for the hydraulic model.

pub mod config;
pub mod pipeline;
pub mod sources;

pub use config::{DomainConfig, JobConfig, OutputConfig, SourceConfig};
pub use pipeline::{collect_series, run, ExportSummary};
pub use sources::{CoverageItem, CoverageSource, StepSelection};
