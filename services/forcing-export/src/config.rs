//! Export job configuration.
//!
//! A job names where the grids come from, which variables to sum, the
//! simulation domain and how to write the result. Jobs are either read from
//! a YAML file (`run --job`) or assembled from command line arguments.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use extraction::ExtractorConfig;
use forcing_common::time::parse_datetime;
use forcing_common::{CrsCode, Shift, TimeRange};
use forcing_writer::{Header, OutputFormat, DEFAULT_DT};
use netcdf_grid::DEFAULT_TIME_DIM;
use serde::Deserialize;
use tracing::info;

/// Root of a job YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobConfig {
    pub source: SourceConfig,
    /// Variables fetched per item; their grids are summed cell by cell.
    pub variables: Vec<String>,
    #[serde(default = "default_level")]
    pub level: String,
    pub domain: DomainConfig,
    pub output: OutputConfig,
    /// Source values are running totals and are differenced before writing.
    #[serde(default)]
    pub cumulative: bool,
    #[serde(default)]
    pub extraction: ExtractorConfig,
    #[serde(default = "default_time_dim")]
    pub time_dim: String,
}

/// Where the grids come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// One forecast run from the coverage service.
    Forecast { data_id: String, date: String },
    /// Observations from the coverage service between two dates.
    Observations {
        data_id: String,
        from: String,
        to: String,
    },
    /// NetCDF files in a local directory.
    Netcdf { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DomainConfig {
    /// Path to the domain `.shp` file.
    pub path: PathBuf,
    /// Overrides the CRS read from the `.prj` sidecar.
    #[serde(default)]
    pub crs: Option<CrsCode>,
    /// Degrees added on each side of the domain's geographic bounds.
    #[serde(default = "default_buffer")]
    pub buffer: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// `radar`, `minimal` or a path to a header file.
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub shift: Option<Shift>,
    /// Seconds between time steps.
    #[serde(default = "default_dt")]
    pub dt: u64,
}

fn default_level() -> String {
    "0".to_string()
}

fn default_time_dim() -> String {
    DEFAULT_TIME_DIM.to_string()
}

fn default_buffer() -> f64 {
    forcing_common::bbox::DEFAULT_BUFFER_DEG
}

fn default_dt() -> u64 {
    DEFAULT_DT
}

impl JobConfig {
    /// Load and validate a job file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        let job: JobConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse job file {}", path.display()))?;
        job.validate()
            .with_context(|| format!("Invalid job file {}", path.display()))?;

        info!(
            path = %path.display(),
            source = job.source.kind(),
            variables = ?job.variables,
            "Loaded job"
        );
        Ok(job)
    }

    /// Check the parts serde cannot: non-empty variables, parseable dates,
    /// sane numbers and a usable coordinate convention.
    pub fn validate(&self) -> Result<()> {
        if self.variables.is_empty() {
            bail!("at least one variable is required");
        }
        if let Some(blank) = self.variables.iter().position(|v| v.trim().is_empty()) {
            bail!("variable #{} is empty", blank + 1);
        }
        if self.output.dt == 0 {
            bail!("dt must be positive");
        }
        if !self.domain.buffer.is_finite() || self.domain.buffer < 0.0 {
            bail!("buffer must be a non-negative number, got {}", self.domain.buffer);
        }
        if self.time_dim.is_empty() {
            bail!("time_dim must not be empty");
        }

        match &self.source {
            SourceConfig::Forecast { data_id, date } => {
                require_id(data_id)?;
                parse_date(date)?;
            }
            SourceConfig::Observations { data_id, .. } => {
                require_id(data_id)?;
                self.source.time_range()?;
            }
            SourceConfig::Netcdf { dir } => {
                if dir.as_os_str().is_empty() {
                    bail!("netcdf source needs a directory");
                }
            }
        }

        self.extraction.validate()?;
        Ok(())
    }

    /// The header text to write: the configured one, or the format's usual one.
    pub fn header(&self) -> Result<Header> {
        match &self.output.header {
            Some(arg) => Header::resolve(arg).with_context(|| format!("Failed to load header '{}'", arg)),
            None => Ok(self.output.format.default_header()),
        }
    }
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Forecast { .. } => "forecast",
            SourceConfig::Observations { .. } => "observations",
            SourceConfig::Netcdf { .. } => "netcdf",
        }
    }

    /// Whether the source talks to the coverage service.
    pub fn is_remote(&self) -> bool {
        !matches!(self, SourceConfig::Netcdf { .. })
    }

    /// The observation window, for observation sources.
    pub fn time_range(&self) -> Result<TimeRange> {
        match self {
            SourceConfig::Observations { from, to, .. } => TimeRange::parse(from, to)
                .with_context(|| format!("Invalid observation range {} .. {}", from, to)),
            other => bail!("{} source has no time range", other.kind()),
        }
    }
}

/// Parse a user-supplied date.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    parse_datetime(s).with_context(|| format!("Invalid date '{}'", s))
}

fn require_id(data_id: &str) -> Result<()> {
    if data_id.trim().is_empty() {
        bail!("data_id must not be empty");
    }
    Ok(())
}
