//! Coverage sources: where the grids of an export come from.
//!
//! A source lists the items of a run (forecast runs, observation dates or
//! local files) and decodes one variable of one item into a grid stack.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dds_client::{DdsClient, DdsCredentials};
use forcing_common::time::format_compact;
use forcing_common::TimeRange;
use netcdf_grid::{is_netcdf_file, GridStack};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::config::{parse_date, SourceConfig};

/// File extensions picked up from a NetCDF directory without sniffing.
const NETCDF_EXTENSIONS: [&str; 4] = ["nc", "nc4", "cdf", "netcdf"];

/// One unit a source can deliver grids for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageItem {
    /// A product date on the coverage service.
    Date(DateTime<Utc>),
    /// A local NetCDF file.
    File(PathBuf),
}

impl fmt::Display for CoverageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageItem::Date(date) => f.write_str(&format_compact(date)),
            CoverageItem::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Which time steps of a fetched stack go into the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSelection {
    /// Every step, in stack order.
    All,
    /// Only the first step.
    First,
}

impl StepSelection {
    /// Number of steps kept out of `available`.
    pub fn count(self, available: usize) -> usize {
        match self {
            StepSelection::All => available,
            StepSelection::First => available.min(1),
        }
    }
}

/// Trait for sources that can list items and decode their grids.
#[async_trait]
pub trait CoverageSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    fn selection(&self) -> StepSelection;

    /// Items of this run, in time order.
    async fn list_items(&self) -> Result<Vec<CoverageItem>>;

    /// Decode `variable` of `item`.
    async fn fetch(&self, item: &CoverageItem, variable: &str) -> Result<GridStack>;
}

/// Build the source a job describes. Remote sources need `credentials`.
pub fn from_config(
    config: &SourceConfig,
    level: &str,
    time_dim: &str,
    credentials: Option<DdsCredentials>,
) -> Result<Box<dyn CoverageSource>> {
    let client = || -> Result<DdsClient> {
        let credentials = credentials
            .clone()
            .context("DDS credentials are required (set DDS_SERVER, DDS_USER and DDS_PASSWORD)")?;
        Ok(DdsClient::new(credentials)?)
    };

    let source: Box<dyn CoverageSource> = match config {
        SourceConfig::Forecast { data_id, date } => Box::new(DdsForecast {
            client: client()?,
            data_id: data_id.clone(),
            date: parse_date(date)?,
            level: level.to_string(),
            time_dim: time_dim.to_string(),
        }),
        SourceConfig::Observations { data_id, .. } => Box::new(DdsObservations {
            client: client()?,
            data_id: data_id.clone(),
            range: config.time_range()?,
            level: level.to_string(),
            time_dim: time_dim.to_string(),
        }),
        SourceConfig::Netcdf { dir } => Box::new(LocalNetcdf::new(dir.clone(), time_dim)),
    };
    Ok(source)
}

/// Decode a downloaded coverage.
fn decode(bytes: &[u8], item: &CoverageItem, variable: &str, time_dim: &str) -> Result<GridStack> {
    netcdf_grid::read_variable_from_bytes(bytes, variable, time_dim)
        .with_context(|| format!("Failed to decode {} of {}", variable, item))
}

fn expect_date(item: &CoverageItem) -> Result<&DateTime<Utc>> {
    match item {
        CoverageItem::Date(date) => Ok(date),
        other => bail!("remote source cannot fetch {}", other),
    }
}

/// A single forecast run; all of its lead times are used.
pub struct DdsForecast {
    client: DdsClient,
    data_id: String,
    date: DateTime<Utc>,
    level: String,
    time_dim: String,
}

#[async_trait]
impl CoverageSource for DdsForecast {
    fn describe(&self) -> String {
        format!("forecast {} @ {}", self.data_id, format_compact(&self.date))
    }

    fn selection(&self) -> StepSelection {
        StepSelection::All
    }

    async fn list_items(&self) -> Result<Vec<CoverageItem>> {
        Ok(vec![CoverageItem::Date(self.date)])
    }

    #[instrument(skip(self, item), fields(data_id = %self.data_id, item = %item))]
    async fn fetch(&self, item: &CoverageItem, variable: &str) -> Result<GridStack> {
        let date = expect_date(item)?;
        let bytes = self
            .client
            .get_data(&self.data_id, date, variable, &self.level)
            .await
            .with_context(|| format!("Failed to download {} of {}", variable, item))?;
        decode(&bytes, item, variable, &self.time_dim)
    }
}

/// Observations over a date range; each available date contributes its
/// first time step.
pub struct DdsObservations {
    client: DdsClient,
    data_id: String,
    range: TimeRange,
    level: String,
    time_dim: String,
}

#[async_trait]
impl CoverageSource for DdsObservations {
    fn describe(&self) -> String {
        format!(
            "observations {} {}..{}",
            self.data_id,
            format_compact(&self.range.start),
            format_compact(&self.range.end)
        )
    }

    fn selection(&self) -> StepSelection {
        StepSelection::First
    }

    async fn list_items(&self) -> Result<Vec<CoverageItem>> {
        let dates = self
            .client
            .get_dates(&self.data_id, &self.range.start, &self.range.end)
            .await
            .with_context(|| format!("Failed to list dates of {}", self.data_id))?;
        if dates.is_empty() {
            warn!(data_id = %self.data_id, "No observations available in range");
        }
        Ok(dates.into_iter().map(CoverageItem::Date).collect())
    }

    #[instrument(skip(self, item), fields(data_id = %self.data_id, item = %item))]
    async fn fetch(&self, item: &CoverageItem, variable: &str) -> Result<GridStack> {
        let date = expect_date(item)?;
        let bytes = self
            .client
            .get_data(&self.data_id, date, variable, &self.level)
            .await
            .with_context(|| format!("Failed to download {} of {}", variable, item))?;
        decode(&bytes, item, variable, &self.time_dim)
    }
}

/// NetCDF files in one directory, in file-name order.
pub struct LocalNetcdf {
    dir: PathBuf,
    time_dim: String,
}

impl LocalNetcdf {
    pub fn new(dir: impl Into<PathBuf>, time_dim: &str) -> Self {
        Self {
            dir: dir.into(),
            time_dim: time_dim.to_string(),
        }
    }

    /// NetCDF files directly inside the directory, sorted by name.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            bail!("{} is not a directory", self.dir.display());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry =
                entry.with_context(|| format!("Failed to scan {}", self.dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if looks_like_netcdf(entry.path()) {
                files.push(entry.into_path());
            } else {
                debug!(path = %entry.path().display(), "Skipping non-NetCDF file");
            }
        }

        info!(dir = %self.dir.display(), count = files.len(), "Found NetCDF files");
        Ok(files)
    }
}

fn looks_like_netcdf(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| NETCDF_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    by_extension || is_netcdf_file(path)
}

#[async_trait]
impl CoverageSource for LocalNetcdf {
    fn describe(&self) -> String {
        format!("netcdf {}", self.dir.display())
    }

    fn selection(&self) -> StepSelection {
        StepSelection::All
    }

    async fn list_items(&self) -> Result<Vec<CoverageItem>> {
        Ok(self.scan()?.into_iter().map(CoverageItem::File).collect())
    }

    async fn fetch(&self, item: &CoverageItem, variable: &str) -> Result<GridStack> {
        match item {
            CoverageItem::File(path) => netcdf_grid::read_variable(path, variable, &self.time_dim)
                .with_context(|| format!("Failed to decode {} of {}", variable, path.display())),
            other => bail!("local source cannot fetch {}", other),
        }
    }
}
