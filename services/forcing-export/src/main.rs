//! Rainfall forcing exporter.
//!
//! Downloads forecast or observed rainfall from the coverage service (or
//! reads local NetCDF files), restricts it to a simulation domain and writes
//! a forcing file for the hydraulic model:
//! - `forecast`: every time step of one forecast run
//! - `observations`: the first step of every date in a range
//! - `netcdf`: every step of every file in a directory
//! - `run`: any of the above described by a YAML job file

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dds_client::DdsCredentials;
use extraction::{CoordinateConvention, ExtractorConfig, GridLayout};
use forcing_common::bbox::DEFAULT_BUFFER_DEG;
use forcing_common::{AxisOrder, CrsCode, Shift};
use forcing_export::config::{DomainConfig, JobConfig, OutputConfig, SourceConfig};
use forcing_export::{pipeline, sources};
use forcing_writer::{OutputFormat, DEFAULT_DT};
use netcdf_grid::DEFAULT_TIME_DIM;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "forcing-export")]
#[command(about = "Export gridded rainfall over a simulation domain as model forcing")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export every time step of one forecast run
    Forecast {
        /// Product id on the coverage service
        data_id: String,

        /// Variables to fetch; their values are summed
        #[arg(required = true)]
        variables: Vec<String>,

        /// Forecast run date
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "0")]
        level: String,

        #[command(flatten)]
        dds: DdsArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Export the first time step of every observation date in a range
    Observations {
        /// Product id on the coverage service
        data_id: String,

        /// Variables to fetch; their values are summed
        #[arg(required = true)]
        variables: Vec<String>,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, default_value = "0")]
        level: String,

        #[command(flatten)]
        dds: DdsArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Export every time step of the NetCDF files in a directory
    Netcdf {
        dir: PathBuf,

        /// Variables to read; their values are summed
        #[arg(required = true)]
        variables: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run an export described by a YAML job file
    Run {
        #[arg(long)]
        job: PathBuf,

        #[command(flatten)]
        dds: DdsArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct DdsArgs {
    /// Coverage service base URL
    #[arg(long, env = "DDS_SERVER")]
    dds_server: Option<String>,

    #[arg(long, env = "DDS_USER")]
    dds_user: Option<String>,

    #[arg(long, env = "DDS_PASSWORD", hide_env_values = true)]
    dds_password: Option<String>,
}

impl DdsArgs {
    fn credentials(self) -> Option<DdsCredentials> {
        match (self.dds_server, self.dds_user, self.dds_password) {
            (Some(server), Some(user), Some(password)) => {
                Some(DdsCredentials::new(server, user, password))
            }
            _ => None,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct CommonArgs {
    /// Domain shapefile (.shp)
    #[arg(long)]
    domain: PathBuf,

    /// Domain CRS, overriding the .prj file (e.g. EPSG:32638 or a
    /// "+proj=tmerc ..." / "+proj=lcc ..." definition)
    #[arg(long)]
    domain_crs: Option<CrsCode>,

    /// Output forcing file
    #[arg(short, long)]
    output: PathBuf,

    /// Output format: a (block) or b (columnar)
    #[arg(long, default_value = "a")]
    format: OutputFormat,

    /// Header: radar, minimal or a path to a header file
    #[arg(long)]
    header: Option<String>,

    /// Offset subtracted from every output coordinate
    #[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
    shift: Option<Vec<f64>>,

    /// Seconds between time steps
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: u64,

    /// Degrees added around the domain bounds
    #[arg(long, default_value_t = DEFAULT_BUFFER_DEG)]
    buffer: f64,

    /// Source values are running totals
    #[arg(long)]
    cumulative: bool,

    /// Coordinate names: lat-lon, latitude-longitude or LAT,LON
    #[arg(long, default_value = "lat-lon")]
    coords: CoordinateConvention,

    /// Require mesh values ordered lat-lon or lon-lat; by default the
    /// grid's own dimension order is used
    #[arg(long)]
    axis_order: Option<AxisOrder>,

    /// Grid layout: auto, mesh or points
    #[arg(long, default_value = "auto")]
    layout: GridLayout,

    #[arg(long, default_value = DEFAULT_TIME_DIM)]
    time_dim: String,
}

impl CommonArgs {
    fn into_job(self, source: SourceConfig, variables: Vec<String>, level: String) -> Result<JobConfig> {
        let shift = match self.shift.as_deref() {
            None => None,
            Some(&[dx, dy]) => Some(Shift::new(dx, dy)),
            Some(other) => bail!("--shift takes two values, got {}", other.len()),
        };

        let coords = match self.axis_order {
            Some(order) => self.coords.with_axis_order(order),
            None => self.coords,
        };

        Ok(JobConfig {
            source,
            variables,
            level,
            domain: DomainConfig {
                path: self.domain,
                crs: self.domain_crs,
                buffer: self.buffer,
            },
            output: OutputConfig {
                path: self.output,
                format: self.format,
                header: self.header,
                shift,
                dt: self.dt,
            },
            cumulative: self.cumulative,
            extraction: ExtractorConfig::new(coords, self.layout),
            time_dim: self.time_dim,
        })
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let (job, credentials) = match args.command {
        Command::Forecast {
            data_id,
            variables,
            date,
            level,
            dds,
            common,
        } => (
            common.into_job(SourceConfig::Forecast { data_id, date }, variables, level)?,
            dds.credentials(),
        ),
        Command::Observations {
            data_id,
            variables,
            from,
            to,
            level,
            dds,
            common,
        } => (
            common.into_job(
                SourceConfig::Observations { data_id, from, to },
                variables,
                level,
            )?,
            dds.credentials(),
        ),
        Command::Netcdf {
            dir,
            variables,
            common,
        } => (
            common.into_job(SourceConfig::Netcdf { dir }, variables, "0".to_string())?,
            None,
        ),
        Command::Run { job, dds } => (JobConfig::load(&job)?, dds.credentials()),
    };
    job.validate()?;

    info!(
        source = job.source.kind(),
        variables = ?job.variables,
        output = %job.output.path.display(),
        "Starting rainfall forcing export"
    );

    let source = sources::from_config(&job.source, &job.level, &job.time_dim, credentials)?;
    let summary = pipeline::run(&job, source.as_ref()).await?;

    info!(
        steps = summary.steps,
        points = summary.points,
        output = %summary.output.display(),
        "Done"
    );
    Ok(())
}
