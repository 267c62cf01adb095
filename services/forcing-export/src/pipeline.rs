//! The export pipeline.
//!
//! load domain -> buffered bounding box -> for every item and selected step:
//! sum the variables, extract, push -> optional differencing -> write.
//!
//! Items are processed strictly one after another; every fetch is awaited
//! before the next one starts.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use domain::Domain;
use extraction::{sum_grids, to_increments, Extractor};
use forcing_common::{GeoBoundingBox, GeoGrid, TimeSeries};
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::sources::{CoverageItem, CoverageSource};

/// What an export run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub items: usize,
    pub steps: usize,
    /// Points in the first written step.
    pub points: usize,
    pub output: PathBuf,
}

/// Run `job` against `source` and write the forcing file.
pub async fn run(job: &JobConfig, source: &dyn CoverageSource) -> Result<ExportSummary> {
    let domain = Domain::load(&job.domain.path, job.domain.crs)
        .with_context(|| format!("Failed to load domain {}", job.domain.path.display()))?;
    let bbox = domain
        .geographic_bbox(job.domain.buffer)
        .context("Failed to compute the domain bounding box")?;
    info!(source = %source.describe(), bbox = %bbox, crs = %domain.crs(), "Starting export");

    let items = source.list_items().await?;
    if items.is_empty() {
        bail!("{} has nothing to export", source.describe());
    }

    let mut series = collect_series(job, source, &items, &domain, &bbox).await?;
    if job.cumulative {
        series = to_increments(&series).context("Failed to difference cumulative values")?;
    }
    if series.is_empty() {
        bail!("no time steps left to write");
    }

    let header = job.header()?;
    forcing_writer::write(
        &series,
        header.text(),
        &job.output.path,
        job.output.shift,
        job.output.dt,
        job.output.format,
    )
    .with_context(|| format!("Failed to write {}", job.output.path.display()))?;

    let summary = ExportSummary {
        items: items.len(),
        steps: series.len(),
        points: series.first().map(Vec::len).unwrap_or(0),
        output: job.output.path.clone(),
    };
    info!(
        items = summary.items,
        steps = summary.steps,
        points = summary.points,
        output = %summary.output.display(),
        "Export complete"
    );
    Ok(summary)
}

/// Fetch, sum and extract every selected step of every item.
pub async fn collect_series(
    job: &JobConfig,
    source: &dyn CoverageSource,
    items: &[CoverageItem],
    domain: &Domain,
    bbox: &GeoBoundingBox,
) -> Result<TimeSeries> {
    let extractor = Extractor::new(job.extraction.clone());
    let selection = source.selection();
    let mut series = TimeSeries::new();

    for item in items {
        let mut stacks = Vec::with_capacity(job.variables.len());
        for variable in &job.variables {
            let stack = source.fetch(item, variable).await?;
            debug!(item = %item, variable = %variable, steps = stack.len(), "Fetched grid stack");
            stacks.push(stack);
        }

        let available = stacks.first().map(Vec::len).unwrap_or(0);
        if let Some(pos) = stacks.iter().position(|s| s.len() != available) {
            bail!(
                "{}: variable '{}' has {} time steps, '{}' has {}",
                item,
                job.variables[pos],
                stacks[pos].len(),
                job.variables[0],
                available
            );
        }

        let keep = selection.count(available);
        if keep == 0 {
            warn!(item = %item, "Item has no time steps");
            continue;
        }

        // Regroup per step: one grid per variable
        let mut steps: Vec<Vec<GeoGrid>> = (0..keep)
            .map(|_| Vec::with_capacity(stacks.len()))
            .collect();
        let mut times = Vec::with_capacity(keep);
        for (v, stack) in stacks.into_iter().enumerate() {
            for (k, timed) in stack.into_iter().take(keep).enumerate() {
                if v == 0 {
                    times.push(timed.time);
                }
                steps[k].push(timed.grid);
            }
        }

        for (grids, time) in steps.iter().zip(times) {
            let grid = sum_grids(grids).with_context(|| format!("Failed to sum variables of {}", item))?;
            let points = extractor
                .extract(&grid, bbox, domain.crs())
                .with_context(|| format!("Failed to extract {}", item))?;
            if points.is_empty() {
                warn!(item = %item, time = ?time, "No grid points inside the domain bounding box");
            }
            debug!(item = %item, time = ?time, points = points.len(), "Extracted step");
            series.push(points);
        }
    }

    info!(steps = series.len(), "Collected time series");
    Ok(series)
}
