//! Operations on grids and extracted series ahead of writing.

use forcing_common::{check_alignment, ExtractedPoint, GeoGrid, TimeSeries};
use tracing::debug;

use crate::error::{ExtractionError, Result};

/// Element-wise sum of grids sharing the same layout.
///
/// Used when a product splits a quantity over several variables (e.g.
/// convective + large-scale precipitation). NaN propagates.
pub fn sum_grids(grids: &[GeoGrid]) -> Result<GeoGrid> {
    let (first, rest) = grids
        .split_first()
        .ok_or_else(|| ExtractionError::invalid_grid("no grids to sum"))?;
    if rest.is_empty() {
        return Ok(first.clone());
    }

    let mut total = first.values().to_vec();
    let mut name = first.variable().to_string();
    for grid in rest {
        if !grid.same_layout(first) {
            return Err(ExtractionError::invalid_grid(format!(
                "cannot sum '{}' {:?} with '{}' {:?}: layouts differ",
                first.variable(),
                first.shape(),
                grid.variable(),
                grid.shape()
            )));
        }
        for (acc, v) in total.iter_mut().zip(grid.values()) {
            *acc += v;
        }
        name.push('+');
        name.push_str(grid.variable());
    }

    Ok(first.with_values(name, total)?)
}

/// Convert a series of cumulative totals into per-step increments.
///
/// Output step `k - 1` holds `v[k] - v[k - 1]` for every point; the first
/// input step has no predecessor and is dropped. All steps must hold the
/// same points in the same order.
pub fn to_increments(series: &TimeSeries) -> Result<TimeSeries> {
    check_alignment(series)?;

    let increments: TimeSeries = series
        .windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(&pair[0])
                .map(|(current, previous)| {
                    ExtractedPoint::new(current.value - previous.value, current.x, current.y)
                })
                .collect()
        })
        .collect();

    debug!(
        input_steps = series.len(),
        output_steps = increments.len(),
        "Converted cumulative series to increments"
    );
    Ok(increments)
}
