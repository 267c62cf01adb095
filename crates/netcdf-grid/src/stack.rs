//! Assembly of decoded variables into a stack of timed grids.
//!
//! This part does not touch libnetcdf: the native reader fills in
//! [`RawVariable`]s and hands them over, which keeps the unpacking and
//! slicing rules testable on their own.

use forcing_common::{CfTimeUnits, GeoGrid, TimedGrid};
use tracing::{debug, warn};

use crate::error::{NetCdfError, NetCdfResult};

/// One grid per time index, in file order.
pub type GridStack = Vec<TimedGrid>;

/// Packing and metadata attributes of a variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableAttrs {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub units: Option<String>,
}

/// A variable as stored: dimension names, shape and row-major raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
    pub attrs: VariableAttrs,
}

impl RawVariable {
    /// Values with fill / missing markers turned into NaN and packing undone.
    pub fn unpacked(&self) -> Vec<f64> {
        let scale = self.attrs.scale_factor.unwrap_or(1.0);
        let offset = self.attrs.add_offset.unwrap_or(0.0);
        let is_marker = |v: f64| {
            self.attrs.fill_value.map_or(false, |f| v == f)
                || self.attrs.missing_value.map_or(false, |m| v == m)
        };

        self.values
            .iter()
            .map(|&v| {
                if is_marker(v) {
                    f64::NAN
                } else {
                    v * scale + offset
                }
            })
            .collect()
    }
}

/// Build the grid stack of `data`, attaching every coordinate variable whose
/// dimensions all belong to `data`.
///
/// When `data` has a `time_dim` dimension the result holds one grid per
/// index along it, stamped from the matching coordinate's CF units when
/// present. Otherwise a single untimed grid is returned.
pub fn build_stack(
    data: &RawVariable,
    coords: &[RawVariable],
    time_dim: &str,
) -> NetCdfResult<GridStack> {
    let mut grid = GeoGrid::new(
        data.name.clone(),
        data.dims.clone(),
        data.shape.clone(),
        data.unpacked(),
    )?;

    let mut times: Option<Vec<f64>> = None;
    let mut time_units: Option<String> = None;
    for coord in coords {
        if coord.name == data.name || !coord.dims.iter().all(|d| data.dims.contains(d)) {
            continue;
        }
        if coord.name == time_dim {
            times = Some(coord.values.clone());
            time_units = coord.attrs.units.clone();
        }
        grid = grid.with_coord(coord.name.clone(), coord.dims.clone(), coord.unpacked())?;
    }

    if grid.dim_index(time_dim).is_none() {
        return Ok(vec![TimedGrid { time: None, grid }]);
    }

    let units = match time_units.as_deref().map(CfTimeUnits::parse) {
        Some(Ok(units)) => Some(units),
        Some(Err(e)) => {
            warn!(variable = %data.name, error = %e, "Ignoring unreadable time units");
            None
        }
        None => None,
    };
    let steps = grid.dim_len(time_dim).unwrap_or(0);
    let mut stack = Vec::with_capacity(steps);
    for index in 0..steps {
        let time = match (&units, &times) {
            (Some(units), Some(values)) => {
                let raw = values.get(index).copied().ok_or_else(|| {
                    NetCdfError::InvalidFormat(format!(
                        "time coordinate shorter than dimension '{}'",
                        time_dim
                    ))
                })?;
                let time = units.to_datetime(raw);
                if time.is_none() {
                    warn!(variable = %data.name, index, value = raw, "Time value out of range, step left untimed");
                }
                time
            }
            _ => None,
        };
        stack.push(TimedGrid {
            time,
            grid: grid.select(time_dim, index)?,
        });
    }

    debug!(
        variable = %data.name,
        steps = stack.len(),
        timed = units.is_some(),
        "Built grid stack"
    );
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(name: &str, dims: &[&str], shape: &[usize], values: Vec<f64>) -> RawVariable {
        RawVariable {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            shape: shape.to_vec(),
            values,
            attrs: VariableAttrs::default(),
        }
    }

    fn rain_with_time() -> (RawVariable, Vec<RawVariable>) {
        let rain = raw(
            "rain",
            &["time", "lat", "lon"],
            &[2, 1, 2],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let mut time = raw("time", &["time"], &[2], vec![0.0, 1.0]);
        time.attrs.units = Some("hours since 2024-01-15 00:00:00".to_string());
        let coords = vec![
            time,
            raw("lat", &["lat"], &[1], vec![41.5]),
            raw("lon", &["lon"], &[2], vec![44.0, 44.5]),
        ];
        (rain, coords)
    }

    #[test]
    fn test_unpacking() {
        let mut var = raw("rain", &["x"], &[4], vec![-999.0, 10.0, 20.0, 32767.0]);
        var.attrs.fill_value = Some(-999.0);
        var.attrs.missing_value = Some(32767.0);
        var.attrs.scale_factor = Some(0.1);
        var.attrs.add_offset = Some(1.0);

        let values = var.unpacked();
        assert!(values[0].is_nan());
        assert!((values[1] - 2.0).abs() < 1e-12);
        assert!((values[2] - 3.0).abs() < 1e-12);
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_stack_per_time_index() {
        let (rain, coords) = rain_with_time();
        let stack = build_stack(&rain, &coords, "time").unwrap();

        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0].time, Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()));
        assert_eq!(stack[1].time, Some(Utc.with_ymd_and_hms(2024, 1, 15, 1, 0, 0).unwrap()));
        assert_eq!(stack[1].grid.values(), &[3.0, 4.0]);
        assert_eq!(stack[1].grid.dims(), &["lat".to_string(), "lon".to_string()]);
        assert!(stack[1].grid.coord("time").is_none());
        assert_eq!(stack[1].grid.coord("lon").unwrap().values, vec![44.0, 44.5]);
    }

    #[test]
    fn test_time_without_units_is_untimed() {
        let (rain, mut coords) = rain_with_time();
        coords[0].attrs.units = None;
        let stack = build_stack(&rain, &coords, "time").unwrap();
        assert_eq!(stack.len(), 2);
        assert!(stack.iter().all(|s| s.time.is_none()));
    }

    #[test]
    fn test_no_time_dimension() {
        let rain = raw("rain", &["lat", "lon"], &[1, 2], vec![1.0, 2.0]);
        let coords = vec![
            raw("lat", &["lat"], &[1], vec![41.5]),
            raw("lon", &["lon"], &[2], vec![44.0, 44.5]),
            raw("level", &["level"], &[3], vec![0.0, 1.0, 2.0]),
        ];
        let stack = build_stack(&rain, &coords, "time").unwrap();
        assert_eq!(stack.len(), 1);
        assert!(stack[0].time.is_none());
        assert!(stack[0].grid.coord("level").is_none());
    }

    #[test]
    fn test_point_layout_keeps_parallel_coordinates() {
        let rain = raw("rain", &["time", "cell"], &[1, 3], vec![0.1, 0.2, 0.3]);
        let coords = vec![
            raw("latitude", &["cell"], &[3], vec![41.0, 41.5, 42.0]),
            raw("longitude", &["cell"], &[3], vec![44.0, 44.5, 45.0]),
        ];
        let stack = build_stack(&rain, &coords, "time").unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].grid.coord("latitude").unwrap().dims, vec!["cell".to_string()]);
    }

    #[test]
    fn test_shape_mismatch() {
        let rain = raw("rain", &["lat", "lon"], &[2, 2], vec![1.0, 2.0]);
        assert!(matches!(build_stack(&rain, &[], "time"), Err(NetCdfError::Grid(_))));
    }

    #[test]
    fn test_bad_time_units() {
        let (rain, mut coords) = rain_with_time();
        coords[0].attrs.units = Some("fortnights after lunch".to_string());
        let stack = build_stack(&rain, &coords, "time").unwrap();
        assert_eq!(stack.len(), 2);
        assert!(stack.iter().all(|step| step.time.is_none()));
    }

    #[test]
    fn test_fill_valued_time_is_untimed() {
        let (rain, mut coords) = rain_with_time();
        coords[0].values[1] = 9.969_209_968_386_869e36;
        coords[0].attrs.fill_value = Some(9.969_209_968_386_869e36);

        let stack = build_stack(&rain, &coords, "time").unwrap();
        assert_eq!(stack.len(), 2);
        assert!(stack[0].time.is_some());
        assert_eq!(stack[1].time, None);
    }
}
