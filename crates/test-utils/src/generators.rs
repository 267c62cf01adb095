//! Test data generators for creating synthetic rainfall data.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite.

use chrono::{DateTime, Duration, Utc};
use forcing_common::{ExtractedPoint, GeoGrid, TimedGrid};

/// Evenly spaced axis values: `start, start + step, ...` (`n` values).
///
/// Values are computed by multiplication so that repeated steps do not
/// accumulate rounding error.
///
/// # Example
///
/// ```
/// use test_utils::regular_axis;
///
/// assert_eq!(regular_axis(41.0, 0.5, 3), vec![41.0, 41.5, 42.0]);
/// ```
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Creates values with a predictable pattern.
///
/// Each cell value is calculated as: `lat_index * 1000 + lon_index`, stored
/// latitude-major. This makes it easy to verify which source cell a value
/// came from after extraction.
///
/// # Example
///
/// ```
/// use test_utils::create_indexed_values;
///
/// let values = create_indexed_values(2, 3);
/// assert_eq!(values, vec![0.0, 1.0, 2.0, 1000.0, 1001.0, 1002.0]);
/// ```
pub fn create_indexed_values(n_lat: usize, n_lon: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(n_lat * n_lon);
    for i in 0..n_lat {
        for j in 0..n_lon {
            data.push((i * 1000 + j) as f64);
        }
    }
    data
}

/// Creates deterministic pseudo-random rainfall amounts in mm.
///
/// Most cells are dry; roughly one in four carries up to 50 mm.
pub fn create_precipitation_values(n_lat: usize, n_lon: usize, seed: u32) -> Vec<f64> {
    let mut data = Vec::with_capacity(n_lat * n_lon);
    for i in 0..n_lat {
        for j in 0..n_lon {
            let hash = simple_hash(j as u32, i as u32, seed);
            let precip = if hash % 4 == 0 {
                (hash % 5000) as f64 / 100.0
            } else {
                0.0
            };
            data.push(precip);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// A `lat` / `lon` mesh carrying [`create_indexed_values`].
pub fn indexed_mesh(variable: &str, lats: Vec<f64>, lons: Vec<f64>) -> GeoGrid {
    let values = create_indexed_values(lats.len(), lons.len());
    GeoGrid::mesh(variable, ("lat", lats), ("lon", lons), values)
        .expect("indexed mesh has consistent shape")
}

/// A `lat` / `lon` mesh filled with a constant value.
pub fn constant_mesh(variable: &str, lats: Vec<f64>, lons: Vec<f64>, value: f64) -> GeoGrid {
    let values = vec![value; lats.len() * lons.len()];
    GeoGrid::mesh(variable, ("lat", lats), ("lon", lons), values)
        .expect("constant mesh has consistent shape")
}

/// A `latitude` / `longitude` point grid built from `(lat, lon, value)` triples.
pub fn point_grid(variable: &str, points: &[(f64, f64, f64)]) -> GeoGrid {
    let lats = points.iter().map(|p| p.0).collect();
    let lons = points.iter().map(|p| p.1).collect();
    let values = points.iter().map(|p| p.2).collect();
    GeoGrid::points(variable, ("latitude", lats), ("longitude", lons), values)
        .expect("point grid has parallel arrays")
}

/// Hourly grids whose values accumulate: step `k` holds `k * rate` everywhere.
///
/// Mimics a forecast product that reports totals since model start.
pub fn cumulative_rain_steps(
    start: DateTime<Utc>,
    steps: usize,
    lats: Vec<f64>,
    lons: Vec<f64>,
    rate: f64,
) -> Vec<TimedGrid> {
    (0..steps)
        .map(|k| TimedGrid {
            time: Some(start + Duration::hours(k as i64)),
            grid: constant_mesh("rain", lats.clone(), lons.clone(), k as f64 * rate),
        })
        .collect()
}

/// One extracted step with points spaced 1 km apart along x.
pub fn extracted_step(values: &[f64]) -> Vec<ExtractedPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| ExtractedPoint::new(v, 1000.0 * i as f64, 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_values_pattern() {
        let values = create_indexed_values(3, 4);
        assert_eq!(values.len(), 12);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[5], 1001.0);
        assert_eq!(values[11], 2003.0);
    }

    #[test]
    fn test_precipitation_deterministic() {
        let a = create_precipitation_values(10, 10, 42);
        let b = create_precipitation_values(10, 10, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| (0.0..50.0).contains(&v)));
    }

    #[test]
    fn test_cumulative_steps() {
        let start = DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let steps = cumulative_rain_steps(start, 3, vec![41.0], vec![44.0, 45.0], 1.5);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].grid.values(), &[3.0, 3.0]);
        assert_eq!(steps[1].time, Some(start + Duration::hours(1)));
    }

    #[test]
    fn test_point_grid() {
        let grid = point_grid("rain", &[(41.0, 44.0, 1.0), (42.0, 45.0, 2.0)]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.coord("longitude").unwrap().values, vec![44.0, 45.0]);
    }
}
