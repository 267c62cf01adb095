//! End-to-end tests of bounding-box extraction and series preparation.

use extraction::{extract, sum_grids, to_increments, CoordinateConvention, Extractor, ExtractorConfig, GridLayout};
use forcing_common::{CrsCode, GeoBoundingBox, Hemisphere};
use projection::Transformer;
use test_utils::{
    assert_position_approx_eq, bbox, cumulative_rain_steps, indexed_mesh, point_grid,
    regular_axis,
};

fn tbilisi() -> GeoBoundingBox {
    let (min_lon, min_lat, max_lon, max_lat) = bbox::TBILISI;
    GeoBoundingBox::new(min_lon, min_lat, max_lon, max_lat)
}

fn utm38() -> CrsCode {
    CrsCode::utm(38, Hemisphere::North).unwrap()
}

// ============================================================================
// Bounding box semantics
// ============================================================================

#[test]
fn test_points_on_box_edges_are_kept() {
    // 0.25 degree mesh from 40.5 to 42.5 / 43.5 to 45.5
    let grid = indexed_mesh("rain", regular_axis(40.5, 0.25, 9), regular_axis(43.5, 0.25, 9));
    let points = extract(&grid, &tbilisi(), CrsCode::Epsg4326).unwrap();

    // 41.0..=42.0 and 44.0..=45.0 -> 5 x 5
    assert_eq!(points.len(), 25);
    assert!(points.iter().any(|p| p.y == 42.0 && p.x == 44.0));
    assert!(points.iter().all(|p| (41.0..=42.0).contains(&p.y)));
    assert!(points.iter().all(|p| (44.0..=45.0).contains(&p.x)));
}

#[test]
fn test_point_outside_box_is_excluded() {
    let grid = point_grid("rain", &[(41.5, 44.5, 1.0), (42.0001, 44.5, 2.0), (41.5, 45.5, 3.0)]);
    let config = ExtractorConfig::new(CoordinateConvention::latitude_longitude(), GridLayout::Points);

    let points = Extractor::new(config).extract(&grid, &tbilisi(), utm38()).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, 1.0);
}

#[test]
fn test_values_follow_their_cells() {
    let grid = indexed_mesh("rain", regular_axis(40.0, 1.0, 4), regular_axis(43.0, 1.0, 4));
    let points = extract(&grid, &tbilisi(), CrsCode::Epsg4326).unwrap();

    // lat 41 -> row 1, lat 42 -> row 2; lon 44 -> col 1, lon 45 -> col 2
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![1001.0, 1002.0, 2001.0, 2002.0]);
}

// ============================================================================
// Reprojection
// ============================================================================

#[test]
fn test_latitude_and_longitude_are_not_swapped() {
    let grid = point_grid("rain", &[(41.7, 44.8, 0.5)]);
    let config = ExtractorConfig::new(CoordinateConvention::latitude_longitude(), GridLayout::Auto);

    let points = Extractor::new(config).extract(&grid, &tbilisi(), utm38()).unwrap();
    assert_eq!(points.len(), 1);
    let p = points[0];
    assert!(p.x > 483_200.0 && p.x < 483_500.0, "easting {}", p.x);
    assert!(p.y > 4_616_300.0 && p.y < 4_616_700.0, "northing {}", p.y);
}

#[test]
fn test_projected_points_invert_to_source() {
    let lats = regular_axis(41.0, 0.2, 6);
    let lons = regular_axis(44.0, 0.2, 6);
    let grid = indexed_mesh("rain", lats, lons);
    let points = extract(&grid, &tbilisi(), utm38()).unwrap();
    assert_eq!(points.len(), 36);

    let back = Transformer::from_crs(utm38(), CrsCode::Epsg4326).unwrap();
    let (lon, lat) = back.transform(points[7].x, points[7].y).unwrap();
    // index 7 -> row 1, col 1
    assert_position_approx_eq!((lat, lon), (41.2, 44.2), 1e-7);
}

// ============================================================================
// Series preparation
// ============================================================================

#[test]
fn test_cumulative_forecast_becomes_increments() {
    let start = chrono::DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let steps = cumulative_rain_steps(start, 4, vec![41.5], vec![44.25, 44.75], 2.0);

    let series: Vec<_> = steps
        .iter()
        .map(|s| extract(&s.grid, &tbilisi(), utm38()).unwrap())
        .collect();
    let increments = to_increments(&series).unwrap();

    assert_eq!(increments.len(), 3);
    for step in &increments {
        assert_eq!(step.len(), 2);
        assert!(step.iter().all(|p| p.value == 2.0));
    }
    assert_eq!(increments[0][1].x, series[1][1].x);
}

#[test]
fn test_summed_variables_extract_like_one() {
    let lats = regular_axis(41.0, 0.5, 3);
    let lons = regular_axis(44.0, 0.5, 3);
    let convective = indexed_mesh("rainc", lats.clone(), lons.clone());
    let large_scale = indexed_mesh("rainnc", lats, lons);

    let total = sum_grids(&[convective.clone(), large_scale]).unwrap();
    let summed = extract(&total, &tbilisi(), CrsCode::Epsg4326).unwrap();
    let single = extract(&convective, &tbilisi(), CrsCode::Epsg4326).unwrap();

    assert_eq!(summed.len(), single.len());
    for (s, c) in summed.iter().zip(&single) {
        assert_eq!(s.value, 2.0 * c.value);
        assert_eq!((s.x, s.y), (c.x, c.y));
    }
}
