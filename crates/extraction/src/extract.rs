//! Bounding-box filtering and reprojection of a single grid.

use forcing_common::{AxisOrder, Coordinate, CrsCode, ExtractedPoint, GeoBoundingBox, GeoGrid};
use projection::Transformer;
use tracing::debug;

use crate::config::{ExtractorConfig, GridLayout};
use crate::error::{ExtractionError, Result};

/// Extract with the default configuration (`lat` / `lon`, inferred layout).
pub fn extract(
    grid: &GeoGrid,
    bbox: &GeoBoundingBox,
    target_crs: CrsCode,
) -> Result<Vec<ExtractedPoint>> {
    Extractor::default().extract(grid, bbox, target_crs)
}

/// Resolved horizontal layout of one grid.
enum Resolved<'a> {
    Mesh {
        lats: &'a [f64],
        lons: &'a [f64],
        axis_order: AxisOrder,
    },
    Points {
        lats: &'a [f64],
        lons: &'a [f64],
    },
}

/// Cuts grids down to a bounding box and reprojects the retained points.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Keep the grid points inside `bbox` (inclusive) and project them into
    /// `target_crs`.
    ///
    /// Mesh grids are filtered per axis and recombined latitude-major; point
    /// grids keep their source order. Returns an empty vector when nothing
    /// falls inside the box.
    pub fn extract(
        &self,
        grid: &GeoGrid,
        bbox: &GeoBoundingBox,
        target_crs: CrsCode,
    ) -> Result<Vec<ExtractedPoint>> {
        let layout = self.resolve(grid)?;
        let transformer = Transformer::from_crs(CrsCode::Epsg4326, target_crs)?;
        let values = grid.values();

        let mut output = Vec::new();
        match layout {
            Resolved::Mesh {
                lats,
                lons,
                axis_order,
            } => {
                let lat_idx: Vec<usize> = (0..lats.len())
                    .filter(|&i| bbox.contains_lat(lats[i]))
                    .collect();
                let lon_idx: Vec<usize> = (0..lons.len())
                    .filter(|&j| bbox.contains_lon(lons[j]))
                    .collect();

                output.reserve(lat_idx.len() * lon_idx.len());
                for &i in &lat_idx {
                    for &j in &lon_idx {
                        let flat = match axis_order {
                            AxisOrder::LatLon => i * lons.len() + j,
                            AxisOrder::LonLat => j * lats.len() + i,
                        };
                        let (x, y) = transformer.transform_latlon(lats[i], lons[j])?;
                        output.push(ExtractedPoint::new(values[flat], x, y));
                    }
                }
            }
            Resolved::Points { lats, lons } => {
                for (k, (&lat, &lon)) in lats.iter().zip(lons).enumerate() {
                    if bbox.contains(lat, lon) {
                        let (x, y) = transformer.transform_latlon(lat, lon)?;
                        output.push(ExtractedPoint::new(values[k], x, y));
                    }
                }
            }
        }

        debug!(
            variable = grid.variable(),
            source_points = grid.len(),
            retained = output.len(),
            target = %target_crs,
            "Extracted grid points inside bounding box"
        );
        Ok(output)
    }

    fn resolve<'a>(&self, grid: &'a GeoGrid) -> Result<Resolved<'a>> {
        let convention = &self.config.convention;
        let lat = coordinate(grid, &convention.latitude)?;
        let lon = coordinate(grid, &convention.longitude)?;

        let layout = match self.config.layout {
            GridLayout::Auto if looks_like_mesh(grid, lat, lon) => GridLayout::Mesh,
            GridLayout::Auto => GridLayout::Points,
            explicit => explicit,
        };

        match layout {
            GridLayout::Mesh => {
                if !looks_like_mesh(grid, lat, lon) {
                    return Err(ExtractionError::invalid_grid(format!(
                        "expected 1-D '{}' and '{}' coordinates spanning the two dimensions of {:?}",
                        convention.latitude,
                        convention.longitude,
                        grid.dims()
                    )));
                }
                let lat_axis = grid.dim_index(&lat.dims[0]).unwrap_or(0);
                let lon_axis = grid.dim_index(&lon.dims[0]).unwrap_or(1);
                let actual = if lat_axis < lon_axis {
                    AxisOrder::LatLon
                } else {
                    AxisOrder::LonLat
                };
                if let Some(pinned) = convention.axis_order {
                    if actual != pinned {
                        return Err(ExtractionError::invalid_grid(format!(
                            "value axes are ordered {:?}, configured {:?}",
                            actual, pinned
                        )));
                    }
                }
                Ok(Resolved::Mesh {
                    lats: &lat.values,
                    lons: &lon.values,
                    axis_order: actual,
                })
            }
            _ => {
                if lat.dims != grid.dims() || lon.dims != grid.dims() {
                    return Err(ExtractionError::invalid_grid(format!(
                        "'{}' / '{}' coordinates do not run parallel to the values {:?}",
                        convention.latitude,
                        convention.longitude,
                        grid.dims()
                    )));
                }
                Ok(Resolved::Points {
                    lats: &lat.values,
                    lons: &lon.values,
                })
            }
        }
    }
}

fn coordinate<'a>(grid: &'a GeoGrid, name: &str) -> Result<&'a Coordinate> {
    grid.coord(name).ok_or_else(|| {
        ExtractionError::invalid_grid(format!(
            "grid '{}' has no '{}' coordinate (available: {})",
            grid.variable(),
            name,
            grid.coord_names().collect::<Vec<_>>().join(", ")
        ))
    })
}

fn looks_like_mesh(grid: &GeoGrid, lat: &Coordinate, lon: &Coordinate) -> bool {
    grid.dims().len() == 2
        && lat.is_1d()
        && lon.is_1d()
        && lat.dims[0] != lon.dims[0]
        && grid.dim_index(&lat.dims[0]).is_some()
        && grid.dim_index(&lon.dims[0]).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoordinateConvention;
    use forcing_common::Hemisphere;

    fn utm38() -> CrsCode {
        CrsCode::utm(38, Hemisphere::North).unwrap()
    }

    fn sample_mesh() -> GeoGrid {
        // lat-major 3 x 3
        GeoGrid::mesh(
            "rain",
            ("lat", vec![41.0, 41.5, 42.0]),
            ("lon", vec![44.0, 44.5, 45.0]),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        )
        .unwrap()
    }

    #[test]
    fn test_mesh_cross_product_is_latitude_major() {
        let bbox = GeoBoundingBox::new(44.5, 41.5, 45.0, 42.0);
        let points = extract(&sample_mesh(), &bbox, CrsCode::Epsg4326).unwrap();

        let got: Vec<(f64, f64, f64)> = points.iter().map(|p| (p.value, p.x, p.y)).collect();
        assert_eq!(
            got,
            vec![
                (5.0, 44.5, 41.5),
                (6.0, 45.0, 41.5),
                (8.0, 44.5, 42.0),
                (9.0, 45.0, 42.0),
            ]
        );
    }

    #[test]
    fn test_mesh_lon_lat_axis_order() {
        // Same data stored [lon, lat]
        let values = vec![1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0];
        let grid = GeoGrid::new("rain", vec!["lon".into(), "lat".into()], vec![3, 3], values)
            .unwrap()
            .with_coord("lat", vec!["lat".into()], vec![41.0, 41.5, 42.0])
            .unwrap()
            .with_coord("lon", vec!["lon".into()], vec![44.0, 44.5, 45.0])
            .unwrap();
        let config = ExtractorConfig::new(
            CoordinateConvention::lat_lon().with_axis_order(AxisOrder::LonLat),
            GridLayout::Mesh,
        );

        let bbox = GeoBoundingBox::new(44.5, 41.5, 45.0, 42.0);
        let values: Vec<f64> = Extractor::new(config)
            .extract(&grid, &bbox, CrsCode::Epsg4326)
            .unwrap()
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![5.0, 6.0, 8.0, 9.0]);
    }

    #[test]
    fn test_unpinned_axis_order_follows_grid_dims() {
        let values = vec![1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0];
        let grid = GeoGrid::new("rain", vec!["lon".into(), "lat".into()], vec![3, 3], values)
            .unwrap()
            .with_coord("lat", vec!["lat".into()], vec![41.0, 41.5, 42.0])
            .unwrap()
            .with_coord("lon", vec!["lon".into()], vec![44.0, 44.5, 45.0])
            .unwrap();

        let bbox = GeoBoundingBox::new(44.5, 41.5, 45.0, 42.0);
        let values: Vec<f64> = extract(&grid, &bbox, CrsCode::Epsg4326)
            .unwrap()
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![5.0, 6.0, 8.0, 9.0]);
    }

    #[test]
    fn test_pinned_axis_order_mismatch_is_invalid_grid() {
        let grid = GeoGrid::new("rain", vec!["lon".into(), "lat".into()], vec![1, 1], vec![0.0])
            .unwrap()
            .with_coord("lat", vec!["lat".into()], vec![41.0])
            .unwrap()
            .with_coord("lon", vec!["lon".into()], vec![44.0])
            .unwrap();
        let config = ExtractorConfig::new(
            CoordinateConvention::lat_lon().with_axis_order(AxisOrder::LatLon),
            GridLayout::Auto,
        );
        let err = Extractor::new(config).extract(&grid, &GeoBoundingBox::new(0.0, 0.0, 90.0, 90.0), utm38());
        assert!(matches!(err, Err(ExtractionError::InvalidGrid(_))));
    }

    #[test]
    fn test_points_keep_source_order() {
        let grid = GeoGrid::points(
            "rain",
            ("latitude", vec![41.2, 45.0, 41.8, 41.5]),
            ("longitude", vec![44.9, 44.9, 44.1, 43.0]),
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let config = ExtractorConfig::new(CoordinateConvention::latitude_longitude(), GridLayout::Auto);
        let bbox = GeoBoundingBox::new(44.0, 41.0, 45.0, 42.0);

        let values: Vec<f64> = Extractor::new(config)
            .extract(&grid, &bbox, utm38())
            .unwrap()
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn test_missing_coordinate_key() {
        let grid = sample_mesh();
        let config = ExtractorConfig::new(CoordinateConvention::latitude_longitude(), GridLayout::Auto);
        let err = Extractor::new(config).extract(&grid, &GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0), utm38());
        assert!(matches!(err, Err(ExtractionError::InvalidGrid(_))));
    }

    #[test]
    fn test_forced_mesh_on_points_is_invalid() {
        let grid = GeoGrid::points("rain", ("lat", vec![41.0]), ("lon", vec![44.0]), vec![1.0])
            .unwrap();
        let config = ExtractorConfig::new(CoordinateConvention::lat_lon(), GridLayout::Mesh);
        let err = Extractor::new(config).extract(&grid, &GeoBoundingBox::new(0.0, 0.0, 90.0, 90.0), utm38());
        assert!(matches!(err, Err(ExtractionError::InvalidGrid(_))));
    }

    #[test]
    fn test_empty_when_box_misses_grid() {
        let bbox = GeoBoundingBox::new(10.0, 10.0, 11.0, 11.0);
        let points = extract(&sample_mesh(), &bbox, utm38()).unwrap();
        assert!(points.is_empty());
    }
}
