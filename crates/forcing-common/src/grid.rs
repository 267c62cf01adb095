//! Georeferenced grids as handed over by the data readers.
//!
//! A [`GeoGrid`] mirrors a labelled n-dimensional array: a flat row-major
//! value buffer, named dimensions with their lengths, and named coordinate
//! arrays spanning one or more of those dimensions. Two horizontal layouts
//! are common:
//!
//! - *mesh*: 1-D `lat` and `lon` coordinates, each on its own dimension
//! - *points*: `lat` and `lon` coordinates parallel to the values (they share
//!   the value array's dimensions)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::GridError;

/// Dimension name used by [`GeoGrid::points`].
pub const POINT_DIM: &str = "point";

/// A coordinate array and the dimensions it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub dims: Vec<String>,
    pub values: Vec<f64>,
}

impl Coordinate {
    /// True when the coordinate spans exactly one dimension.
    pub fn is_1d(&self) -> bool {
        self.dims.len() == 1
    }
}

/// A labelled grid of values with named coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    variable: String,
    dims: Vec<String>,
    shape: Vec<usize>,
    values: Vec<f64>,
    coords: BTreeMap<String, Coordinate>,
}

impl GeoGrid {
    /// Create a grid without coordinates.
    pub fn new(
        variable: impl Into<String>,
        dims: Vec<String>,
        shape: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        if dims.len() != shape.len() {
            return Err(GridError::RankMismatch {
                dims: dims.len(),
                rank: shape.len(),
            });
        }
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(GridError::ShapeMismatch {
                shape,
                actual: values.len(),
            });
        }

        Ok(Self {
            variable: variable.into(),
            dims,
            shape,
            values,
            coords: BTreeMap::new(),
        })
    }

    /// Attach a coordinate spanning `dims` (which must be dimensions of the grid).
    pub fn with_coord(
        mut self,
        name: impl Into<String>,
        dims: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let name = name.into();
        let mut expected = 1;
        for dim in &dims {
            expected *= self
                .dim_len(dim)
                .ok_or_else(|| GridError::UnknownDimension(dim.clone()))?;
        }
        if expected != values.len() {
            return Err(GridError::CoordinateLength {
                name,
                expected,
                actual: values.len(),
            });
        }

        self.coords.insert(name, Coordinate { dims, values });
        Ok(self)
    }

    /// Build a rectangular mesh with values shaped `[lats, lons]` (lat-major).
    pub fn mesh(
        variable: impl Into<String>,
        (lat_key, lats): (&str, Vec<f64>),
        (lon_key, lons): (&str, Vec<f64>),
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let shape = vec![lats.len(), lons.len()];
        Self::new(
            variable,
            vec![lat_key.to_string(), lon_key.to_string()],
            shape,
            values,
        )?
        .with_coord(lat_key, vec![lat_key.to_string()], lats)?
        .with_coord(lon_key, vec![lon_key.to_string()], lons)
    }

    /// Build a grid of scattered points with parallel coordinate arrays.
    pub fn points(
        variable: impl Into<String>,
        (lat_key, lats): (&str, Vec<f64>),
        (lon_key, lons): (&str, Vec<f64>),
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let n = values.len();
        Self::new(variable, vec![POINT_DIM.to_string()], vec![n], values)?
            .with_coord(lat_key, vec![POINT_DIM.to_string()], lats)?
            .with_coord(lon_key, vec![POINT_DIM.to_string()], lons)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.get(name)
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(String::as_str)
    }

    pub fn dim_index(&self, name: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == name)
    }

    pub fn dim_len(&self, name: &str) -> Option<usize> {
        self.dim_index(name).map(|i| self.shape[i])
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same dimensions, shape and coordinates (values may differ).
    pub fn same_layout(&self, other: &GeoGrid) -> bool {
        self.dims == other.dims && self.shape == other.shape && self.coords == other.coords
    }

    /// Copy of this grid carrying different values.
    pub fn with_values(
        &self,
        variable: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        if values.len() != self.values.len() {
            return Err(GridError::ShapeMismatch {
                shape: self.shape.clone(),
                actual: values.len(),
            });
        }
        Ok(Self {
            variable: variable.into(),
            dims: self.dims.clone(),
            shape: self.shape.clone(),
            values,
            coords: self.coords.clone(),
        })
    }

    /// Select one index along `dim`, dropping that dimension.
    ///
    /// Coordinates spanning `dim` are sliced too; a coordinate left without
    /// any dimension (e.g. `time` after selecting a time step) is dropped.
    pub fn select(&self, dim: &str, index: usize) -> Result<GeoGrid, GridError> {
        let axis = self
            .dim_index(dim)
            .ok_or_else(|| GridError::UnknownDimension(dim.to_string()))?;
        let len = self.shape[axis];
        if index >= len {
            return Err(GridError::IndexOutOfRange {
                dim: dim.to_string(),
                index,
                len,
            });
        }

        let values = slice_axis(&self.values, &self.shape, axis, index);
        let mut dims = self.dims.clone();
        let mut shape = self.shape.clone();
        dims.remove(axis);
        shape.remove(axis);

        let mut coords = BTreeMap::new();
        for (name, coord) in &self.coords {
            match coord.dims.iter().position(|d| d == dim) {
                None => {
                    coords.insert(name.clone(), coord.clone());
                }
                Some(coord_axis) => {
                    if coord.dims.len() == 1 {
                        continue;
                    }
                    let coord_shape: Vec<usize> = coord
                        .dims
                        .iter()
                        .map(|d| self.dim_len(d).unwrap_or(0))
                        .collect();
                    let mut coord_dims = coord.dims.clone();
                    coord_dims.remove(coord_axis);
                    coords.insert(
                        name.clone(),
                        Coordinate {
                            dims: coord_dims,
                            values: slice_axis(&coord.values, &coord_shape, coord_axis, index),
                        },
                    );
                }
            }
        }

        Ok(GeoGrid {
            variable: self.variable.clone(),
            dims,
            shape,
            values,
            coords,
        })
    }
}

/// A grid tagged with the time it is valid for, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedGrid {
    pub time: Option<DateTime<Utc>>,
    pub grid: GeoGrid,
}

/// Take the hyperplane `index` along `axis` of a row-major array.
fn slice_axis(values: &[f64], shape: &[usize], axis: usize, index: usize) -> Vec<f64> {
    let outer: usize = shape[..axis].iter().product();
    let len = shape[axis];
    let inner: usize = shape[axis + 1..].iter().product();

    let mut out = Vec::with_capacity(outer * inner);
    for o in 0..outer {
        let start = (o * len + index) * inner;
        out.extend_from_slice(&values[start..start + inner]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mesh_shape() {
        let grid = GeoGrid::mesh(
            "rain",
            ("lat", vec![1.0, 2.0]),
            ("lon", vec![10.0, 11.0, 12.0]),
            vec![0.0; 6],
        )
        .unwrap();
        assert_eq!(grid.shape(), &[2, 3]);
        assert_eq!(grid.dim_len("lon"), Some(3));
        assert!(grid.coord("lat").unwrap().is_1d());
    }

    #[test]
    fn test_shape_mismatch() {
        let err = GeoGrid::mesh(
            "rain",
            ("lat", vec![1.0, 2.0]),
            ("lon", vec![10.0, 11.0]),
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_coordinate_length_mismatch() {
        let err = GeoGrid::points(
            "rain",
            ("lat", vec![1.0, 2.0]),
            ("lon", vec![10.0]),
            vec![0.0, 1.0],
        )
        .unwrap_err();
        assert!(matches!(err, GridError::CoordinateLength { .. }));
    }

    #[test]
    fn test_select_time() {
        // [time=2, lat=2, lon=2]
        let values: Vec<f64> = (0..8).map(f64::from).collect();
        let grid = GeoGrid::new("rain", dims(&["time", "lat", "lon"]), vec![2, 2, 2], values)
            .unwrap()
            .with_coord("time", dims(&["time"]), vec![0.0, 1.0])
            .unwrap()
            .with_coord("lat", dims(&["lat"]), vec![40.0, 41.0])
            .unwrap()
            .with_coord("lon", dims(&["lon"]), vec![9.0, 10.0])
            .unwrap();

        let step = grid.select("time", 1).unwrap();
        assert_eq!(step.dims(), &dims(&["lat", "lon"])[..]);
        assert_eq!(step.values(), &[4.0, 5.0, 6.0, 7.0]);
        assert!(step.coord("time").is_none());
        assert_eq!(step.coord("lat").unwrap().values, vec![40.0, 41.0]);
    }

    #[test]
    fn test_select_slices_2d_coordinates() {
        // [y=2, x=3] with curvilinear lat coordinate
        let grid = GeoGrid::new("rain", dims(&["y", "x"]), vec![2, 3], vec![0.0; 6])
            .unwrap()
            .with_coord("lat", dims(&["y", "x"]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap();

        let column = grid.select("x", 2).unwrap();
        assert_eq!(column.coord("lat").unwrap().values, vec![3.0, 6.0]);
        assert_eq!(column.coord("lat").unwrap().dims, dims(&["y"]));
    }

    #[test]
    fn test_select_out_of_range() {
        let grid = GeoGrid::points("rain", ("lat", vec![1.0]), ("lon", vec![2.0]), vec![3.0])
            .unwrap();
        assert!(matches!(
            grid.select(POINT_DIM, 1),
            Err(GridError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            grid.select("time", 0),
            Err(GridError::UnknownDimension(_))
        ));
    }
}
