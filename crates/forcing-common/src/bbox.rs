//! Geographic bounding box used to cut grids down to a domain.

use serde::{Deserialize, Serialize};

/// Default buffer (degrees) added around a domain's bounds.
pub const DEFAULT_BUFFER_DEG: f64 = 0.1;

/// A bounding box in geographic coordinates (EPSG:4326, degrees).
///
/// Both bounds are inclusive: a grid point lying exactly on an edge is
/// considered inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse a "min_lon,min_lat,max_lon,max_lat" string.
    pub fn from_bounds_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        Ok(Self {
            min_lon: parse(parts[0])?,
            min_lat: parse(parts[1])?,
            max_lon: parse(parts[2])?,
            max_lat: parse(parts[3])?,
        })
    }

    /// Smallest box enclosing all `(lon, lat)` pairs, or `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (lon, lat) = iter.next()?;
        let mut bbox = Self::new(lon, lat, lon, lat);
        for (lon, lat) in iter {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    /// Expand the box by `buffer` degrees on every side.
    ///
    /// Matches the total bounds of a polygon buffered by `buffer` in
    /// geographic coordinates.
    pub fn buffered(&self, buffer: f64) -> Self {
        Self {
            min_lon: self.min_lon - buffer,
            min_lat: self.min_lat - buffer,
            max_lon: self.max_lon + buffer,
            max_lat: self.max_lat + buffer,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Inclusive latitude test.
    #[inline]
    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat
    }

    /// Inclusive longitude test.
    #[inline]
    pub fn contains_lon(&self, lon: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon
    }

    /// Inclusive point test.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.contains_lat(lat) && self.contains_lon(lon)
    }
}

impl std::fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'min_lon,min_lat,max_lon,max_lat'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds_string() {
        let bbox = GeoBoundingBox::from_bounds_string("44.5, 41.3,45.1,41.9").unwrap();
        assert_eq!(bbox.min_lon, 44.5);
        assert_eq!(bbox.min_lat, 41.3);
        assert_eq!(bbox.max_lon, 45.1);
        assert_eq!(bbox.max_lat, 41.9);
    }

    #[test]
    fn test_buffered() {
        let bbox = GeoBoundingBox::new(10.0, 20.0, 11.0, 21.0).buffered(0.1);
        assert!((bbox.min_lon - 9.9).abs() < 1e-12);
        assert!((bbox.min_lat - 19.9).abs() < 1e-12);
        assert!((bbox.max_lon - 11.1).abs() < 1e-12);
        assert!((bbox.max_lat - 21.1).abs() < 1e-12);
    }

    #[test]
    fn test_from_points() {
        let bbox =
            GeoBoundingBox::from_points(vec![(1.0, 5.0), (-2.0, 7.0), (3.0, 6.0)]).unwrap();
        assert_eq!(bbox, GeoBoundingBox::new(-2.0, 5.0, 3.0, 7.0));
        assert!(GeoBoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(bbox.contains(1.0, 0.0));
        assert!(bbox.contains(0.0, 1.0));
        assert!(!bbox.contains(1.0000001, 0.5));
        assert!(!bbox.contains(0.5, -0.0000001));
    }
}
