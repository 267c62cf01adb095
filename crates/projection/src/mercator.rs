//! Spherical (Web) Mercator projection, EPSG:3857.

use std::f64::consts::PI;

/// Latitude limit of the square Web Mercator world (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web Mercator on a sphere with the WGS84 semi-major axis.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    /// Sphere radius (meters)
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self { radius: 6378137.0 }
    }
}

impl WebMercator {
    /// Half the width of the projected world (meters).
    pub fn max_extent(&self) -> f64 {
        PI * self.radius
    }

    /// Convert (lat, lon) in degrees to (x, y) in meters.
    pub fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let x = self.radius * lon_deg.to_radians();
        let y = self.radius * (PI / 4.0 + lat_deg.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    /// Convert (x, y) in meters to (lat, lon) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0).to_degrees();
        (lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_extent() {
        let proj = WebMercator::default();
        let (x, y) = proj.forward(0.0, 180.0);
        assert!((x - 20037508.342789244).abs() < 1e-6);
        assert!(y.abs() < 1e-9);

        let (_, y) = proj.forward(MAX_LATITUDE, 0.0);
        assert!((y - proj.max_extent()).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip() {
        let proj = WebMercator::default();
        let (x, y) = proj.forward(44.4, 8.9);
        let (lat, lon) = proj.inverse(x, y);
        assert!((lat - 44.4).abs() < 1e-10);
        assert!((lon - 8.9).abs() < 1e-10);
    }
}
