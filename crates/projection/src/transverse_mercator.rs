//! Transverse Mercator projection (ellipsoidal).
//!
//! Uses the Krüger series in the third flattening `n`, truncated at third
//! order, which is accurate to well below a millimetre inside a UTM zone.
//!
//! The projection parameters are:
//! - Latitude of origin (lat0)
//! - Central meridian (lon0)
//! - Scale factor on the central meridian (k0)
//! - False easting / false northing
//! - Reference ellipsoid

use std::f64::consts::PI;

use forcing_common::{Datum, Hemisphere, ProjectedCrs};

use crate::ellipsoid::Ellipsoid;

/// UTM scale factor on the central meridian.
pub const UTM_SCALE_FACTOR: f64 = 0.9996;
/// UTM false easting (meters).
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for the southern hemisphere (meters).
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Reference ellipsoid
    pub ellipsoid: Ellipsoid,
    /// Northing of the latitude of origin before scaling and offsets
    xi0: f64,
    /// Rectifying radius
    a_rect: f64,
    /// First eccentricity
    e: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl TransverseMercator {
    /// Create a projection from its defining parameters.
    ///
    /// # Arguments
    /// * `lat0_deg` - Latitude of origin (degrees)
    /// * `lon0_deg` - Central meridian (degrees)
    /// * `k0` - Scale factor on the central meridian
    /// * `false_easting` - meters
    /// * `false_northing` - meters
    /// * `ellipsoid` - Reference ellipsoid
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let n = ellipsoid.third_flattening();
        let n2 = n * n;
        let n3 = n2 * n;

        let a_rect = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
            61.0 * n3 / 240.0,
        ];
        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
            n2 / 48.0 + n3 / 15.0,
            17.0 * n3 / 480.0,
        ];
        let delta = [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
            56.0 * n3 / 15.0,
        ];

        let mut proj = Self {
            lon0: lon0_deg.to_radians(),
            k0,
            false_easting,
            false_northing,
            ellipsoid,
            xi0: 0.0,
            a_rect,
            e: ellipsoid.eccentricity(),
            alpha,
            beta,
            delta,
        };
        proj.xi0 = proj.krueger_xi_eta(lat0_deg.to_radians(), 0.0).0;
        proj
    }

    /// Transverse Mercator from explicit parameters.
    pub fn from_params(params: &ProjectedCrs) -> Self {
        Self::new(
            params.lat_0,
            params.lon_0,
            params.k_0,
            params.x_0,
            params.y_0,
            Ellipsoid::from(params.spheroid),
        )
    }

    /// Standard UTM zone projection.
    ///
    /// Zone `z` has its central meridian at `6z - 183` degrees.
    pub fn utm(zone: u8, hemisphere: Hemisphere, datum: Datum) -> Self {
        let lon0 = zone as f64 * 6.0 - 183.0;
        let false_northing = match hemisphere {
            Hemisphere::North => 0.0,
            Hemisphere::South => UTM_FALSE_NORTHING_SOUTH,
        };
        Self::new(
            0.0,
            lon0,
            UTM_SCALE_FACTOR,
            UTM_FALSE_EASTING,
            false_northing,
            Ellipsoid::for_datum(datum),
        )
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    /// Convert geographic coordinates (degrees) to (easting, northing) in meters.
    pub fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        // Normalize longitude difference to [-π, π]
        let mut dlon = lon_deg.to_radians() - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let (xi, eta) = self.krueger_xi_eta(lat_deg.to_radians(), dlon);
        let easting = self.false_easting + self.k0 * self.a_rect * eta;
        let northing = self.false_northing + self.k0 * self.a_rect * (xi - self.xi0);
        (easting, northing)
    }

    /// Unscaled (xi, eta) of latitude `phi` at `dlon` from the central meridian.
    fn krueger_xi_eta(&self, phi: f64, dlon: f64) -> (f64, f64) {
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - self.e * (self.e * sin_phi).atanh()).sinh();
        let xi_p = t.atan2(dlon.cos());
        let eta_p = (dlon.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        (xi, eta)
    }

    /// Convert (easting, northing) in meters back to (lat, lon) in degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let xi = (northing - self.false_northing) / (self.k0 * self.a_rect) + self.xi0;
        let eta = (easting - self.false_easting) / (self.k0 * self.a_rect);

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut phi = chi;
        for (j, d) in self.delta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            phi += d * (k * chi).sin();
        }

        let lon = self.lon0 + eta_p.sinh().atan2(xi_p.cos());
        (phi.to_degrees(), lon.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm38n() -> TransverseMercator {
        TransverseMercator::utm(38, Hemisphere::North, Datum::Wgs84)
    }

    #[test]
    fn test_central_meridian() {
        assert!((utm38n().central_meridian() - 45.0).abs() < 1e-12);
        let zone31 = TransverseMercator::utm(31, Hemisphere::North, Datum::Wgs84);
        assert!((zone31.central_meridian() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_origin_on_equator() {
        let (e, n) = utm38n().forward(0.0, 45.0);
        assert!((e - 500_000.0).abs() < 1e-6, "easting {}", e);
        assert!(n.abs() < 1e-6, "northing {}", n);
    }

    #[test]
    fn test_southern_false_northing() {
        let proj = TransverseMercator::utm(33, Hemisphere::South, Datum::Wgs84);
        let (e, n) = proj.forward(0.0, 15.0);
        assert!((e - 500_000.0).abs() < 1e-6);
        assert!((n - 10_000_000.0).abs() < 1e-6);

        let (_, n) = proj.forward(-30.0, 15.0);
        assert!(n < 10_000_000.0 && n > 6_000_000.0);
    }

    #[test]
    fn test_known_point_tbilisi_area() {
        // 41.7N 44.8E, 0.2 degrees west of the zone 38 central meridian
        let (e, n) = utm38n().forward(41.7, 44.8);
        assert!(e > 483_200.0 && e < 483_500.0, "easting {}", e);
        assert!(n > 4_616_300.0 && n < 4_616_700.0, "northing {}", n);
    }

    #[test]
    fn test_roundtrip() {
        let proj = utm38n();
        for &(lat, lon) in &[(41.7, 44.8), (38.0, 42.1), (45.5, 47.9), (0.5, 45.0)] {
            let (e, n) = proj.forward(lat, lon);
            let (lat2, lon2) = proj.inverse(e, n);
            assert!((lat - lat2).abs() < 1e-8, "lat roundtrip {} vs {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-8, "lon roundtrip {} vs {}", lon, lon2);
        }
    }

    #[test]
    fn test_british_national_grid() {
        // OSGB 1936 / British National Grid on the Airy 1830 ellipsoid
        let airy = Ellipsoid {
            a: 6377563.396,
            f: 1.0 / 299.3249646,
        };
        let proj = TransverseMercator::new(49.0, -2.0, 0.9996012717, 400_000.0, -100_000.0, airy);

        let (e, n) = proj.forward(49.0, -2.0);
        assert!((e - 400_000.0).abs() < 1e-6 && (n + 100_000.0).abs() < 1e-6);

        let (e, n) = proj.forward(50.5, 0.5);
        assert!((e - 577_274.99).abs() < 0.05, "easting {}", e);
        assert!((n - 69_740.50).abs() < 0.05, "northing {}", n);

        let (lat, lon) = proj.inverse(e, n);
        assert!((lat - 50.5).abs() < 1e-9 && (lon - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_about_central_meridian() {
        let proj = utm38n();
        let (e_west, n_west) = proj.forward(40.0, 44.0);
        let (e_east, n_east) = proj.forward(40.0, 46.0);
        assert!(((e_west - 500_000.0) + (e_east - 500_000.0)).abs() < 1e-6);
        assert!((n_west - n_east).abs() < 1e-6);
    }
}
