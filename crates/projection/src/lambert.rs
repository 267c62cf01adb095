//! Lambert Conformal Conic projection (ellipsoidal).
//!
//! A cone secant to the ellipsoid along two standard parallels (or tangent
//! along one) is unrolled onto the plane. Used by many national grids, e.g.
//! RGF93 / Lambert-93 and ETRS89 / LCC Europe.
//!
//! The projection parameters are:
//! - Latitude of origin (lat0) and central meridian (lon0)
//! - Standard parallels latin1 / latin2 (equal for a tangent cone)
//! - Scale factor at the standard parallel of a tangent cone (k0)
//! - False easting / false northing
//! - Reference ellipsoid

use std::f64::consts::PI;

use forcing_common::ProjectedCrs;

use crate::ellipsoid::Ellipsoid;

const MAX_ITERATIONS: usize = 15;

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Scale factor
    pub k0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Reference ellipsoid
    pub ellipsoid: Ellipsoid,
    /// First eccentricity
    e: f64,
    /// Cone constant
    n: f64,
    /// a * F * k0
    af: f64,
    /// Radius of the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from its defining parameters (degrees, meters).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let e = ellipsoid.eccentricity();
        let phi1 = latin1_deg.to_radians();
        let phi2 = latin2_deg.to_radians();
        let m = |phi: f64| phi.cos() / (1.0 - (e * phi.sin()).powi(2)).sqrt();

        // Cone constant: tangent cone when both parallels coincide
        let n = if (phi1 - phi2).abs() < 1e-10 {
            phi1.sin()
        } else {
            (m(phi1).ln() - m(phi2).ln())
                / (conformal_t(phi1, e).ln() - conformal_t(phi2, e).ln())
        };
        let f = m(phi1) / (n * conformal_t(phi1, e).powf(n));
        let af = ellipsoid.a * f * k0;
        let rho0 = af * conformal_t(lat0_deg.to_radians(), e).powf(n);

        Self {
            lon0: lon0_deg.to_radians(),
            k0,
            false_easting,
            false_northing,
            ellipsoid,
            e,
            n,
            af,
            rho0,
        }
    }

    /// Lambert Conformal Conic from explicit parameters.
    pub fn from_params(params: &ProjectedCrs) -> Self {
        Self::new(
            params.lat_0,
            params.lon_0,
            params.lat_1,
            params.lat_2,
            params.k_0,
            params.x_0,
            params.y_0,
            Ellipsoid::from(params.spheroid),
        )
    }

    /// Cone constant `n`.
    pub fn cone_constant(&self) -> f64 {
        self.n
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

        let rho = self.af * conformal_t(lat_deg.to_radians(), self.e).powf(self.n);
        let theta = self.n * dlon;

        let x = self.false_easting + rho * theta.sin();
        let y = self.false_northing + self.rho0 - rho * theta.cos();
        (x, y)
    }

    /// Convert (easting, northing) in meters back to (lat, lon) in degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let dx = easting - self.false_easting;
        let dy = self.rho0 - (northing - self.false_northing);

        // rho and af share the sign of n
        let sign = self.n.signum();
        let rho = sign * (dx * dx + dy * dy).sqrt();
        let theta = (sign * dx).atan2(sign * dy);
        let t = (rho / self.af).powf(1.0 / self.n);

        let mut phi = PI / 2.0 - 2.0 * t.atan();
        for _ in 0..MAX_ITERATIONS {
            let es = self.e * phi.sin();
            let next = PI / 2.0 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(self.e / 2.0)).atan();
            let done = (next - phi).abs() < 1e-12;
            phi = next;
            if done {
                break;
            }
        }

        let lon = theta / self.n + self.lon0;
        (phi.to_degrees(), lon.to_degrees())
    }
}

/// Snyder's `t`: tan(π/4 - φ/2) corrected for the eccentricity.
fn conformal_t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (PI / 4.0 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}
