//! CRS-to-CRS transformer.
//!
//! Every transform pivots through geographic coordinates: the source CRS is
//! unprojected to (lat, lon), then projected into the target CRS.

use forcing_common::{CrsCode, ProjectionMethod};
use thiserror::Error;

use crate::lambert::LambertConformal;
use crate::mercator::{WebMercator, MAX_LATITUDE};
#[cfg(feature = "proj")]
use crate::proj_backend::ProjBackend;
use crate::transverse_mercator::TransverseMercator;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    #[error("coordinate ({0}, {1}) is outside the domain of {2}")]
    OutOfDomain(f64, f64, CrsCode),

    #[error("{0} is not a geographic CRS")]
    NotGeographic(CrsCode),

    #[error("{0} has no built-in projection; build with the `proj` feature to use it")]
    Unsupported(CrsCode),

    #[error("PROJ could not set up {crs}: {reason}")]
    Backend { crs: CrsCode, reason: String },
}

/// A projection bound to a CRS.
#[derive(Debug, Clone)]
pub enum Projection {
    Geographic,
    WebMercator(WebMercator),
    TransverseMercator(TransverseMercator),
    LambertConformal(LambertConformal),
    /// Any CRS the PROJ database knows
    #[cfg(feature = "proj")]
    Proj(ProjBackend),
}

impl Projection {
    pub fn for_crs(crs: CrsCode) -> Result<Self, ProjectionError> {
        Ok(match crs {
            CrsCode::Epsg4326 => Projection::Geographic,
            CrsCode::Epsg3857 => Projection::WebMercator(WebMercator::default()),
            CrsCode::Utm {
                zone,
                hemisphere,
                datum,
            } => Projection::TransverseMercator(TransverseMercator::utm(zone, hemisphere, datum)),
            CrsCode::Projected(params) => match params.method {
                ProjectionMethod::TransverseMercator => {
                    Projection::TransverseMercator(TransverseMercator::from_params(&params))
                }
                ProjectionMethod::LambertConformalConic => {
                    Projection::LambertConformal(LambertConformal::from_params(&params))
                }
            },
            #[cfg(feature = "proj")]
            CrsCode::Epsg(_) => Projection::Proj(ProjBackend::new(crs)?),
            #[cfg(not(feature = "proj"))]
            CrsCode::Epsg(_) => return Err(ProjectionError::Unsupported(crs)),
        })
    }

    /// (lat, lon) in degrees to (x, y). Geographic output is (lon, lat).
    pub fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let xy = match self {
            Projection::Geographic => (lon, lat),
            Projection::WebMercator(proj) => {
                if lat.abs() > MAX_LATITUDE {
                    return None;
                }
                proj.forward(lat, lon)
            }
            Projection::TransverseMercator(proj) => proj.forward(lat, lon),
            Projection::LambertConformal(proj) => proj.forward(lat, lon),
            #[cfg(feature = "proj")]
            Projection::Proj(backend) => backend.forward(lat, lon)?,
        };
        finite(xy)
    }

    /// (x, y) to (lat, lon) in degrees. Geographic input is (lon, lat).
    pub fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let latlon = match self {
            Projection::Geographic => (y, x),
            Projection::WebMercator(proj) => proj.inverse(x, y),
            Projection::TransverseMercator(proj) => proj.inverse(x, y),
            Projection::LambertConformal(proj) => proj.inverse(x, y),
            #[cfg(feature = "proj")]
            Projection::Proj(backend) => backend.inverse(x, y)?,
        };
        if latlon.0.abs() > 90.0 {
            return None;
        }
        finite(latlon)
    }
}

fn finite((a, b): (f64, f64)) -> Option<(f64, f64)> {
    (a.is_finite() && b.is_finite()).then_some((a, b))
}

/// Transforms coordinates from one CRS to another.
///
/// Coordinates are passed in (x, y) order, where x is the longitude for a
/// geographic CRS and the easting for a projected one.
#[derive(Debug, Clone)]
pub struct Transformer {
    source: CrsCode,
    target: CrsCode,
    source_proj: Projection,
    target_proj: Projection,
}

impl Transformer {
    /// Fails when either CRS has no available projection.
    pub fn from_crs(source: CrsCode, target: CrsCode) -> Result<Self, ProjectionError> {
        Ok(Self {
            source,
            target,
            source_proj: Projection::for_crs(source)?,
            target_proj: Projection::for_crs(target)?,
        })
    }

    pub fn source(&self) -> CrsCode {
        self.source
    }

    pub fn target(&self) -> CrsCode {
        self.target
    }

    /// The transformer going the other way.
    pub fn inverse(&self) -> Transformer {
        Transformer {
            source: self.target,
            target: self.source,
            source_proj: self.target_proj.clone(),
            target_proj: self.source_proj.clone(),
        }
    }

    /// Transform an (x, y) pair from the source CRS into the target CRS.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let (lat, lon) = self
            .source_proj
            .unproject(x, y)
            .ok_or(ProjectionError::OutOfDomain(x, y, self.source))?;
        self.target_proj
            .project(lat, lon)
            .ok_or(ProjectionError::OutOfDomain(x, y, self.target))
    }

    /// Project a geographic (lat, lon) pair into the target CRS.
    ///
    /// Only valid when the source CRS is geographic. Latitude comes first,
    /// following the EPSG:4326 axis order.
    pub fn transform_latlon(&self, lat: f64, lon: f64) -> Result<(f64, f64), ProjectionError> {
        if !self.source.is_geographic() {
            return Err(ProjectionError::NotGeographic(self.source));
        }
        self.target_proj
            .project(lat, lon)
            .ok_or(ProjectionError::OutOfDomain(lon, lat, self.target))
    }
}
