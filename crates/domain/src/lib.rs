//! Simulation domain loading.
//!
//! A domain is the set of vertices of a shapefile together with the planar
//! CRS they are expressed in. The exporter uses it for two things: the
//! target CRS of the extracted points, and a buffered geographic bounding
//! box to cut the source grids with.

pub mod error;
pub mod prj;
pub mod shapefile;

use std::fs;
use std::path::Path;

use forcing_common::{CrsCode, GeoBoundingBox};
use projection::Transformer;
use tracing::{debug, info};

pub use error::{DomainError, Result};
pub use prj::crs_from_wkt;
pub use shapefile::{read_vertices, ShapeType};

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    crs: CrsCode,
    vertices: Vec<(f64, f64)>,
}

impl Domain {
    pub fn new(crs: CrsCode, vertices: Vec<(f64, f64)>) -> Self {
        Self { crs, vertices }
    }

    /// Load a domain from a `.shp` file.
    ///
    /// The CRS comes from `crs_override` when given, otherwise from the
    /// `.prj` file next to the shapefile.
    pub fn load(path: impl AsRef<Path>, crs_override: Option<CrsCode>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| DomainError::io(path, e))?;
        let vertices = read_vertices(&data)?;
        if vertices.is_empty() {
            return Err(DomainError::Empty(path.to_path_buf()));
        }

        let crs = match crs_override {
            Some(crs) => crs,
            None => {
                let prj = path.with_extension("prj");
                if !prj.exists() {
                    return Err(DomainError::MissingCrs(path.to_path_buf()));
                }
                let wkt = fs::read_to_string(&prj).map_err(|e| DomainError::io(&prj, e))?;
                crs_from_wkt(&wkt)?
            }
        };

        info!(
            path = %path.display(),
            crs = %crs,
            vertices = vertices.len(),
            "Loaded domain"
        );
        Ok(Self { crs, vertices })
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Bounds of the vertices in the domain CRS as (xmin, ymin, xmax, ymax).
    pub fn projected_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.vertices.first()?;
        let init = (first.0, first.1, first.0, first.1);
        Some(self.vertices.iter().fold(init, |(x0, y0, x1, y1), &(x, y)| {
            (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
        }))
    }

    /// Geographic bounds of the domain, widened by `buffer` degrees on each side.
    ///
    /// Every vertex is taken to EPSG:4326 first, so the box covers the
    /// curved outline of a projected rectangle.
    pub fn geographic_bbox(&self, buffer: f64) -> Result<GeoBoundingBox> {
        let to_wgs84 = Transformer::from_crs(self.crs, CrsCode::Epsg4326)?;
        let lonlat = self
            .vertices
            .iter()
            .map(|&(x, y)| to_wgs84.transform(x, y))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let bbox = GeoBoundingBox::from_points(lonlat)
            .ok_or_else(|| DomainError::invalid("domain has no vertices"))?
            .buffered(buffer);
        debug!(bbox = %bbox, buffer, "Computed geographic bounding box");
        Ok(bbox)
    }
}
