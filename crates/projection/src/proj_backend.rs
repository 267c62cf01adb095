//! PROJ-backed projection for CRS without a built-in implementation.
//!
//! Only compiled with the `proj` feature, which links against libproj.
//! Datum shifts are applied by PROJ itself.

use std::fmt;
use std::sync::Arc;

use forcing_common::CrsCode;
use proj::Proj;

use crate::transform::ProjectionError;

/// Definition of the geographic side; PROJ normalises it to (lon, lat).
const GEOGRAPHIC: &str = "EPSG:4326";

/// A pair of PROJ pipelines between EPSG:4326 and one CRS.
#[derive(Clone)]
pub struct ProjBackend {
    definition: String,
    forward: Arc<Proj>,
    inverse: Arc<Proj>,
}

impl ProjBackend {
    pub fn new(crs: CrsCode) -> Result<Self, ProjectionError> {
        let definition = crs.to_string();
        let backend_error = |reason: String| ProjectionError::Backend { crs, reason };

        let forward = Proj::new_known_crs(GEOGRAPHIC, &definition, None)
            .map_err(|e| backend_error(e.to_string()))?;
        let inverse = Proj::new_known_crs(&definition, GEOGRAPHIC, None)
            .map_err(|e| backend_error(e.to_string()))?;
        Ok(Self {
            definition,
            forward: Arc::new(forward),
            inverse: Arc::new(inverse),
        })
    }

    /// (lat, lon) in degrees to (x, y).
    pub fn forward(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        self.forward.convert((lon, lat)).ok()
    }

    /// (x, y) to (lat, lon) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (lon, lat) = self.inverse.convert((x, y)).ok()?;
        Some((lat, lon))
    }
}

impl fmt::Debug for ProjBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjBackend")
            .field("definition", &self.definition)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laea_europe() {
        // ETRS89-extended / LAEA Europe, natural origin at 52N 10E
        let backend = ProjBackend::new(CrsCode::Epsg(3035)).unwrap();
        let (x, y) = backend.forward(52.0, 10.0).unwrap();
        assert!((x - 4_321_000.0).abs() < 1e-3, "x {}", x);
        assert!((y - 3_210_000.0).abs() < 1e-3, "y {}", y);

        let (lat, lon) = backend.inverse(x, y).unwrap();
        assert!((lat - 52.0).abs() < 1e-9 && (lon - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_code_fails() {
        // Reserved for user-defined systems, never in the database
        assert!(matches!(
            ProjBackend::new(CrsCode::Epsg(32767)),
            Err(ProjectionError::Backend { .. })
        ));
    }
}
