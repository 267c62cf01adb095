//! Coordinate reference system transformations.
//!
//! Implements the map projections needed by the exporter from scratch:
//! ellipsoidal Transverse Mercator (UTM zones and parameterised grids),
//! ellipsoidal Lambert Conformal Conic and spherical Web Mercator. Datum
//! shifts are not modelled by these; every datum is treated as coincident
//! with WGS84.
//!
//! With the `proj` feature any other EPSG code is handed to PROJ.

pub mod ellipsoid;
pub mod lambert;
pub mod mercator;
#[cfg(feature = "proj")]
pub mod proj_backend;
pub mod transform;
pub mod transverse_mercator;

pub use ellipsoid::Ellipsoid;
pub use lambert::LambertConformal;
pub use mercator::WebMercator;
#[cfg(feature = "proj")]
pub use proj_backend::ProjBackend;
pub use transform::{Projection, ProjectionError, Transformer};
pub use transverse_mercator::TransverseMercator;
