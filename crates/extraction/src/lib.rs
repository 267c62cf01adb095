//! Bounding-box extraction of gridded rainfall data.
//!
//! Turns one [`GeoGrid`](forcing_common::GeoGrid) per time step into a list
//! of `(value, x, y)` points inside a domain, with `x, y` in the domain's
//! planar CRS.
//!
//! # Architecture
//!
//! ```text
//! GeoGrid (lat/lon coordinates, values)
//!      │
//!      ├─► filter latitudes / longitudes against the bbox (inclusive)
//!      │
//!      ├─► mesh: cross product lat × lon   | points: keep matching points
//!      │
//!      └─► reproject EPSG:4326 → target CRS
//!               │
//!               ▼
//!          Vec<ExtractedPoint>
//! ```
//!
//! # Example
//!
//! ```
//! use extraction::{Extractor, ExtractorConfig};
//! use forcing_common::{CrsCode, GeoBoundingBox, GeoGrid};
//!
//! let grid = GeoGrid::mesh(
//!     "rain",
//!     ("lat", vec![41.0, 41.5, 42.0]),
//!     ("lon", vec![44.0, 44.5]),
//!     vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
//! )
//! .unwrap();
//! let bbox = GeoBoundingBox::new(44.0, 41.4, 45.0, 42.0);
//! let target: CrsCode = "EPSG:32638".parse().unwrap();
//!
//! let points = Extractor::new(ExtractorConfig::default())
//!     .extract(&grid, &bbox, target)
//!     .unwrap();
//! assert_eq!(points.len(), 4);
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod series;

pub use config::{CoordinateConvention, ExtractorConfig, GridLayout};
pub use error::{ExtractionError, Result};
pub use extract::{extract, Extractor};
pub use series::{sum_grids, to_increments};
