//! Common types shared by every crate of the rainfall forcing exporter.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod series;
pub mod time;

pub use bbox::GeoBoundingBox;
pub use crs::{AxisOrder, CrsCode, Datum, Hemisphere, ProjectedCrs, ProjectionMethod, Spheroid};
pub use error::{ForcingError, ForcingResult, GridError};
pub use grid::{Coordinate, GeoGrid, TimedGrid};
pub use series::{check_alignment, AlignmentError, ExtractedPoint, Shift, TimeSeries};
pub use time::{CfTimeUnits, TimeRange};
