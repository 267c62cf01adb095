//! Shared test utilities for the rainfall-forcing workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic rain grid generators
//! - Domain fixtures (bounding boxes, CRS definitions, shapefiles)
//! - Approximate equality macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures, indexed_mesh};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Assert that two numbers are within `epsilon` of each other.
///
/// NaN never compares close, so a NaN on either side fails.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(bbox.min_lon, 43.9, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if !((left - right).abs() <= epsilon) {
            panic!(
                "assertion failed: {} = {:?} is not within {:?} of {} = {:?}",
                stringify!($left),
                left,
                epsilon,
                stringify!($right),
                right
            );
        }
    }};
}

/// Assert that two positions, `(x, y)` or `(lat, lon)`, agree on both axes.
///
/// ```ignore
/// use test_utils::assert_position_approx_eq;
///
/// assert_position_approx_eq!((483_000.0, 4_616_000.0), (483_000.2, 4_616_000.1), 0.5);
/// ```
#[macro_export]
macro_rules! assert_position_approx_eq {
    (($a1:expr, $b1:expr), ($a2:expr, $b2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($a1, $a2, $epsilon);
        $crate::assert_approx_eq!($b1, $b2, $epsilon);
    }};
}
