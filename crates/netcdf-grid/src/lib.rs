//! Decoding of NetCDF variables into time-stamped geographic grids.
//!
//! A variable is read together with its coordinate variables and split
//! along its time dimension into a [`GridStack`]. Packed values are
//! unpacked (`scale_factor`, `add_offset`) and fill markers become NaN.
//!
//! # Implementation Notes
//!
//! Actual file decoding links against libnetcdf and is compiled with the
//! `native` feature, which is on by default. Without it, [`read_variable`] and
//! [`read_variable_from_bytes`] return [`NetCdfError::Unsupported`]; the
//! stack assembly in [`stack`] is always available.

pub mod error;
#[cfg(feature = "native")]
pub mod native;
pub mod stack;

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use error::{NetCdfError, NetCdfResult};
pub use stack::{build_stack, GridStack, RawVariable, VariableAttrs};

/// Name of the time dimension in most products.
pub const DEFAULT_TIME_DIM: &str = "time";

/// Decode `variable` from the NetCDF file at `path`.
pub fn read_variable(
    path: impl AsRef<Path>,
    variable: &str,
    time_dim: &str,
) -> NetCdfResult<GridStack> {
    #[cfg(feature = "native")]
    {
        native::read_variable(path.as_ref(), variable, time_dim)
    }
    #[cfg(not(feature = "native"))]
    {
        let _ = (variable, time_dim);
        Err(unsupported(path.as_ref().display()))
    }
}

/// Decode `variable` from an in-memory NetCDF file (e.g. an HTTP response body).
pub fn read_variable_from_bytes(
    bytes: &[u8],
    variable: &str,
    time_dim: &str,
) -> NetCdfResult<GridStack> {
    #[cfg(feature = "native")]
    {
        native::read_variable_from_bytes(bytes, variable, time_dim)
    }
    #[cfg(not(feature = "native"))]
    {
        let _ = (variable, time_dim);
        Err(unsupported(format!("{} bytes in memory", bytes.len())))
    }
}

#[cfg(not(feature = "native"))]
fn unsupported(what: impl std::fmt::Display) -> NetCdfError {
    NetCdfError::Unsupported(format!(
        "cannot decode {}: built without the `native` feature",
        what
    ))
}

/// Whether the file starts with a NetCDF classic or NetCDF-4/HDF5 signature.
pub fn is_netcdf_file(path: impl AsRef<Path>) -> bool {
    let mut magic = [0u8; 4];
    match File::open(path.as_ref()).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => is_netcdf_magic(&magic),
        Err(_) => false,
    }
}

fn is_netcdf_magic(magic: &[u8; 4]) -> bool {
    (magic[..3] == *b"CDF" && matches!(magic[3], 1 | 2 | 5)) || magic == b"\x89HDF"
}
