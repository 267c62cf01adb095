//! Native NetCDF decoding using the netcdf library.
//!
//! The netcdf library requires a file path (it wraps libnetcdf/HDF5 which
//! need file handles). When reading from bytes, we write to a temp file
//! first; on Linux `/dev/shm` (memory-backed tmpfs) is preferred.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::stack::{build_stack, GridStack, RawVariable, VariableAttrs};

/// Auxiliary coordinate names picked up even when they are not dimension
/// variables (scattered-point products).
const AUXILIARY_COORDS: [&str; 4] = ["lat", "lon", "latitude", "longitude"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when
/// errors are handled (e.g. when probing optional attributes). Only needs
/// to run once per process; safe to call repeatedly.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Decode `variable` from the file at `path`.
pub fn read_variable(path: &Path, variable: &str, time_dim: &str) -> NetCdfResult<GridStack> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let var = file
        .variable(variable)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", variable)))?;
    let data = read_raw(&var)?;

    let mut coords = Vec::new();
    for dim in &data.dims {
        if let Some(coord_var) = file.variable(dim) {
            coords.push(read_raw(&coord_var)?);
        }
    }
    for name in AUXILIARY_COORDS {
        if data.dims.iter().any(|d| d == name) {
            continue;
        }
        if let Some(coord_var) = file.variable(name) {
            coords.push(read_raw(&coord_var)?);
        }
    }

    debug!(
        path = %path.display(),
        variable,
        dims = ?data.dims,
        coords = coords.len(),
        "Decoded NetCDF variable"
    );
    build_stack(&data, &coords, time_dim)
}

/// Decode `variable` from an in-memory NetCDF file.
pub fn read_variable_from_bytes(
    bytes: &[u8],
    variable: &str,
    time_dim: &str,
) -> NetCdfResult<GridStack> {
    let mut temp = tempfile::Builder::new()
        .prefix("forcing_nc_")
        .suffix(".nc")
        .tempfile_in(get_optimal_temp_dir())?;
    temp.write_all(bytes)?;
    temp.flush()?;

    // Removed when `temp` drops
    read_variable(temp.path(), variable, time_dim)
}

// =============================================================================
// Internal helpers
// =============================================================================

fn read_raw(var: &netcdf::Variable) -> NetCdfResult<RawVariable> {
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values: Vec<f64> = var.get_values::<f64, _>(..).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e))
    })?;

    Ok(RawVariable {
        name: var.name(),
        dims,
        shape,
        values,
        attrs: VariableAttrs {
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
            scale_factor: get_f64_attr(var, "scale_factor"),
            add_offset: get_f64_attr(var, "add_offset"),
            units: get_str_attr(var, "units"),
        },
    })
}

/// Get the optimal temp directory for NetCDF file operations.
///
/// On Linux, uses /dev/shm (memory-backed tmpfs) if available for faster I/O.
fn get_optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = Path::new("/dev/shm");
        if shm_path.is_dir() {
            let test_path = shm_path.join(format!(".netcdf_test_{}", std::process::id()));
            if std::fs::write(&test_path, b"test").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
