//! Fixed-format text writers for rainfall forcing series.
//!
//! A series is one `Vec<ExtractedPoint>` per time step, steps `dt` seconds
//! apart. Two layouts are supported, see [`OutputFormat`]. Coordinates are
//! printed with no decimals after subtracting an optional [`Shift`].

pub mod error;
pub mod format;
pub mod header;

use std::fs;
use std::io::Write as _;
use std::path::Path;

use forcing_common::{ExtractedPoint, Shift};
use tracing::info;

pub use error::{Result, WriterError};
pub use format::{render, OutputFormat};
pub use header::{Header, MINIMAL_HEADER, RADAR_HEADER};

/// Default time step between series entries, in seconds.
pub const DEFAULT_DT: u64 = 3600;

/// Write `all_values` to `path`, replacing any existing file.
///
/// The content goes to a temporary file in the same directory first and is
/// renamed over `path` once complete. A new file gets the usual `0o666`
/// minus umask mode; a replaced one keeps the mode it had.
pub fn write(
    all_values: &[Vec<ExtractedPoint>],
    header: &str,
    path: impl AsRef<Path>,
    shift: Option<Shift>,
    dt: u64,
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    let text = render(all_values, header, shift.unwrap_or_default(), dt, format)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain create would get, umask applied
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(|e| WriterError::io(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| WriterError::io(&tmp_path, e))?;

    // A replaced file keeps its mode
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| WriterError::io(&tmp_path, e))?;
    }
    tmp.persist(path).map_err(|e| WriterError::io(path, e.error))?;

    info!(
        path = %path.display(),
        steps = all_values.len(),
        points = all_values.first().map(Vec::len).unwrap_or(0),
        format = ?format,
        bytes = text.len(),
        "Wrote forcing file"
    );
    Ok(())
}
