//! Comment headers written verbatim at the top of a forcing file.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Result, WriterError};

/// Comment block expected by hydraulic models reading radar rainfall
/// in the per-step block format.
pub const RADAR_HEADER: &str = "
# Radardaten
#
# Regeln fuer Kommentare
# -\tKommentarzeile < 72 Zeichen
# -\tDie Kommentarzeile enthält ein #.
# -\tEs können beliebig viele Kommentarzeilen aufeinander folgen.
# -\tDie Kommentarzeile steht vor der Datenzeile <t,dt,np> ; d.h. es können mehre Kommentare im Datensatz verstreut liegen.
# -\tVor oder im Datenblock <x,y,N> darf kein Kommentar stehen.
#
# Zeile <t,dt,np>
# Block mit np-Zeilen <x,y,N> ; x,y in [m] ; N in [mm]
";

/// A single comment line, used with the columnar format.
pub const MINIMAL_HEADER: &str = "\n#\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Radar,
    Minimal,
    Custom(String),
}

impl Header {
    /// Resolve a header argument: `radar`, `minimal`, or a path to a file
    /// whose content is used as-is.
    pub fn resolve(arg: &str) -> Result<Self> {
        match arg {
            "radar" => Ok(Header::Radar),
            "minimal" => Ok(Header::Minimal),
            path => Self::from_file(path),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| WriterError::io(path, e))?;
        Ok(Header::Custom(text))
    }

    pub fn text(&self) -> &str {
        match self {
            Header::Radar => RADAR_HEADER,
            Header::Minimal => MINIMAL_HEADER,
            Header::Custom(text) => text,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
