//! ESRI shapefile (`.shp`) geometry reading.
//!
//! Only the vertex coordinates matter for a domain, so every supported
//! record is flattened into its (x, y) points. Z and M values trailing the
//! XY block are skipped.
//!
//! Layout:
//! - 100-byte header: file code 9994 (big-endian), file length in 16-bit
//!   words (big-endian), version 1000 (little-endian), shape type, bounds
//! - records: number and content length (big-endian), then the content
//!   starting with the little-endian shape type

use bytes::Buf;
use tracing::debug;

use crate::error::{DomainError, Result};

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;

/// Geometry kinds of the shapefile format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    pub fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            other => return Err(DomainError::UnsupportedShapeType(other)),
        })
    }
}

/// File-level header fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapefileHeader {
    pub file_length_bytes: usize,
    pub shape_type: ShapeType,
    /// (xmin, ymin, xmax, ymax)
    pub bounds: (f64, f64, f64, f64),
}

pub fn parse_header(data: &[u8]) -> Result<ShapefileHeader> {
    if data.len() < HEADER_LEN {
        return Err(DomainError::invalid(format!(
            "file is {} bytes, shorter than the {}-byte header",
            data.len(),
            HEADER_LEN
        )));
    }

    let mut buf = &data[..HEADER_LEN];
    let file_code = buf.get_i32();
    if file_code != FILE_CODE {
        return Err(DomainError::invalid(format!(
            "bad file code {} (expected {})",
            file_code, FILE_CODE
        )));
    }
    buf.advance(20);
    let words = buf.get_i32();
    let version = buf.get_i32_le();
    if version != VERSION {
        return Err(DomainError::invalid(format!(
            "unsupported version {} (expected {})",
            version, VERSION
        )));
    }
    let shape_type = ShapeType::from_code(buf.get_i32_le())?;
    let bounds = (
        buf.get_f64_le(),
        buf.get_f64_le(),
        buf.get_f64_le(),
        buf.get_f64_le(),
    );

    Ok(ShapefileHeader {
        file_length_bytes: words.max(0) as usize * 2,
        shape_type,
        bounds,
    })
}

/// Read every vertex of every non-null record, in file order.
pub fn read_vertices(data: &[u8]) -> Result<Vec<(f64, f64)>> {
    let header = parse_header(data)?;
    // Trust the actual length when the header overstates it
    let end = header.file_length_bytes.clamp(HEADER_LEN, data.len());

    let mut vertices = Vec::new();
    let mut offset = HEADER_LEN;
    let mut records = 0usize;
    while offset + RECORD_HEADER_LEN <= end {
        let mut rec = &data[offset..offset + RECORD_HEADER_LEN];
        let number = rec.get_i32();
        let content_len = rec.get_i32().max(0) as usize * 2;

        let start = offset + RECORD_HEADER_LEN;
        let stop = start + content_len;
        if stop > data.len() {
            return Err(DomainError::invalid(format!(
                "record {} runs past the end of the file",
                number
            )));
        }
        read_record(&data[start..stop], number, &mut vertices)?;
        records += 1;
        offset = stop;
    }

    debug!(
        shape_type = ?header.shape_type,
        records,
        vertices = vertices.len(),
        "Read shapefile geometry"
    );
    Ok(vertices)
}

fn read_record(mut content: &[u8], number: i32, out: &mut Vec<(f64, f64)>) -> Result<()> {
    let truncated = || DomainError::invalid(format!("record {} is truncated", number));

    if content.remaining() < 4 {
        return Err(truncated());
    }
    match ShapeType::from_code(content.get_i32_le())? {
        ShapeType::Null => {}
        ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => {
            if content.remaining() < 16 {
                return Err(truncated());
            }
            out.push((content.get_f64_le(), content.get_f64_le()));
        }
        ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
            if content.remaining() < 36 {
                return Err(truncated());
            }
            content.advance(32);
            let n_points = content.get_i32_le().max(0) as usize;
            read_points(&mut content, n_points, out).ok_or_else(truncated)?;
        }
        kind @ (ShapeType::PolyLine
        | ShapeType::PolyLineZ
        | ShapeType::PolyLineM
        | ShapeType::Polygon
        | ShapeType::PolygonZ
        | ShapeType::PolygonM
        | ShapeType::MultiPatch) => {
            if content.remaining() < 40 {
                return Err(truncated());
            }
            content.advance(32);
            let n_parts = content.get_i32_le().max(0) as usize;
            let n_points = content.get_i32_le().max(0) as usize;
            // Part start indices, plus part types for multipatches
            let skip = if kind == ShapeType::MultiPatch {
                8 * n_parts
            } else {
                4 * n_parts
            };
            if content.remaining() < skip {
                return Err(truncated());
            }
            content.advance(skip);
            read_points(&mut content, n_points, out).ok_or_else(truncated)?;
        }
    }
    Ok(())
}

fn read_points(content: &mut &[u8], n: usize, out: &mut Vec<(f64, f64)>) -> Option<()> {
    if content.remaining() < n.checked_mul(16)? {
        return None;
    }
    out.reserve(n);
    for _ in 0..n {
        out.push((content.get_f64_le(), content.get_f64_le()));
    }
    Some(())
}
