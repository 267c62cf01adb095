//! Common test fixtures for rainfall-forcing tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios: bounding boxes, CRS definitions, reference times and
//! on-disk shapefile domains.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};

/// Common bounding box definitions for testing, as
/// `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Area around Tbilisi, inside UTM zone 38N
    pub const TBILISI: (f64, f64, f64, f64) = (44.0, 41.0, 45.0, 42.0);

    /// Ligurian coast, inside UTM zone 32N
    pub const GENOA: (f64, f64, f64, f64) = (8.5, 44.2, 9.3, 44.6);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (44.5, 41.5, 44.5, 41.5);
}

/// Common CRS definitions.
pub mod crs {
    pub const EPSG_4326: &str = "EPSG:4326";
    pub const EPSG_3857: &str = "EPSG:3857";
    pub const UTM_38N: &str = "EPSG:32638";

    /// ESRI-style `.prj` content for UTM zone 38N.
    pub const UTM_38N_PRJ: &str = r#"PROJCS["WGS_1984_UTM_Zone_38N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",45.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    /// OGC WKT carrying an EPSG authority for UTM zone 32N.
    pub const UTM_32N_AUTHORITY_PRJ: &str = r#"PROJCS["WGS 84 / UTM zone 32N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",9],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","32632"]]"#;

    /// ESRI-style `.prj` content for RGF93 / Lambert-93 (no authority).
    pub const LAMBERT_93_PRJ: &str = r#"PROJCS["RGF_1993_Lambert_93",GEOGCS["GCS_RGF_1993",DATUM["D_RGF_1993",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Lambert_Conformal_Conic"],PARAMETER["False_Easting",700000.0],PARAMETER["False_Northing",6600000.0],PARAMETER["Central_Meridian",3.0],PARAMETER["Standard_Parallel_1",49.0],PARAMETER["Standard_Parallel_2",44.0],PARAMETER["Latitude_Of_Origin",46.5],UNIT["Meter",1.0]]"#;

    /// OGC WKT for NZGD2000 / New Zealand Transverse Mercator 2000.
    pub const NZTM_PRJ: &str = r#"PROJCS["NZGD2000 / New Zealand Transverse Mercator 2000",GEOGCS["NZGD2000",DATUM["New_Zealand_Geodetic_Datum_2000",SPHEROID["GRS 1980",6378137,298.257222101,AUTHORITY["EPSG","7019"]],AUTHORITY["EPSG","6167"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4167"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",173],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",1600000],PARAMETER["false_northing",10000000],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","2193"]]"#;

    /// ESRI-style `.prj` content for plain WGS84.
    pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests (2024-01-15T12:00:00Z)
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    /// The same instant in the compact form used by the coverage service
    pub const REFERENCE_COMPACT: &str = "202401151200";

    /// CF units anchored at the reference day
    pub const CF_HOURS_UNITS: &str = "hours since 2024-01-15 00:00:00";
}

/// Shape type codes used by [`polygon_shapefile_bytes`].
pub const SHAPE_POLYGON: i32 = 5;
pub const SHAPE_POINT: i32 = 1;

/// Encode a main `.shp` file holding one single-ring polygon per entry.
pub fn polygon_shapefile_bytes(rings: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut records = BytesMut::new();
    for (n, ring) in rings.iter().enumerate() {
        let mut content = BytesMut::new();
        content.put_i32_le(SHAPE_POLYGON);
        put_box(&mut content, ring);
        content.put_i32_le(1);
        content.put_i32_le(ring.len() as i32);
        content.put_i32_le(0);
        for &(x, y) in ring {
            content.put_f64_le(x);
            content.put_f64_le(y);
        }
        put_record(&mut records, n as i32 + 1, &content);
    }
    let all: Vec<(f64, f64)> = rings.iter().flatten().copied().collect();
    finish(SHAPE_POLYGON, &all, records)
}

/// Encode a main `.shp` file holding one point record per entry.
pub fn point_shapefile_bytes(points: &[(f64, f64)]) -> Vec<u8> {
    let mut records = BytesMut::new();
    for (n, &(x, y)) in points.iter().enumerate() {
        let mut content = BytesMut::new();
        content.put_i32_le(SHAPE_POINT);
        content.put_f64_le(x);
        content.put_f64_le(y);
        put_record(&mut records, n as i32 + 1, &content);
    }
    finish(SHAPE_POINT, points, records)
}

/// Write `<dir>/<stem>.shp` (and `<stem>.prj` when given). Returns the `.shp` path.
pub fn write_shapefile(dir: &Path, stem: &str, shp: &[u8], prj: Option<&str>) -> PathBuf {
    let path = dir.join(format!("{}.shp", stem));
    fs::write(&path, shp).expect("write .shp fixture");
    if let Some(prj) = prj {
        fs::write(dir.join(format!("{}.prj", stem)), prj).expect("write .prj fixture");
    }
    path
}

fn put_record(out: &mut BytesMut, number: i32, content: &[u8]) {
    out.put_i32(number);
    out.put_i32((content.len() / 2) as i32);
    out.put_slice(content);
}

fn put_box(out: &mut BytesMut, points: &[(f64, f64)]) {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if points.is_empty() {
        (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
    }
    out.put_f64_le(min_x);
    out.put_f64_le(min_y);
    out.put_f64_le(max_x);
    out.put_f64_le(max_y);
}

fn finish(shape_type: i32, points: &[(f64, f64)], records: BytesMut) -> Vec<u8> {
    let mut out = BytesMut::with_capacity(100 + records.len());
    out.put_i32(9994);
    for _ in 0..5 {
        out.put_i32(0);
    }
    out.put_i32(((100 + records.len()) / 2) as i32);
    out.put_i32_le(1000);
    out.put_i32_le(shape_type);
    put_box(&mut out, points);
    for _ in 0..4 {
        out.put_f64_le(0.0);
    }
    out.put_slice(&records);
    out.to_vec()
}
