//! Coordinate Reference System codes understood by the exporter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geodetic datum of a projected CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datum {
    /// WGS84 ellipsoid
    Wgs84,
    /// ETRS89 (GRS80 ellipsoid)
    Etrs89,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

/// Reference ellipsoid of a parameterised projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spheroid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Inverse flattening, 0 for a sphere
    pub inv_f: f64,
}

impl Spheroid {
    pub const WGS84: Spheroid = Spheroid {
        a: 6378137.0,
        inv_f: 298.257223563,
    };

    pub const GRS80: Spheroid = Spheroid {
        a: 6378137.0,
        inv_f: 298.257222101,
    };

    pub fn sphere(radius: f64) -> Self {
        Self {
            a: radius,
            inv_f: 0.0,
        }
    }

    /// Flattening
    pub fn flattening(&self) -> f64 {
        if self.inv_f == 0.0 {
            0.0
        } else {
            1.0 / self.inv_f
        }
    }
}

/// Projection methods that can be set up from explicit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMethod {
    TransverseMercator,
    /// Lambert Conformal Conic, one or two standard parallels
    LambertConformalConic,
}

impl ProjectionMethod {
    /// PROJ name of the method.
    pub fn proj_name(&self) -> &'static str {
        match self {
            ProjectionMethod::TransverseMercator => "tmerc",
            ProjectionMethod::LambertConformalConic => "lcc",
        }
    }
}

/// A projected CRS described by its method and parameters.
///
/// Angles are in degrees and offsets in meters. `lat_1` / `lat_2` are the
/// standard parallels and only matter for the conic method; `k_0` scales
/// both methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedCrs {
    pub method: ProjectionMethod,
    pub lat_0: f64,
    pub lon_0: f64,
    pub lat_1: f64,
    pub lat_2: f64,
    pub k_0: f64,
    pub x_0: f64,
    pub y_0: f64,
    pub spheroid: Spheroid,
}

impl ProjectedCrs {
    /// Transverse Mercator on `spheroid`.
    pub fn transverse_mercator(
        lat_0: f64,
        lon_0: f64,
        k_0: f64,
        x_0: f64,
        y_0: f64,
        spheroid: Spheroid,
    ) -> Self {
        Self {
            method: ProjectionMethod::TransverseMercator,
            lat_0,
            lon_0,
            lat_1: lat_0,
            lat_2: lat_0,
            k_0,
            x_0,
            y_0,
            spheroid,
        }
    }

    /// Lambert Conformal Conic with two standard parallels (pass the same
    /// latitude twice for a tangent cone).
    pub fn lambert_conformal(
        lat_0: f64,
        lon_0: f64,
        lat_1: f64,
        lat_2: f64,
        x_0: f64,
        y_0: f64,
        spheroid: Spheroid,
    ) -> Self {
        Self {
            method: ProjectionMethod::LambertConformalConic,
            lat_0,
            lon_0,
            lat_1,
            lat_2,
            k_0: 1.0,
            x_0,
            y_0,
            spheroid,
        }
    }

    /// Check the parameters describe a usable projection.
    pub fn validate(self) -> Result<Self, CrsParseError> {
        let invalid = |what: &str| Err(CrsParseError::InvalidParameters(what.to_string()));
        let finite = [
            self.lat_0, self.lon_0, self.lat_1, self.lat_2, self.k_0, self.x_0, self.y_0,
            self.spheroid.a, self.spheroid.inv_f,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return invalid("parameters must be finite");
        }
        if self.spheroid.a <= 0.0 || self.k_0 <= 0.0 {
            return invalid("semi-major axis and scale factor must be positive");
        }
        if [self.lat_0, self.lat_1, self.lat_2].iter().any(|l| l.abs() > 90.0) {
            return invalid("latitudes must lie within [-90, 90]");
        }
        if self.method == ProjectionMethod::LambertConformalConic
            && (self.lat_1 + self.lat_2).abs() < 1e-10
        {
            return invalid("standard parallels must not be symmetric about the equator");
        }
        Ok(self)
    }
}

impl fmt::Display for ProjectedCrs {
    /// PROJ string form, e.g. `+proj=tmerc +lat_0=0 +lon_0=9 ...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+proj={} +lat_0={} +lon_0={}",
            self.method.proj_name(),
            self.lat_0,
            self.lon_0
        )?;
        if self.method == ProjectionMethod::LambertConformalConic {
            write!(f, " +lat_1={} +lat_2={}", self.lat_1, self.lat_2)?;
        }
        write!(f, " +k_0={} +x_0={} +y_0={}", self.k_0, self.x_0, self.y_0)?;
        if self.spheroid.inv_f == 0.0 {
            write!(f, " +R={}", self.spheroid.a)?;
        } else {
            write!(f, " +a={} +rf={}", self.spheroid.a, self.spheroid.inv_f)?;
        }
        write!(f, " +units=m +no_defs")
    }
}

impl FromStr for ProjectedCrs {
    type Err = CrsParseError;

    /// Parse a PROJ string using `tmerc` or `lcc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || CrsParseError::UnsupportedCrs(s.to_string());

        let mut method = None;
        let mut spheroid = Spheroid::WGS84;
        let mut params = [None::<f64>; 7];
        const KEYS: [&str; 7] = ["lat_0", "lon_0", "lat_1", "lat_2", "k_0", "x_0", "y_0"];
        let mut a = None;
        let mut rf = None;

        for token in s.split_whitespace() {
            let token = token.strip_prefix('+').ok_or_else(unsupported)?;
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (token, None),
            };
            let number = || -> Result<f64, CrsParseError> {
                value
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or_else(|| CrsParseError::InvalidParameters(format!("bad value for +{}", key)))
            };

            match (key, value) {
                ("proj", Some("tmerc")) => method = Some(ProjectionMethod::TransverseMercator),
                ("proj", Some("lcc")) => method = Some(ProjectionMethod::LambertConformalConic),
                ("ellps" | "datum", Some(name)) => {
                    spheroid = match name.to_ascii_uppercase().as_str() {
                        "WGS84" => Spheroid::WGS84,
                        "GRS80" | "ETRS89" | "NAD83" => Spheroid::GRS80,
                        _ => return Err(unsupported()),
                    }
                }
                ("units", Some("m")) | ("no_defs" | "wktext", None) | ("type", Some("crs")) => {}
                ("k", _) => params[4] = Some(number()?),
                ("a", _) => a = Some(number()?),
                ("rf", _) => rf = Some(number()?),
                ("R", _) => spheroid = Spheroid::sphere(number()?),
                _ => match KEYS.iter().position(|k| *k == key) {
                    Some(i) => params[i] = Some(number()?),
                    None => return Err(unsupported()),
                },
            }
        }

        if let Some(a) = a {
            spheroid = Spheroid {
                a,
                inv_f: rf.unwrap_or(0.0),
            };
        }

        let lat_0 = params[0].unwrap_or(0.0);
        let lat_1 = params[2].unwrap_or(lat_0);
        let crs = ProjectedCrs {
            method: method.ok_or_else(unsupported)?,
            lat_0,
            lon_0: params[1].unwrap_or(0.0),
            lat_1,
            lat_2: params[3].unwrap_or(lat_1),
            k_0: params[4].unwrap_or(1.0),
            x_0: params[5].unwrap_or(0.0),
            y_0: params[6].unwrap_or(0.0),
            spheroid,
        };
        crs.validate()
    }
}

/// Coordinate reference systems understood by the exporter.
///
/// Grids always come in as EPSG:4326; domains are usually in a UTM zone.
/// Transverse Mercator and Lambert Conformal Conic systems can also be given
/// by their parameters. Any other EPSG code is carried as [`CrsCode::Epsg`]
/// and needs the `proj` backend of the projection crate to be transformed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// Universal Transverse Mercator (meters)
    Utm {
        zone: u8,
        hemisphere: Hemisphere,
        datum: Datum,
    },
    /// A projected CRS given by parameters
    Projected(ProjectedCrs),
    /// Any other EPSG code
    Epsg(u32),
}

impl CrsCode {
    /// Resolve a numeric EPSG code.
    ///
    /// Natively handled: 4326, 3857 (and its legacy aliases), WGS84 / UTM
    /// 32601-32660 and 32701-32760, ETRS89 / UTM 25828-25838. Other codes in
    /// the EPSG range become [`CrsCode::Epsg`].
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            3857 | 3785 | 900913 => Ok(CrsCode::Epsg3857),
            32601..=32660 => Ok(CrsCode::Utm {
                zone: (code - 32600) as u8,
                hemisphere: Hemisphere::North,
                datum: Datum::Wgs84,
            }),
            32701..=32760 => Ok(CrsCode::Utm {
                zone: (code - 32700) as u8,
                hemisphere: Hemisphere::South,
                datum: Datum::Wgs84,
            }),
            25828..=25838 => Ok(CrsCode::Utm {
                zone: (code - 25800) as u8,
                hemisphere: Hemisphere::North,
                datum: Datum::Etrs89,
            }),
            1024..=32767 => Ok(CrsCode::Epsg(code)),
            _ => Err(CrsParseError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    /// Numeric EPSG code, if this CRS has one.
    pub fn epsg(&self) -> Option<u32> {
        match *self {
            CrsCode::Epsg4326 => Some(4326),
            CrsCode::Epsg3857 => Some(3857),
            CrsCode::Utm {
                zone,
                hemisphere,
                datum,
            } => {
                let base = match (datum, hemisphere) {
                    (Datum::Wgs84, Hemisphere::North) => 32600,
                    (Datum::Wgs84, Hemisphere::South) => 32700,
                    (Datum::Etrs89, _) => 25800,
                };
                Some(base + zone as u32)
            }
            CrsCode::Projected(_) => None,
            CrsCode::Epsg(code) => Some(code),
        }
    }

    /// Build a WGS84 UTM code from a zone number and hemisphere.
    pub fn utm(zone: u8, hemisphere: Hemisphere) -> Result<Self, CrsParseError> {
        if !(1..=60).contains(&zone) {
            return Err(CrsParseError::UnsupportedCrs(format!("UTM zone {}", zone)));
        }
        Ok(CrsCode::Utm {
            zone,
            hemisphere,
            datum: Datum::Wgs84,
        })
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    /// Accepts "EPSG:32638", "epsg:32638", "32638", "CRS:84" and PROJ
    /// strings such as "+proj=lcc +lat_1=44 +lat_2=49 ...".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('+') {
            return trimmed.parse().map(CrsCode::Projected);
        }

        let normalized = trimmed.to_uppercase();
        if normalized == "CRS:84" {
            return Ok(CrsCode::Epsg4326);
        }

        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;
        CrsCode::from_epsg(code)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.epsg()) {
            (CrsCode::Projected(params), _) => params.fmt(f),
            (_, Some(code)) => write!(f, "EPSG:{}", code),
            (_, None) => write!(f, "unknown CRS"),
        }
    }
}

/// Order of the two horizontal axes of a mesh value array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// Values shaped `[lat, lon]` (latitude-major)
    #[default]
    LatLon,
    /// Values shaped `[lon, lat]`
    LonLat,
}

impl FromStr for AxisOrder {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '/', ','], "_").as_str() {
            "lat_lon" | "latlon" => Ok(AxisOrder::LatLon),
            "lon_lat" | "lonlat" => Ok(AxisOrder::LonLat),
            _ => Err(CrsParseError::InvalidAxisOrder(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid projection parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid axis order '{0}', expected lat-lon or lon-lat")]
    InvalidAxisOrder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_order() {
        assert_eq!("lat-lon".parse::<AxisOrder>().unwrap(), AxisOrder::LatLon);
        assert_eq!("LON_LAT".parse::<AxisOrder>().unwrap(), AxisOrder::LonLat);
        assert_eq!("lon,lat".parse::<AxisOrder>().unwrap(), AxisOrder::LonLat);
        assert!("xy".parse::<AxisOrder>().is_err());
    }

    #[test]
    fn test_parse_crs() {
        assert_eq!("EPSG:4326".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!("epsg:3857".parse::<CrsCode>().unwrap(), CrsCode::Epsg3857);
        assert_eq!("CRS:84".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!(
            "32638".parse::<CrsCode>().unwrap(),
            CrsCode::Utm {
                zone: 38,
                hemisphere: Hemisphere::North,
                datum: Datum::Wgs84
            }
        );
        assert_eq!("EPSG:2154".parse::<CrsCode>().unwrap(), CrsCode::Epsg(2154));
        assert!("EPSG:0".parse::<CrsCode>().is_err());
        assert!("EPSG:99999".parse::<CrsCode>().is_err());
        assert!("UTM".parse::<CrsCode>().is_err());
    }

    #[test]
    fn test_epsg_roundtrip() {
        for code in [4326, 3857, 32601, 32638, 32660, 32701, 32733, 25832] {
            assert_eq!(CrsCode::from_epsg(code).unwrap().epsg(), Some(code));
        }
        assert_eq!(CrsCode::from_epsg(900913).unwrap().epsg(), Some(3857));
    }

    #[test]
    fn test_display() {
        let crs = CrsCode::utm(33, Hemisphere::South).unwrap();
        assert_eq!(crs.to_string(), "EPSG:32733");
        assert!(CrsCode::utm(61, Hemisphere::North).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let crs: CrsCode = serde_json::from_str("\"EPSG:32632\"").unwrap();
        assert_eq!(crs.epsg(), Some(32632));
        assert_eq!(serde_json::to_string(&crs).unwrap(), "\"EPSG:32632\"");
    }

    #[test]
    fn test_parse_proj_string() {
        let lambert93: CrsCode = "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80 +units=m +no_defs"
            .parse()
            .unwrap();
        let CrsCode::Projected(params) = lambert93 else {
            panic!("expected parameters, got {:?}", lambert93);
        };
        assert_eq!(params.method, ProjectionMethod::LambertConformalConic);
        assert_eq!((params.lat_1, params.lat_2), (49.0, 44.0));
        assert_eq!(params.k_0, 1.0);
        assert_eq!(params.spheroid, Spheroid::GRS80);
        assert_eq!(lambert93.epsg(), None);

        // Display gives a PROJ string that parses back to the same CRS
        let text = lambert93.to_string();
        assert!(text.starts_with("+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44"), "{}", text);
        assert_eq!(text.parse::<CrsCode>().unwrap(), lambert93);

        let tm: ProjectedCrs = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +a=6377563.396 +rf=299.3249646"
            .parse()
            .unwrap();
        assert_eq!(tm.method, ProjectionMethod::TransverseMercator);
        assert_eq!(tm.k_0, 0.9996012717);
        assert_eq!(tm.spheroid.a, 6377563.396);
    }

    #[test]
    fn test_reject_bad_proj_strings() {
        assert!("+proj=laea +lat_0=52 +lon_0=10".parse::<CrsCode>().is_err());
        assert!("+proj=tmerc +units=us-ft".parse::<CrsCode>().is_err());
        assert!("+proj=tmerc +k=zero".parse::<CrsCode>().is_err());
        assert!("+proj=tmerc +lat_0=95".parse::<CrsCode>().is_err());
        assert!("+proj=lcc +lat_1=10 +lat_2=-10".parse::<CrsCode>().is_err());
        assert!("+lat_0=10".parse::<CrsCode>().is_err());
    }
}
