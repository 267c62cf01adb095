//! CRS resolution from `.prj` WKT.
//!
//! Resolution order:
//! 1. an `AUTHORITY["EPSG", "..."]` on the outermost element with a built-in
//!    projection;
//! 2. the CRS name, matched against common UTM, Web Mercator and WGS84
//!    spellings (both OGC and ESRI flavours);
//! 3. `PROJECTION` / `PARAMETER` entries of a Transverse Mercator or Lambert
//!    Conformal Conic system;
//! 4. any other outer EPSG authority, left to the `proj` backend.

use forcing_common::{CrsCode, Datum, Hemisphere, ProjectedCrs, ProjectionMethod, Spheroid};

use crate::error::{DomainError, Result};

/// Resolve the CRS described by a WKT string.
pub fn crs_from_wkt(wkt: &str) -> Result<CrsCode> {
    let wkt = wkt.trim();
    let authority = outer_authority(wkt).and_then(|code| CrsCode::from_epsg(code).ok());
    if let Some(crs) = authority.filter(|crs| !matches!(crs, CrsCode::Epsg(_))) {
        return Ok(crs);
    }

    let (keyword, name) = root_name(wkt).ok_or_else(|| DomainError::UnknownCrs(excerpt(wkt)))?;
    let lower = name.to_ascii_lowercase();

    if let Some(crs) = utm_from_name(&lower) {
        return Ok(crs);
    }
    if lower.contains("pseudo-mercator")
        || lower.contains("pseudo_mercator")
        || lower.contains("web_mercator")
        || lower.contains("web mercator")
    {
        return Ok(CrsCode::Epsg3857);
    }
    if keyword.eq_ignore_ascii_case("GEOGCS") && is_wgs84(&lower) {
        return Ok(CrsCode::Epsg4326);
    }
    if let Some(params) = projected_from_parameters(wkt, name)? {
        return Ok(CrsCode::Projected(params));
    }
    if let Some(crs) = authority {
        return Ok(crs);
    }

    Err(DomainError::UnknownCrs(name.to_string()))
}

/// Projection parameters of a Transverse Mercator or Lambert Conformal
/// Conic `PROJCS`. `None` when the method is anything else.
fn projected_from_parameters(wkt: &str, name: &str) -> Result<Option<ProjectedCrs>> {
    let Some(method) = elements(wkt, "PROJECTION")
        .first()
        .and_then(|args| args.first())
        .and_then(|method| projection_method(method))
    else {
        return Ok(None);
    };

    let unsupported = |what: &str| DomainError::UnknownCrs(format!("{}: {}", name, what));
    if let Some(meridian) = elements(wkt, "PRIMEM").first().and_then(|args| number(args, 1)) {
        if meridian != 0.0 {
            return Err(unsupported("prime meridian is not Greenwich"));
        }
    }
    // The linear unit is the last UNIT; the angular one sits inside GEOGCS
    if let Some(unit) = elements(wkt, "UNIT").last().and_then(|args| number(args, 1)) {
        if (unit - 1.0).abs() > 1e-12 {
            return Err(unsupported("linear unit is not the metre"));
        }
    }

    let spheroid = elements(wkt, "SPHEROID")
        .into_iter()
        .chain(elements(wkt, "ELLIPSOID"))
        .next()
        .and_then(|args| {
            Some(Spheroid {
                a: number(&args, 1)?,
                inv_f: number(&args, 2)?,
            })
        })
        .unwrap_or(Spheroid::WGS84);

    let parameters: Vec<(String, f64)> = elements(wkt, "PARAMETER")
        .iter()
        .filter_map(|args| {
            let key = args.first()?.to_ascii_lowercase().replace(' ', "_");
            Some((key, number(args, 1)?))
        })
        .collect();
    let param = |keys: &[&str]| {
        parameters
            .iter()
            .find(|(key, _)| keys.contains(&key.as_str()))
            .map(|&(_, value)| value)
    };

    let lat_0 = param(&["latitude_of_origin", "latitude_of_center"]).unwrap_or(0.0);
    let lat_1 = param(&["standard_parallel_1"]).unwrap_or(lat_0);
    let crs = ProjectedCrs {
        method,
        lat_0,
        lon_0: param(&["central_meridian", "longitude_of_center", "longitude_of_origin"])
            .unwrap_or(0.0),
        lat_1,
        lat_2: param(&["standard_parallel_2"]).unwrap_or(lat_1),
        k_0: param(&["scale_factor"]).unwrap_or(1.0),
        x_0: param(&["false_easting"]).unwrap_or(0.0),
        y_0: param(&["false_northing"]).unwrap_or(0.0),
        spheroid,
    };
    Ok(Some(crs.validate()?))
}

fn projection_method(name: &str) -> Option<ProjectionMethod> {
    let name = name.to_ascii_lowercase().replace(' ', "_");
    if name == "transverse_mercator" || name == "gauss_kruger" {
        Some(ProjectionMethod::TransverseMercator)
    } else if name.starts_with("lambert_conformal_conic") {
        Some(ProjectionMethod::LambertConformalConic)
    } else {
        None
    }
}

/// Arguments of every `KEYWORD[...]` element, up to the first closing
/// bracket, with quotes stripped.
fn elements<'a>(wkt: &'a str, keyword: &str) -> Vec<Vec<&'a str>> {
    let upper = wkt.to_ascii_uppercase();
    let pattern = format!("{}[", keyword);
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(pos) = upper[from..].find(&pattern) {
        let start = from + pos + pattern.len();
        let end = wkt[start..].find(']').map_or(wkt.len(), |len| start + len);
        found.push(
            wkt[start..end]
                .split(',')
                .map(|arg| arg.trim().trim_matches('"'))
                .collect(),
        );
        from = end;
    }
    found
}

fn number(args: &[&str], index: usize) -> Option<f64> {
    args.get(index)?.parse().ok()
}

/// EPSG code of the last `AUTHORITY` entry, which belongs to the root element.
fn outer_authority(wkt: &str) -> Option<u32> {
    let upper = wkt.to_ascii_uppercase();
    let start = upper.rfind("AUTHORITY[")?;
    // The root authority is the last token before the final bracket
    let tail = upper[start..].trim_end().trim_end_matches(']');
    if tail.matches('[').count() > 1 {
        return None;
    }
    let args: Vec<&str> = tail["AUTHORITY[".len()..]
        .split(',')
        .map(|s| s.trim().trim_matches('"'))
        .collect();
    match args.as_slice() {
        ["EPSG", code] => code.parse().ok(),
        _ => None,
    }
}

/// The root keyword and its quoted name, e.g. `("PROJCS", "WGS 84 / UTM zone 38N")`.
fn root_name(wkt: &str) -> Option<(&str, &str)> {
    let open = wkt.find('[')?;
    let keyword = wkt[..open].trim();
    let rest = &wkt[open + 1..];
    let first = rest.find('"')?;
    let len = rest[first + 1..].find('"')?;
    Some((keyword, &rest[first + 1..first + 1 + len]))
}

fn utm_from_name(lower: &str) -> Option<CrsCode> {
    let idx = lower.find("utm")?;
    let after = lower[idx + 3..].trim_start_matches(|c: char| c == '_' || c == ' ');
    let after = after.strip_prefix("zone")?;
    let after = after.trim_start_matches(|c: char| c == '_' || c == ' ');

    let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
    let zone: u8 = digits.parse().ok()?;
    let hemisphere = match after[digits.len()..].chars().next()? {
        'n' => Hemisphere::North,
        's' => Hemisphere::South,
        _ => return None,
    };
    if !(1..=60).contains(&zone) {
        return None;
    }

    let datum = if lower.contains("etrs") {
        Datum::Etrs89
    } else {
        Datum::Wgs84
    };
    Some(CrsCode::Utm {
        zone,
        hemisphere,
        datum,
    })
}

fn is_wgs84(lower: &str) -> bool {
    lower.contains("wgs 84") || lower.contains("wgs_1984") || lower.contains("wgs84")
}

fn excerpt(wkt: &str) -> String {
    wkt.chars().take(60).collect()
}
