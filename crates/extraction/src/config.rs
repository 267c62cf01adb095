//! Configuration for the extractor.

use std::str::FromStr;

use forcing_common::AxisOrder;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Which coordinate names identify latitude and longitude, and how the two
/// horizontal axes of a mesh value array are ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateConvention {
    pub latitude: String,
    pub longitude: String,
    /// Required order of the mesh axes. `None` follows whatever order the
    /// grid's dimensions have; a pinned order rejects grids that differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_order: Option<AxisOrder>,
}

impl CoordinateConvention {
    /// `lat` / `lon` keys.
    pub fn lat_lon() -> Self {
        Self {
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
            axis_order: None,
        }
    }

    /// `latitude` / `longitude` keys.
    pub fn latitude_longitude() -> Self {
        Self {
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            axis_order: None,
        }
    }

    /// Pin the mesh axis order.
    pub fn with_axis_order(mut self, axis_order: AxisOrder) -> Self {
        self.axis_order = Some(axis_order);
        self
    }
}

impl Default for CoordinateConvention {
    fn default() -> Self {
        Self::lat_lon()
    }
}

impl FromStr for CoordinateConvention {
    type Err = ExtractionError;

    /// Parse `lat-lon`, `latitude-longitude`, or a custom `LAT_KEY,LON_KEY` pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lat-lon" | "lat/lon" => Ok(Self::lat_lon()),
            "latitude-longitude" | "latitude/longitude" => Ok(Self::latitude_longitude()),
            _ => match s.split_once(',') {
                Some((lat, lon)) if !lat.trim().is_empty() && !lon.trim().is_empty() => Ok(Self {
                    latitude: lat.trim().to_string(),
                    longitude: lon.trim().to_string(),
                    axis_order: None,
                }),
                _ => Err(ExtractionError::Config(format!(
                    "unknown coordinate convention '{}'",
                    s
                ))),
            },
        }
    }
}

/// Horizontal layout of the grids handed to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLayout {
    /// Infer from the coordinate dimensions.
    #[default]
    Auto,
    /// 1-D latitude and longitude axes forming a rectangular mesh.
    Mesh,
    /// Latitude and longitude arrays parallel to the values.
    Points,
}

impl FromStr for GridLayout {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "mesh" => Ok(Self::Mesh),
            "points" => Ok(Self::Points),
            _ => Err(ExtractionError::Config(format!("unknown grid layout '{}'", s))),
        }
    }
}

/// Configuration for the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub convention: CoordinateConvention,
    #[serde(default)]
    pub layout: GridLayout,
}

impl ExtractorConfig {
    pub fn new(convention: CoordinateConvention, layout: GridLayout) -> Self {
        Self { convention, layout }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.convention.latitude.is_empty() || self.convention.longitude.is_empty() {
            return Err(ExtractionError::Config(
                "coordinate keys must not be empty".to_string(),
            ));
        }
        if self.convention.latitude == self.convention.longitude {
            return Err(ExtractionError::Config(format!(
                "latitude and longitude keys are both '{}'",
                self.convention.latitude
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conventions() {
        assert_eq!(
            "lat-lon".parse::<CoordinateConvention>().unwrap(),
            CoordinateConvention::lat_lon()
        );
        assert_eq!(
            "Latitude-Longitude".parse::<CoordinateConvention>().unwrap(),
            CoordinateConvention::latitude_longitude()
        );
        let custom: CoordinateConvention = "nav_lat, nav_lon".parse().unwrap();
        assert_eq!(custom.latitude, "nav_lat");
        assert_eq!(custom.longitude, "nav_lon");
        assert!("x".parse::<CoordinateConvention>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ExtractorConfig::default().validate().is_ok());
        let bad = ExtractorConfig::new(
            CoordinateConvention {
                latitude: "lat".into(),
                longitude: "lat".into(),
                axis_order: None,
            },
            GridLayout::Auto,
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
convention:
  latitude: latitude
  longitude: longitude
  axis_order: lon_lat
layout: points
"#;
        let config: ExtractorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.convention.axis_order, Some(AxisOrder::LonLat));

        let unpinned: ExtractorConfig = serde_yaml::from_str("convention: { latitude: lat, longitude: lon }").unwrap();
        assert_eq!(unpinned.convention.axis_order, None);
        assert_eq!(config.layout, GridLayout::Points);
    }
}
