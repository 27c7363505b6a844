use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Which waypoint the heuristic measures its distance against
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicTarget {
    /// The destination of the segment being searched
    #[default]
    CurrentSegment,
    /// Always the second waypoint, whatever segment is being searched
    FirstSegment,
}

/// Tunables for loading the inputs and costing moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Expected number of columns in the terrain and elevation inputs
    pub width: usize,
    /// Expected number of rows in the terrain and elevation inputs
    pub height: usize,
    /// Real-world length of one column step
    pub pixel_width: f64,
    /// Real-world length of one row step
    pub pixel_height: f64,
    /// Added to the heuristic of lake, swamp and marsh cells
    pub water_penalty: f64,
    pub heuristic_target: HeuristicTarget,
    /// RGB color painted over route cells in the output raster
    pub route_color: [u8; 3],
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            width: 395,
            height: 500,
            pixel_width: 10.29,
            pixel_height: 7.55,
            water_penalty: 100.0,
            heuristic_target: HeuristicTarget::CurrentSegment,
            route_color: [200, 100, 230],
        }
    }
}

impl RouteConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&json).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            line: e.line(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            RouteConfig::from_json(r#"{ "water_penalty": 40, "heuristic_target": "first_segment" }"#)
                .unwrap();

        assert_eq!(config.water_penalty, 40.0);
        assert_eq!(config.heuristic_target, HeuristicTarget::FirstSegment);
        assert_eq!(config.width, 395);
        assert_eq!(config.height, 500);
        assert_eq!(config.pixel_height, 7.55);
    }

    #[test]
    fn test_rejects_unknown_target() {
        assert!(RouteConfig::from_json(r#"{ "heuristic_target": "nowhere" }"#).is_err());
    }
}
