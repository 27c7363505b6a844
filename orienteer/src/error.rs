use std::path::PathBuf;

use crate::grid::Point;
use crate::terrain::TerrainColor;

/// Errors raised while planning a route over already loaded inputs.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The terrain raster holds a color that is not part of the palette.
    #[error("unknown terrain class {color} at {at}")]
    UnknownTerrainClass { at: Point, color: TerrainColor },

    /// The open set ran dry before the segment destination was settled.
    #[error("no path found for segment {segment} from {start} to {goal}")]
    PathNotFound {
        /// 0-based index of the failing segment
        segment: usize,
        start: Point,
        goal: Point,
    },

    #[error("a route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("waypoint {index} at {at} lies outside the map")]
    WaypointOutOfBounds { index: usize, at: Point },

    /// The elevation and terrain grids do not cover the same area.
    #[error("elevation grid is {elevation:?} but terrain grid is {terrain:?}")]
    DimensionMismatch {
        elevation: (usize, usize),
        terrain: (usize, usize),
    },
}

/// Errors raised while reading or writing the files around the planner.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to process image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{what} is {found:?} (width, height), expected {expected:?}")]
    Dimensions {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}
