//! Least-cost routes between orienteering waypoints.
//!
//! A terrain raster decides which cells can be walked, an elevation grid adds
//! the climb to each move, and the route is stitched together from one
//! best-first search per pair of consecutive waypoints.

pub mod config;
pub mod cost;
pub mod error;
pub mod find;
pub mod grid;
pub mod route;
pub mod terrain;
pub mod util;

pub use config::{HeuristicTarget, RouteConfig};
pub use cost::CostModel;
pub use error::{LoadError, RouteError};
pub use find::{PathFinder, PathFinderState, PathResult, SearchContext, Visited, VisitedItem};
pub use grid::{
    CellStorage, ElevationGrid, MapStorage, MapTrait, NodeReference, Point, TerrainGrid, TerrainMap,
};
pub use route::{plan_route, Route};
pub use terrain::{PaletteEntry, TerrainClass, TerrainColor, TerrainPalette};
