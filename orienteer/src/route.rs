use log::{debug, info};

use crate::config::{HeuristicTarget, RouteConfig};
use crate::cost::CostModel;
use crate::error::RouteError;
use crate::find::{PathFinder, PathFinderState, PathResult, SearchContext};
use crate::grid::{MapTrait, Point, TerrainMap};

/// A route through every waypoint, one search result per leg.
#[derive(Debug, Clone)]
pub struct Route {
    pub segments: Vec<PathResult>,
    /// Ledger value of the last waypoint, accumulated over every segment
    pub total_cost: f64,
    pub context: SearchContext,
}

impl Route {
    /// Every point of every segment in travel order. Waypoints shared by two
    /// segments appear twice.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.segments.iter().flat_map(|s| s.path.iter().copied())
    }
}

/// Search each consecutive pair of waypoints in order, carrying the cost
/// ledger from one segment into the next.
pub fn plan_route(
    map: &TerrainMap,
    waypoints: &[Point],
    config: &RouteConfig,
) -> Result<Route, RouteError> {
    if waypoints.len() < 2 {
        return Err(RouteError::TooFewWaypoints(waypoints.len()));
    }
    if let Some((index, at)) = waypoints
        .iter()
        .enumerate()
        .find(|(_, p)| !map.is_valid(**p))
    {
        return Err(RouteError::WaypointOutOfBounds { index, at: *at });
    }

    let model = CostModel::from(config);
    let mut context = SearchContext::new(map);
    let mut segments = Vec::with_capacity(waypoints.len() - 1);

    for (segment, leg) in waypoints.windows(2).enumerate() {
        let (start, goal) = (leg[0], leg[1]);
        info!("segment {}: searching {} -> {}", segment, start, goal);

        let mut finder = PathFinder::new(map, start, goal, context, model);
        if config.heuristic_target == HeuristicTarget::FirstSegment {
            finder = finder.with_heuristic_goal(waypoints[1]);
        }

        let (state, returned) = finder.finish(map)?;
        context = returned;

        match state {
            PathFinderState::PathFound(result) => {
                info!(
                    "segment {}: reached {} at cost {:.2} after settling {} cells",
                    segment, goal, result.total_cost, result.settled
                );
                debug!("segment {}: {} cells on the path", segment, result.path.len());
                segments.push(result);
            }
            _ => {
                return Err(RouteError::PathNotFound {
                    segment,
                    start,
                    goal,
                })
            }
        }
    }

    let total_cost = segments
        .last()
        .map(|s| context.cost(s.goal).unwrap_or(s.total_cost))
        .unwrap_or_default();

    Ok(Route {
        segments,
        total_cost,
        context,
    })
}
