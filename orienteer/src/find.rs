use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    ops::{Deref, DerefMut},
};

use log::trace;

use crate::cost::CostModel;
use crate::error::RouteError;
use crate::grid::{CellStorage, MapStorage, MapTrait, Point, TerrainMap};

/// The objects that we store in the priority queue.
///
/// The same point may be queued several times with different priorities;
/// only the first one popped is settled, the rest are discarded when popped.
#[derive(Debug)]
struct ToVisit {
    f: f64,
    seq: u64,
    point: Point,
    from: Option<Point>,
}

impl Ord for ToVisit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.seq.cmp(&other.seq))
            .reverse() // reverse for BinaryHeap to be a min-heap
    }
}

impl PartialOrd for ToVisit {
    fn partial_cmp(&self, other: &ToVisit) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ToVisit {
    fn eq(&self, other: &ToVisit) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToVisit {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisitedItem {
    /// `None` marks the root of the chain
    pub from: Option<Point>,
}

/// Parent link of a single cell, `None` until the cell is settled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Visited(Option<VisitedItem>);

impl Deref for Visited {
    type Target = Option<VisitedItem>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for Visited {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Mutable state shared by the segment searches of one run.
///
/// The cost ledger is kept for the whole run so costs carry over from one
/// segment into the next. Parent links only describe the segment currently
/// being searched and are cleared when a new one starts.
#[derive(Debug, Clone)]
pub struct SearchContext {
    ledger: CellStorage<Option<f64>>,
    parents: CellStorage<Visited>,
}

impl SearchContext {
    pub fn new(map: &TerrainMap) -> Self {
        Self {
            ledger: map.create_storage(),
            parents: map.create_storage(),
        }
    }

    /// Accumulated cost last recorded for the point
    pub fn cost(&self, point: Point) -> Option<f64> {
        self.ledger.get(point)
    }

    pub fn parent(&self, point: Point) -> Visited {
        self.parents.get(point)
    }

    /// Walk the parent links back from `goal` to the root and return the
    /// points in start to goal order. `None` if `goal` was not settled by the
    /// current segment or is out of bounds.
    pub fn route_to(&self, goal: Point) -> Option<Vec<Point>> {
        if !self.parents.is_valid(goal) {
            return None;
        }

        let mut path = vec![goal];
        let mut previous_visit = self.parents.get(goal);

        loop {
            previous_visit = match previous_visit {
                Visited(Some(VisitedItem { from: None })) => {
                    // we found the starting point, we are done
                    break;
                }
                Visited(Some(VisitedItem { from: Some(from) })) => {
                    // a chain can never be longer than the grid
                    if path.len() > self.parents.len() {
                        return None;
                    }
                    path.push(from);
                    self.parents.get(from)
                }
                Visited(None) => return None,
            }
        }

        path.reverse();
        Some(path)
    }

    fn begin_segment(&mut self) {
        self.parents.clear();
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PathResult {
    /// Every point of the segment, start and goal included
    pub path: Vec<Point>,
    pub start: Point,
    pub goal: Point,
    /// Ledger value of the goal when it was settled
    pub total_cost: f64,
    /// Number of points settled by the search
    pub settled: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathFinderState {
    Computing,
    NoPathFound,
    PathFound(PathResult),
}

impl PathFinderState {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// Best-first search for a single segment.
#[derive(Debug)]
pub struct PathFinder {
    start: Point,
    goal: Point,
    heuristic_goal: Point,
    model: CostModel,
    context: SearchContext,
    settled: CellStorage<bool>,
    settled_count: usize,
    visit_list: BinaryHeap<ToVisit>,
    next_seq: u64,
    state: PathFinderState,
}

impl PathFinder {
    /// Prepare a search from `start` to `goal`. The context keeps its ledger,
    /// its parent links are reset.
    pub fn new(
        map: &TerrainMap,
        start: Point,
        goal: Point,
        mut context: SearchContext,
        model: CostModel,
    ) -> Self {
        context.begin_segment();

        let mut finder = Self {
            start,
            goal,
            heuristic_goal: goal,
            model,
            context,
            settled: map.create_storage(),
            settled_count: 0,
            visit_list: BinaryHeap::new(),
            next_seq: 0,
            state: PathFinderState::Computing,
        };
        finder.seed();
        finder
    }

    /// Estimate distances towards `target` instead of the segment goal
    pub fn with_heuristic_goal(mut self, target: Point) -> Self {
        self.heuristic_goal = target;
        self.visit_list.clear();
        self.seed();
        self
    }

    fn seed(&mut self) {
        let g = match self.context.cost(self.start) {
            Some(g) => g,
            None => {
                *self.context.ledger.get_mut(self.start) = Some(0.0);
                0.0
            }
        };
        let f = g + self
            .model
            .heuristic(self.start, self.heuristic_goal, 0.0, false);
        self.push(self.start, None, f);
    }

    fn push(&mut self, point: Point, from: Option<Point>, f: f64) {
        self.visit_list.push(ToVisit {
            f,
            seq: self.next_seq,
            point,
            from,
        });
        self.next_seq += 1;
    }

    pub fn finish(mut self, map: &TerrainMap) -> Result<(PathFinderState, SearchContext), RouteError> {
        loop {
            match self.step(map)? {
                PathFinderState::Computing => {}
                s => return Ok((s, self.context)),
            }
        }
    }

    pub fn step(&mut self, map: &TerrainMap) -> Result<PathFinderState, RouteError> {
        if self.state.is_done() {
            return Ok(self.state.clone());
        }
        let Some(visit) = self.visit_list.pop() else {
            self.state = PathFinderState::NoPathFound;
            return Ok(self.state.clone());
        };

        if self.settled.get(visit.point) {
            return Ok(self.state.clone());
        }

        *self.settled.get_mut(visit.point) = true;
        self.settled_count += 1;
        *self.context.parents.get_mut(visit.point) = Visited(Some(VisitedItem { from: visit.from }));

        // blocked cells are settled but lead nowhere
        if !map.is_walkable(visit.point)? {
            return Ok(self.state.clone());
        }

        if visit.point == self.goal {
            self.state = PathFinderState::PathFound(PathResult {
                // the goal was linked just above
                path: self.context.route_to(self.goal).unwrap_or_default(),
                start: self.start,
                goal: self.goal,
                total_cost: self.context.cost(self.goal).unwrap_or_default(),
                settled: self.settled_count,
            });

            return Ok(self.state.clone());
        }

        // every queued point had its ledger entry written before being pushed
        let g = self.context.cost(visit.point).unwrap_or_default();
        let elevation = map.elevation_at(visit.point);

        for point in map.neighbors_of(visit.point) {
            let neighbor_elevation = map.elevation_at(point);
            let climb = (elevation - neighbor_elevation).abs();
            let step = self.model.step_cost(
                elevation,
                neighbor_elevation,
                point.x.abs_diff(visit.point.x),
                point.y.abs_diff(visit.point.y),
            );

            // last write wins, even over a cheaper earlier entry
            let neighbor_g = g + step;
            *self.context.ledger.get_mut(point) = Some(neighbor_g);

            let h = self
                .model
                .heuristic(point, self.heuristic_goal, climb, map.is_water(point));
            trace!("queue {} from {}: g={:.2} h={:.0}", point, visit.point, neighbor_g, h);
            self.push(point, Some(visit.point), neighbor_g + h);
        }

        Ok(self.state.clone())
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn is_settled(&self, point: Point) -> bool {
        self.settled.get(point)
    }

    pub fn settled_count(&self) -> usize {
        self.settled_count
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::grid::{ElevationGrid, TerrainGrid};
    use crate::terrain::{TerrainClass, TerrainColor};

    fn create_open_map(width: usize, height: usize) -> TerrainMap {
        TerrainMap::new(
            ElevationGrid::flat(width, height, 0.0),
            TerrainGrid::filled(width, height, TerrainClass::OpenLand.color()),
        )
        .unwrap()
    }

    /// 7x7 map with a walled corridor, `X` is impassible vegetation
    fn create_basic_map() -> TerrainMap {
        let layout = [
            "XXXXXXX", //
            "X XXX X", //
            "X XXX X", //
            "X X   X", //
            "X X XXX", //
            "X      ", //
            "XXXXXXX", //
        ];
        let mut map = create_open_map(7, 7);
        for (y, row) in layout.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == 'X' {
                    map.terrain
                        .set(Point::new(x, y), TerrainClass::ImpassibleVegetation.color());
                }
            }
        }
        map
    }

    fn search(map: &TerrainMap, start: Point, goal: Point) -> Result<PathFinderState, RouteError> {
        let context = SearchContext::new(map);
        let finder = PathFinder::new(map, start, goal, context, CostModel::default());
        finder.finish(map).map(|(state, _)| state)
    }

    #[test]
    fn test_flat_corridor() {
        let map = create_open_map(395, 500);

        let state = search(&map, Point::new(0, 0), Point::new(0, 5)).unwrap();
        let PathFinderState::PathFound(result) = state else {
            panic!("expected a path, got {:?}", state);
        };

        assert!((result.total_cost - 5.0 * 7.55).abs() < 1e-9);
        assert_eq!(result.path.len(), 6);
        assert_eq!(result.path.first(), Some(&Point::new(0, 0)));
        assert_eq!(result.path.last(), Some(&Point::new(0, 5)));
        assert!(result.path.iter().all(|p| p.x == 0));
    }

    #[test]
    fn test_basic_route() {
        let map = create_basic_map();

        let state = search(&map, Point::new(1, 1), Point::new(5, 1)).unwrap();
        let PathFinderState::PathFound(result) = state else {
            panic!("expected a path, got {:?}", state);
        };

        // down the left corridor, along the bottom, up the middle and right
        assert_eq!(result.path.len(), 13);
        assert!(result
            .path
            .windows(2)
            .all(|w| w[0].x.abs_diff(w[1].x) + w[0].y.abs_diff(w[1].y) == 1));
        assert!(result.path.iter().all(|p| map.is_walkable(*p).unwrap()));
    }

    #[test]
    fn test_basic_no_route() {
        let map = create_basic_map();

        // the goal sits in the wall
        assert!(matches!(
            search(&map, Point::new(1, 1), Point::new(0, 5)),
            Ok(PathFinderState::NoPathFound)
        ));
    }

    #[test]
    fn test_encircled_goal() {
        let mut map = create_open_map(9, 9);
        for p in map.neighbors_of(Point::new(4, 4)).collect::<Vec<_>>() {
            map.terrain.set(p, TerrainClass::ImpassibleVegetation.color());
        }

        assert!(matches!(
            search(&map, Point::new(0, 0), Point::new(4, 4)),
            Ok(PathFinderState::NoPathFound)
        ));
    }

    #[test]
    fn test_unknown_color() {
        let mut map = create_open_map(5, 5);
        map.terrain.set(Point::new(0, 2), TerrainColor::rgb(1, 2, 3));

        let err = search(&map, Point::new(0, 0), Point::new(0, 4)).unwrap_err();
        assert!(matches!(
            err,
            RouteError::UnknownTerrainClass {
                at: Point { x: 0, y: 2 },
                color: TerrainColor(0xFF010203),
            }
        ));
    }

    #[test]
    fn test_start_is_goal() {
        let map = create_open_map(3, 3);

        let state = search(&map, Point::new(1, 1), Point::new(1, 1)).unwrap();
        let PathFinderState::PathFound(result) = state else {
            panic!("expected a path, got {:?}", state);
        };
        assert_eq!(result.path, vec![Point::new(1, 1)]);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn test_parent_chains_terminate() {
        let mut map = create_basic_map();
        map.elevation.set(Point::new(1, 3), 12.0);
        map.elevation.set(Point::new(3, 5), -4.0);
        map.terrain
            .set(Point::new(1, 4), TerrainClass::LakeSwampMarsh.color());

        let context = SearchContext::new(&map);
        let mut finder = PathFinder::new(
            &map,
            Point::new(1, 1),
            Point::new(5, 1),
            context,
            CostModel::default(),
        );
        while !finder.step(&map).unwrap().is_done() {}

        for y in 0..map.height() {
            for x in 0..map.width() {
                let point = Point::new(x, y);
                if !finder.is_settled(point) {
                    assert_eq!(finder.context().parent(point), Visited(None));
                    continue;
                }

                let chain = finder.context().route_to(point).unwrap();
                assert_eq!(chain.first(), Some(&Point::new(1, 1)));
                for (i, p) in chain.iter().enumerate() {
                    assert!(!chain[i + 1..].contains(p), "{} repeats in chain", p);
                }
            }
        }
    }

    #[test]
    fn test_route_to_unsettled_point() {
        let map = create_open_map(20, 20);
        let context = SearchContext::new(&map);
        let finder = PathFinder::new(
            &map,
            Point::new(0, 0),
            Point::new(0, 3),
            context,
            CostModel::default(),
        );
        let (_, context) = finder.finish(&map).unwrap();

        assert_eq!(context.route_to(Point::new(19, 19)), None);
        assert_eq!(context.route_to(Point::new(20, 0)), None);
        assert_eq!(
            context.route_to(Point::new(0, 3)).map(|path| path.len()),
            Some(4)
        );
    }

    #[test]
    fn test_heuristic_goal_sets_start_priority() {
        let map = create_open_map(10, 10);
        let start = Point::new(0, 0);

        let finder = PathFinder::new(
            &map,
            start,
            Point::new(0, 2),
            SearchContext::new(&map),
            CostModel::default(),
        );
        assert_eq!(finder.visit_list.peek().map(|v| v.f), Some(2.0));

        // sqrt(6^2 + 7^2) = 9.2
        let finder = finder.with_heuristic_goal(Point::new(6, 7));
        assert_eq!(finder.visit_list.len(), 1);
        assert_eq!(finder.visit_list.peek().map(|v| v.f), Some(9.0));
    }

    #[test]
    fn test_stale_entries_are_skipped() {
        let map = create_open_map(6, 6);
        let context = SearchContext::new(&map);
        let mut finder = PathFinder::new(
            &map,
            Point::new(0, 0),
            Point::new(5, 5),
            context,
            CostModel::default(),
        );

        // settle the start and two more points
        for _ in 0..3 {
            finder.step(&map).unwrap();
        }
        let settled = finder.settled_count();
        let ledger = finder.context().clone();

        // queue a stale entry for the start ahead of everything else
        finder.push(Point::new(0, 0), None, f64::NEG_INFINITY);
        let queued = finder.visit_list.len();
        finder.step(&map).unwrap();

        assert_eq!(finder.visit_list.len(), queued - 1);
        assert_eq!(finder.settled_count(), settled);
        for y in 0..6 {
            for x in 0..6 {
                let p = Point::new(x, y);
                assert_eq!(finder.context().cost(p), ledger.cost(p));
            }
        }
    }

    #[test]
    fn test_each_point_settled_once() {
        let map = create_open_map(8, 8);
        let context = SearchContext::new(&map);
        let mut finder = PathFinder::new(
            &map,
            Point::new(0, 0),
            Point::new(7, 7),
            context,
            CostModel::default(),
        );

        let mut pops = 0;
        while !finder.step(&map).unwrap().is_done() {
            pops += 1;
        }

        let marked = (0..8)
            .flat_map(|y| (0..8).map(move |x| Point::new(x, y)))
            .filter(|p| finder.is_settled(*p))
            .count();
        assert_eq!(finder.settled_count(), marked);
        // interior points are queued by several neighbors
        assert!(pops + 1 > marked);
    }

    #[test]
    fn test_ledger_carried_into_start() {
        let map = create_open_map(4, 4);
        let model = CostModel::default();

        let finder = PathFinder::new(&map, Point::new(0, 0), Point::new(2, 0), SearchContext::new(&map), model);
        let (_, context) = finder.finish(&map).unwrap();
        let carried = context.cost(Point::new(2, 0)).unwrap();

        let finder = PathFinder::new(&map, Point::new(2, 0), Point::new(2, 1), context, model);
        let (state, _) = finder.finish(&map).unwrap();
        let PathFinderState::PathFound(result) = state else {
            panic!("expected a path, got {:?}", state);
        };
        assert!((result.total_cost - (carried + 7.55)).abs() < 1e-9);
        assert_eq!(result.path, vec![Point::new(2, 0), Point::new(2, 1)]);
    }
}
