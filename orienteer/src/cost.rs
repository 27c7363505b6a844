use crate::config::RouteConfig;
use crate::grid::Point;

/// Prices moves between adjacent cells and estimates the rest of the way.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CostModel {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub water_penalty: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from(&RouteConfig::default())
    }
}

impl From<&RouteConfig> for CostModel {
    fn from(config: &RouteConfig) -> Self {
        Self {
            pixel_width: config.pixel_width,
            pixel_height: config.pixel_height,
            water_penalty: config.water_penalty,
        }
    }
}

impl CostModel {
    /// 3-D length of a single move. `dx` and `dy` are the column and row
    /// deltas of the move; the elevation difference is taken unscaled.
    pub fn step_cost(&self, from_elevation: f64, to_elevation: f64, dx: usize, dy: usize) -> f64 {
        let horizontal = dx as f64 * self.pixel_width;
        let vertical = dy as f64 * self.pixel_height;
        let depth = to_elevation - from_elevation;

        (horizontal * horizontal + vertical * vertical + depth * depth).sqrt()
    }

    /// Estimate for `node` towards `goal`: the truncated straight-line grid
    /// distance plus the truncated climb of the step into `node`, plus the
    /// water penalty on lake cells.
    ///
    /// The climb term depends on how the node was reached, so the estimate is
    /// not a lower bound on the remaining cost.
    pub fn heuristic(&self, node: Point, goal: Point, climb: f64, is_water: bool) -> f64 {
        let dx = node.x.abs_diff(goal.x) as f64;
        let dy = node.y.abs_diff(goal.y) as f64;
        let estimate = (dx * dx + dy * dy).sqrt().trunc() + climb.trunc();

        if is_water {
            estimate + self.water_penalty
        } else {
            estimate
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_flat_steps() {
        let model = CostModel::default();
        assert!((model.step_cost(0.0, 0.0, 0, 1) - 7.55).abs() < 1e-12);
        assert!((model.step_cost(0.0, 0.0, 1, 0) - 10.29).abs() < 1e-12);
    }

    #[test]
    fn test_climb_is_unscaled() {
        let model = CostModel {
            pixel_width: 3.0,
            pixel_height: 1.0,
            water_penalty: 0.0,
        };
        // 3-4-5 triangle, sign of the elevation change does not matter
        assert!((model.step_cost(10.0, 14.0, 1, 0) - 5.0).abs() < 1e-12);
        assert!((model.step_cost(14.0, 10.0, 1, 0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_heuristic_truncates() {
        let model = CostModel::default();
        let goal = Point::new(3, 4);

        assert_eq!(model.heuristic(Point::new(0, 0), goal, 0.0, false), 5.0);
        // sqrt(2) -> 1, 2.9 -> 2
        assert_eq!(model.heuristic(Point::new(2, 3), goal, 2.9, false), 3.0);
        assert_eq!(model.heuristic(goal, goal, 0.0, true), 100.0);
    }
}
