//! Adaptive sampling grid for the scalar potential.
//!
//! A [`GridPlan`] fixes where the nodes sit: a world-space origin, a square
//! step and a bounded node count on each axis. A [`Grid`] holds one
//! `Option<f64>` per node in row-major order; `None` marks a node that sits
//! inside some source's near field, where the potential blows up and would
//! only produce spurious contours.
//!
//! Sampling costs O(nodes x sources), which dominates the whole overlay, so
//! the planner keeps `count_x * count_y` under `max_dim²` no matter how far
//! the camera zooms out.

use glam::DVec2;

use crate::field::guarded_potential;
use crate::source::PointSource;
use crate::viewport::{Bounds, ScreenToWorld};

/// Sampling interval on screen, in pixels.
pub const DEFAULT_SCREEN_INTERVAL: f64 = 20.0;
/// Smallest world-space step the planner will produce.
pub const DEFAULT_MIN_STEP: f64 = 5.0;
/// Upper bound on nodes per axis.
pub const DEFAULT_MAX_DIM: usize = 300;
/// Nodes closer than this to any source are invalid.
pub const DEFAULT_CLOSE_THRESHOLD: f64 = 15.0;
/// Cap on the source-count coarsening factor.
const MAX_DENSITY_FACTOR: f64 = 4.0;

/// Grid planner and sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub screen_interval: f64,
    pub min_step: f64,
    pub max_dim: usize,
    pub close_threshold: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            screen_interval: DEFAULT_SCREEN_INTERVAL,
            min_step: DEFAULT_MIN_STEP,
            max_dim: DEFAULT_MAX_DIM,
            close_threshold: DEFAULT_CLOSE_THRESHOLD,
        }
    }
}

/// Node layout of a sampling grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlan {
    pub origin_x: f64,
    pub origin_y: f64,
    pub step: f64,
    pub count_x: usize,
    pub count_y: usize,
}

impl GridPlan {
    /// A plan with no nodes.
    pub fn empty() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            step: 0.0,
            count_x: 0,
            count_y: 0,
        }
    }

    /// Lays out nodes over `bounds` at `step`, growing the step uniformly
    /// if either axis would exceed `max_dim` nodes.
    ///
    /// Degenerate bounds, a non-positive step, or `max_dim == 0` give an
    /// empty plan.
    pub fn with_step(bounds: &Bounds, step: f64, max_dim: usize) -> Self {
        if !bounds.is_valid() || !step.is_finite() || step <= 0.0 || max_dim == 0 {
            return Self::empty();
        }
        // Counts stay in f64 until they are known to fit.
        let limit = max_dim as f64;
        let mut step = step;
        let (mut nx, mut ny) = node_counts(bounds, step);
        let widest = nx.max(ny);
        if widest > limit {
            step *= widest / limit;
            (nx, ny) = node_counts(bounds, step);
        }
        Self {
            origin_x: bounds.min_x,
            origin_y: bounds.min_y,
            step,
            count_x: nx.min(limit) as usize,
            count_y: ny.min(limit) as usize,
        }
    }

    pub fn len(&self) -> usize {
        self.count_x * self.count_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World x of node column `i`.
    pub fn node_x(&self, i: usize) -> f64 {
        self.origin_x + i as f64 * self.step
    }

    /// World y of node row `j`.
    pub fn node_y(&self, j: usize) -> f64 {
        self.origin_y + j as f64 * self.step
    }

    pub fn node(&self, i: usize, j: usize) -> DVec2 {
        DVec2::new(self.node_x(i), self.node_y(j))
    }
}

/// `floor(extent / step) + 1` nodes per axis.
fn node_counts(bounds: &Bounds, step: f64) -> (f64, f64) {
    let count = |extent: f64| (extent / step).floor() + 1.0;
    (count(bounds.width()), count(bounds.height()))
}

/// World-space length of `interval` screen pixels, averaged over the X and
/// Y screen axes so rotated or anisotropic cameras still get a sane step.
pub fn world_step_for_screen_interval(transform: &dyn ScreenToWorld, interval: f64) -> f64 {
    let origin = transform.screen_to_world(DVec2::ZERO);
    let along_x = transform
        .screen_to_world(DVec2::new(interval, 0.0))
        .distance(origin);
    let along_y = transform
        .screen_to_world(DVec2::new(0.0, interval))
        .distance(origin);
    0.5 * (along_x + along_y)
}

/// Plans the sampling grid for one recompute.
///
/// The base step follows the on-screen interval, is clamped to
/// `min_step`, and is then coarsened by `min(1 + sources/100, 4)` so busy
/// scenes trade density for frame time.
pub fn plan_grid(
    bounds: &Bounds,
    transform: &dyn ScreenToWorld,
    source_count: usize,
    config: &GridConfig,
) -> GridPlan {
    let base = world_step_for_screen_interval(transform, config.screen_interval);
    if !base.is_finite() {
        return GridPlan::empty();
    }
    let density = (1.0 + source_count as f64 / 100.0).min(MAX_DENSITY_FACTOR);
    let step = base.max(config.min_step) * density;
    GridPlan::with_step(bounds, step, config.max_dim)
}

/// Sampled potential over a [`GridPlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    plan: GridPlan,
    values: Vec<Option<f64>>,
}

impl Grid {
    /// Samples `Σ strength/distance` at every node.
    ///
    /// Nodes within `close_threshold` of a source are `None`. With no
    /// sources at all every node is `None`: there is nothing to contour.
    pub fn sample(plan: GridPlan, sources: &[PointSource], close_threshold: f64) -> Self {
        let values = if sources.is_empty() {
            vec![None; plan.len()]
        } else {
            (0..plan.count_y)
                .flat_map(|j| (0..plan.count_x).map(move |i| (i, j)))
                .map(|(i, j)| guarded_potential(sources, plan.node(i, j), close_threshold))
                .collect()
        };
        Self { plan, values }
    }

    pub fn plan(&self) -> &GridPlan {
        &self.plan
    }

    /// Row-major node values.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value at column `i`, row `j`; `None` when invalid or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.plan.count_x || j >= self.plan.count_y {
            return None;
        }
        self.values[j * self.plan.count_x + i]
    }

    /// Number of nodes holding a value.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::nearest_distance;
    use crate::viewport::ViewTransform;

    fn square(half: f64) -> Bounds {
        Bounds::new(-half, -half, half, half)
    }

    #[test]
    fn with_step_counts_nodes_inclusively() {
        let plan = GridPlan::with_step(&square(100.0), 10.0, 300);
        assert_eq!((plan.count_x, plan.count_y), (21, 21));
        assert_eq!(plan.node(0, 0), DVec2::new(-100.0, -100.0));
        assert_eq!(plan.node(20, 20), DVec2::new(100.0, 100.0));
    }

    #[test]
    fn with_step_rescales_to_fit_max_dim() {
        let plan = GridPlan::with_step(&square(1000.0), 1.0, 100);
        assert!(plan.count_x <= 100 && plan.count_y <= 100);
        assert!(plan.step > 1.0);
    }

    #[test]
    fn huge_finite_bounds_stay_within_max_dim() {
        let bounds = square(1e25);
        let plan = plan_grid(&bounds, &ViewTransform::default(), 2, &GridConfig::default());
        assert_eq!((plan.count_x, plan.count_y), (DEFAULT_MAX_DIM, DEFAULT_MAX_DIM));
        assert!(plan.step.is_finite() && plan.step > 1e22);
        let grid = Grid::sample(plan, &[PointSource::new(0.0, 0.0, 1.0)], 15.0);
        assert_eq!(grid.values().len(), DEFAULT_MAX_DIM * DEFAULT_MAX_DIM);
    }

    #[test]
    fn near_max_finite_bounds_plan_without_overflow() {
        let bounds = Bounds::new(-1e307, -1.0, 1e307, 1.0);
        let plan = GridPlan::with_step(&bounds, 5.0, 300);
        assert!(plan.count_x <= 300 && plan.count_y >= 1);
    }

    #[test]
    fn degenerate_bounds_plan_is_empty() {
        let inverted = Bounds::new(10.0, 10.0, -10.0, -10.0);
        assert!(GridPlan::with_step(&inverted, 5.0, 300).is_empty());
        let flat = Bounds::new(0.0, 0.0, 100.0, 0.0);
        assert!(GridPlan::with_step(&flat, 5.0, 300).is_empty());
        assert!(GridPlan::with_step(&square(10.0), 0.0, 300).is_empty());
    }

    #[test]
    fn screen_interval_converts_through_zoom() {
        let t = ViewTransform {
            zoom: 2.0,
            ..ViewTransform::default()
        };
        assert!((world_step_for_screen_interval(&t, 20.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn screen_interval_averages_anisotropic_axes() {
        let stretch = |p: DVec2| DVec2::new(p.x * 2.0, p.y * 4.0);
        assert!((world_step_for_screen_interval(&stretch, 1.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn plan_clamps_to_min_step_when_zoomed_in() {
        let t = ViewTransform {
            zoom: 100.0,
            ..ViewTransform::default()
        };
        let plan = plan_grid(&square(50.0), &t, 0, &GridConfig::default());
        assert_eq!(plan.step, DEFAULT_MIN_STEP);
    }

    #[test]
    fn plan_coarsens_with_source_count() {
        let t = ViewTransform::default();
        let config = GridConfig::default();
        let few = plan_grid(&square(400.0), &t, 0, &config);
        let many = plan_grid(&square(400.0), &t, 100, &config);
        let crowd = plan_grid(&square(400.0), &t, 10_000, &config);
        assert!((few.step - 20.0).abs() < 1e-12);
        assert!((many.step - 40.0).abs() < 1e-12);
        assert!((crowd.step - 80.0).abs() < 1e-12, "factor is capped at 4");
    }

    #[test]
    fn sample_without_sources_is_all_invalid() {
        let plan = GridPlan::with_step(&square(50.0), 10.0, 300);
        let grid = Grid::sample(plan, &[], DEFAULT_CLOSE_THRESHOLD);
        assert_eq!(grid.values().len(), 121);
        assert_eq!(grid.valid_count(), 0);
    }

    #[test]
    fn sample_marks_near_source_nodes_invalid() {
        let plan = GridPlan::with_step(&square(100.0), 10.0, 300);
        let sources = [PointSource::new(0.0, 0.0, 10.0)];
        let grid = Grid::sample(plan, &sources, 15.0);
        // Origin and its four axis neighbours at distance 10.
        assert_eq!(grid.get(10, 10), None);
        assert_eq!(grid.get(11, 10), None);
        assert_eq!(grid.get(10, 9), None);
        // Diagonal neighbour at ~14.14 is still too close.
        assert_eq!(grid.get(11, 11), None);
        // Two steps out is far enough.
        let v = grid.get(12, 10).unwrap();
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let plan = GridPlan::with_step(&square(10.0), 10.0, 300);
        let grid = Grid::sample(plan, &[PointSource::new(500.0, 0.0, 1.0)], 15.0);
        assert!(grid.get(2, 2).is_some());
        assert_eq!(grid.get(3, 0), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn plan_never_exceeds_max_dim(
                half_w in 0.1_f64..1e6,
                half_h in 0.1_f64..1e6,
                zoom in 1e-3_f64..1e3,
                sources in 0_usize..1000,
                max_dim in 2_usize..400,
            ) {
                let t = ViewTransform { zoom, ..ViewTransform::default() };
                let config = GridConfig { max_dim, ..GridConfig::default() };
                let bounds = Bounds::new(-half_w, -half_h, half_w, half_h);
                let plan = plan_grid(&bounds, &t, sources, &config);
                prop_assert!(plan.count_x <= max_dim && plan.count_y <= max_dim);
                prop_assert!(plan.count_x >= 1 && plan.count_y >= 1);
                prop_assert!(plan.step >= config.min_step);
            }

            #[test]
            fn valid_nodes_match_direct_sum(
                sx in -80.0_f64..80.0,
                sy in -80.0_f64..80.0,
                q in -20.0_f64..20.0,
            ) {
                let sources = [
                    PointSource::new(sx, sy, q),
                    PointSource::new(-sx, sy * 0.5, -q * 0.5),
                ];
                let plan = GridPlan::with_step(&Bounds::new(-100.0, -100.0, 100.0, 100.0), 10.0, 300);
                let grid = Grid::sample(plan, &sources, 15.0);
                for j in 0..plan.count_y {
                    for i in 0..plan.count_x {
                        let p = plan.node(i, j);
                        match grid.get(i, j) {
                            Some(v) => {
                                let direct: f64 = sources
                                    .iter()
                                    .map(|s| s.strength / (p - s.position).length())
                                    .sum();
                                prop_assert!((v - direct).abs() <= 1e-9 * (1.0 + direct.abs()));
                            }
                            None => prop_assert!(nearest_distance(&sources, p) < 15.0),
                        }
                    }
                }
            }
        }
    }
}
