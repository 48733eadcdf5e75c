//! Change detection and caching for contour geometry.
//!
//! Planning, sampling and marching squares together are far too expensive
//! to run every frame, so [`ContourCache`] keeps the last [`LevelSet`] along
//! with a [`Snapshot`] of the inputs that produced it. Each frame the
//! snapshot is compared against the current sources and viewport; the
//! pipeline reruns only on a periodic cadence or when something moved
//! enough to matter. Between recomputes the cached contours are stale but
//! cheap.

use std::fmt;

use glam::DVec2;

use crate::config::OverlayConfig;
use crate::contour::{extract_levels, select_levels, ContourConfig, LevelSet};
use crate::grid::{plan_grid, Grid, GridConfig};
use crate::source::PointSource;
use crate::viewport::{Bounds, ScreenToWorld};

/// Frames between unconditional recomputes.
pub const DEFAULT_CADENCE: u64 = 60;
/// Squared world distance a source may drift before invalidating the cache.
pub const DEFAULT_MOVEMENT_THRESHOLD_SQ: f64 = 0.25;
/// Strength change that invalidates the cache.
pub const DEFAULT_STRENGTH_EPSILON: f64 = 1e-6;
/// Summed corner movement of the viewport that invalidates the cache.
pub const DEFAULT_VIEWPORT_EPSILON: f64 = 1.0;

/// Recompute triggers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Zero disables the periodic trigger.
    pub cadence: u64,
    pub movement_threshold_sq: f64,
    pub strength_epsilon: f64,
    pub viewport_epsilon: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cadence: DEFAULT_CADENCE,
            movement_threshold_sq: DEFAULT_MOVEMENT_THRESHOLD_SQ,
            strength_epsilon: DEFAULT_STRENGTH_EPSILON,
            viewport_epsilon: DEFAULT_VIEWPORT_EPSILON,
        }
    }
}

/// The inputs of the last recompute. Used only for change detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub positions: Vec<DVec2>,
    pub strengths: Vec<f64>,
    pub bounds: Bounds,
}

impl Snapshot {
    pub fn capture(sources: &[PointSource], bounds: &Bounds) -> Self {
        Self {
            positions: sources.iter().map(|s| s.position).collect(),
            strengths: sources.iter().map(|s| s.strength).collect(),
            bounds: *bounds,
        }
    }
}

/// Why a frame recomputed its contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    /// Nothing cached yet, or the cache was invalidated.
    Empty,
    /// The periodic cadence fired.
    Periodic,
    /// Sources were added or removed.
    SourceCount,
    /// A source moved past the movement threshold.
    Moved,
    /// A source's strength changed.
    Strength,
    /// The viewport panned or zoomed.
    Viewport,
}

impl fmt::Display for RecomputeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecomputeReason::Empty => "empty cache",
            RecomputeReason::Periodic => "periodic",
            RecomputeReason::SourceCount => "source count changed",
            RecomputeReason::Moved => "source moved",
            RecomputeReason::Strength => "strength changed",
            RecomputeReason::Viewport => "viewport changed",
        };
        f.write_str(s)
    }
}

/// Cached contour geometry plus the snapshot it was computed from.
///
/// Owned by the caller and passed by `&mut` into [`ContourCache::update`];
/// nothing else mutates it.
#[derive(Debug, Clone, Default)]
pub struct ContourCache {
    snapshot: Option<Snapshot>,
    levels: LevelSet,
    recomputes: u64,
}

impl ContourCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns contours for this frame, recomputing them only when a trigger
    /// fires.
    pub fn update(
        &mut self,
        sources: &[PointSource],
        bounds: &Bounds,
        transform: &dyn ScreenToWorld,
        frame_index: u64,
        config: &OverlayConfig,
    ) -> &LevelSet {
        if let Some(reason) = self.check(sources, bounds, frame_index, &config.cache) {
            log::debug!("recomputing contours at frame {frame_index}: {reason}");
            self.levels = compute_levels(sources, bounds, transform, &config.grid, &config.contour);
            self.snapshot = Some(Snapshot::capture(sources, bounds));
            self.recomputes += 1;
        }
        &self.levels
    }

    /// Decides whether this frame needs a recompute, without doing it.
    pub fn check(
        &self,
        sources: &[PointSource],
        bounds: &Bounds,
        frame_index: u64,
        config: &CacheConfig,
    ) -> Option<RecomputeReason> {
        let Some(snapshot) = self.snapshot.as_ref().filter(|_| !self.levels.is_empty()) else {
            return Some(RecomputeReason::Empty);
        };
        if config.cadence > 0 && frame_index % config.cadence == 0 {
            return Some(RecomputeReason::Periodic);
        }
        if snapshot.positions.len() != sources.len() {
            return Some(RecomputeReason::SourceCount);
        }
        let moved = sources
            .iter()
            .zip(&snapshot.positions)
            .any(|(s, &p)| s.position.distance_squared(p) > config.movement_threshold_sq);
        if moved {
            return Some(RecomputeReason::Moved);
        }
        let reweighted = sources
            .iter()
            .zip(&snapshot.strengths)
            .any(|(s, &q)| (s.strength - q).abs() > config.strength_epsilon);
        if reweighted {
            return Some(RecomputeReason::Strength);
        }
        if snapshot.bounds.corner_delta(bounds) > config.viewport_epsilon {
            return Some(RecomputeReason::Viewport);
        }
        None
    }

    /// Drops the cached geometry; the next update recomputes.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
        self.levels.clear();
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Number of recomputes performed so far.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}

/// Full pipeline: plan, sample, pick levels, march.
pub fn compute_levels(
    sources: &[PointSource],
    bounds: &Bounds,
    transform: &dyn ScreenToWorld,
    grid: &GridConfig,
    contour: &ContourConfig,
) -> LevelSet {
    let plan = plan_grid(bounds, transform, sources.len(), grid);
    let sampled = Grid::sample(plan, sources, grid.close_threshold);
    let levels = select_levels(sources.len(), contour);
    let set = extract_levels(&sampled, &levels);
    log::debug!(
        "contour grid {}x{} step {:.2}, {} valid nodes, {} levels, {} segments",
        plan.count_x,
        plan.count_y,
        plan.step,
        sampled.valid_count(),
        levels.len(),
        set.segment_count()
    );
    set
}
