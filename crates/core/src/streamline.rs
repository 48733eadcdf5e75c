//! Field-line tracing.
//!
//! Rays are seeded evenly around every source and integrated with fixed-size
//! steps along the normalized field. A ray follows the field out of a
//! positive source and against it out of a negative one, so every line runs
//! toward the opposite pole. Nothing is cached: lines are cheap enough to
//! retrace each frame and must follow a dragged source without lag.

use std::f64::consts::TAU;

use glam::DVec2;
use serde::Serialize;

use crate::field::{field_at, nearest_distance};
use crate::grid::DEFAULT_CLOSE_THRESHOLD;
use crate::source::PointSource;
use crate::viewport::Bounds;

/// Rays seeded around each source.
pub const DEFAULT_RAYS_PER_SOURCE: usize = 10;
/// Seed distance from the source.
pub const DEFAULT_START_OFFSET: f64 = 20.0;
/// Integration step cap per ray.
pub const DEFAULT_MAX_STEPS: usize = 120;
/// World-space length of one step.
pub const DEFAULT_STEP_LENGTH: f64 = 10.0;
/// Field magnitude below which a ray stops.
pub const DEFAULT_MIN_FIELD: f64 = 1e-5;
/// Upper bound on up-front allocation; vectors still grow past it.
const CAPACITY_HINT_CAP: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamlineConfig {
    pub rays_per_source: usize,
    pub start_offset: f64,
    pub max_steps: usize,
    pub step_length: f64,
    pub close_threshold: f64,
    pub min_field: f64,
}

impl Default for StreamlineConfig {
    fn default() -> Self {
        Self {
            rays_per_source: DEFAULT_RAYS_PER_SOURCE,
            start_offset: DEFAULT_START_OFFSET,
            max_steps: DEFAULT_MAX_STEPS,
            step_length: DEFAULT_STEP_LENGTH,
            close_threshold: DEFAULT_CLOSE_THRESHOLD,
            min_field: DEFAULT_MIN_FIELD,
        }
    }
}

/// Why a ray stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Reached the near field of a source.
    Absorbed,
    /// Field too weak to give a direction.
    Stalled,
    /// Left the viewport.
    OutOfBounds,
    /// Ran out of steps.
    StepLimit,
}

/// One traced field line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Streamline {
    /// Index of the seeding source in the frame's source list.
    pub source: usize,
    pub points: Vec<DVec2>,
    pub termination: Termination,
}

/// Traces every ray of every source. Neutral sources seed nothing.
pub fn trace_all(
    sources: &[PointSource],
    bounds: &Bounds,
    config: &StreamlineConfig,
) -> Vec<Streamline> {
    let rays = config.rays_per_source;
    let capacity = sources.len().saturating_mul(rays).min(CAPACITY_HINT_CAP);
    let mut lines = Vec::with_capacity(capacity);
    for (index, source) in sources.iter().enumerate() {
        let direction = source.sign();
        if direction == 0.0 {
            continue;
        }
        for k in 0..rays {
            let angle = TAU * k as f64 / rays as f64;
            let start = source.position
                + config.start_offset * DVec2::new(angle.cos(), angle.sin());
            let (points, termination) = trace_ray(sources, start, direction, bounds, config);
            lines.push(Streamline {
                source: index,
                points,
                termination,
            });
        }
    }
    lines
}

/// Integrates a single ray from `start`.
///
/// `direction` is +1 to follow the field and -1 to run against it. The
/// result holds at most `max_steps + 1` points. The last point is checked
/// like every other, so `StepLimit` only means the ray was still live.
pub fn trace_ray(
    sources: &[PointSource],
    start: DVec2,
    direction: f64,
    bounds: &Bounds,
    config: &StreamlineConfig,
) -> (Vec<DVec2>, Termination) {
    let capacity = config.max_steps.saturating_add(1).min(CAPACITY_HINT_CAP);
    let mut points = Vec::with_capacity(capacity);
    let mut pos = start;
    points.push(pos);
    let mut steps = 0;
    loop {
        let e = match stop_reason(sources, pos, bounds, config) {
            Ok(e) => e,
            Err(termination) => return (points, termination),
        };
        if steps == config.max_steps {
            return (points, Termination::StepLimit);
        }
        pos += e * (direction * config.step_length / e.length());
        points.push(pos);
        steps += 1;
    }
}

/// Absorbed, then stalled, then out of bounds. Returns the field at `pos`
/// when the ray may advance.
fn stop_reason(
    sources: &[PointSource],
    pos: DVec2,
    bounds: &Bounds,
    config: &StreamlineConfig,
) -> Result<DVec2, Termination> {
    if nearest_distance(sources, pos) < config.close_threshold {
        return Err(Termination::Absorbed);
    }
    let e = field_at(sources, pos);
    let magnitude = e.length();
    if magnitude < config.min_field || magnitude == 0.0 {
        return Err(Termination::Stalled);
    }
    if !bounds.contains(pos) {
        return Err(Termination::OutOfBounds);
    }
    Ok(e)
}
