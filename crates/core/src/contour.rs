//! Equipotential extraction by marching squares.
//!
//! Each grid cell is classified against an iso-level corner by corner; every
//! edge whose endpoints disagree gets a linearly interpolated crossing, and
//! the first two crossings of a cell form one [`ContourSegment`].
//!
//! Saddle cells (two diagonal corners above, two below) produce four
//! crossings. They are not disambiguated: the segment joins the first two
//! crossings in edge order, which can pair them across the saddle. Cells
//! touching an invalid (near-source) node are skipped outright, even when
//! the remaining corners would cross.

use serde::{Deserialize, Serialize};

use crate::color::Srgb;
use crate::grid::Grid;

/// The curated iso-levels, most negative first.
pub const DEFAULT_LEVELS: [f64; 6] = [-2.0, -0.5, -0.2, 0.2, 0.5, 2.0];
/// Source count from which the weakest level pair is dropped.
pub const DEFAULT_LOD_MEDIUM: usize = 20;
/// Source count from which only the strongest level pair is kept.
pub const DEFAULT_LOD_SPARSE: usize = 50;

const POSITIVE_HINT: Srgb = Srgb::from_u32(0xef4444);
const NEGATIVE_HINT: Srgb = Srgb::from_u32(0x3b82f6);
const NEUTRAL_HINT: Srgb = Srgb::from_u32(0x9ca3af);
const MIN_ALPHA: f64 = 0.25;
const MAX_ALPHA: f64 = 0.75;

/// One straight piece of an equipotential, from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Iso-levels and level-of-detail thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourConfig {
    pub levels: Vec<f64>,
    pub lod_medium: usize,
    pub lod_sparse: usize,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.to_vec(),
            lod_medium: DEFAULT_LOD_MEDIUM,
            lod_sparse: DEFAULT_LOD_SPARSE,
        }
    }
}

/// Segments per iso-level, in the order the levels were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelSet {
    entries: Vec<(f64, Vec<ContourSegment>)>,
}

impl LevelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segments for `level`, replacing any earlier entry.
    pub fn insert(&mut self, level: f64, segments: Vec<ContourSegment>) {
        match self.entries.iter_mut().find(|(l, _)| *l == level) {
            Some(entry) => entry.1 = segments,
            None => self.entries.push((level, segments)),
        }
    }

    pub fn get(&self, level: f64) -> Option<&[ContourSegment]> {
        self.entries
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, s)| s.as_slice())
    }

    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(l, _)| *l)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &[ContourSegment])> + '_ {
        self.entries.iter().map(|(l, s)| (*l, s.as_slice()))
    }

    /// True when no level has been computed (not when levels have no segments).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.entries.iter().map(|(_, s)| s.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Marching squares over `grid` for a single iso-level.
pub fn extract(grid: &Grid, level: f64) -> Vec<ContourSegment> {
    let plan = grid.plan();
    if plan.count_x < 2 || plan.count_y < 2 {
        return Vec::new();
    }
    let mut segments = Vec::new();
    for j in 0..plan.count_y - 1 {
        for i in 0..plan.count_x - 1 {
            let (Some(p00), Some(p10), Some(p01), Some(p11)) = (
                grid.get(i, j),
                grid.get(i + 1, j),
                grid.get(i, j + 1),
                grid.get(i + 1, j + 1),
            ) else {
                continue;
            };
            let above = [p00, p10, p01, p11].map(|p| p >= level);
            if above.iter().all(|&a| a == above[0]) {
                continue;
            }

            let x0 = plan.node_x(i);
            let x1 = plan.node_x(i + 1);
            let y0 = plan.node_y(j);
            let y1 = plan.node_y(j + 1);

            // Bottom, right, top, left. Each edge runs from its lower-index
            // node so neighbouring cells interpolate identically.
            let edges = [
                ((x0, y0), (x1, y0), p00, p10),
                ((x1, y0), (x1, y1), p10, p11),
                ((x0, y1), (x1, y1), p01, p11),
                ((x0, y0), (x0, y1), p00, p01),
            ];
            let mut crossings = edges
                .iter()
                .filter(|(_, _, pa, pb)| (*pa >= level) != (*pb >= level))
                .map(|&((ax, ay), (bx, by), pa, pb)| {
                    let t = (level - pa) / (pb - pa);
                    (ax + t * (bx - ax), ay + t * (by - ay))
                });
            if let (Some((ax, ay)), Some((bx, by))) = (crossings.next(), crossings.next()) {
                segments.push(ContourSegment {
                    x1: ax,
                    y1: ay,
                    x2: bx,
                    y2: by,
                });
            }
        }
    }
    segments
}

/// Extracts every requested level.
pub fn extract_levels(grid: &Grid, levels: &[f64]) -> LevelSet {
    let mut set = LevelSet::new();
    for &level in levels {
        let segments = extract(grid, level);
        log::trace!("level {level}: {} segments", segments.len());
        set.insert(level, segments);
    }
    set
}

/// Level of detail: fewer iso-levels as the scene gets crowded.
///
/// Below `lod_medium` sources every level is kept. Below `lod_sparse` the
/// levels with the smallest magnitude are dropped. Beyond that only the
/// levels with the largest magnitude remain. Input order is preserved.
pub fn select_levels(source_count: usize, config: &ContourConfig) -> Vec<f64> {
    let magnitudes = || config.levels.iter().map(|l| l.abs());
    let (Some(weakest), Some(strongest)) = (
        magnitudes().reduce(f64::min),
        magnitudes().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let keep = |l: &f64| {
        if source_count < config.lod_medium {
            true
        } else if source_count < config.lod_sparse {
            l.abs() > weakest || weakest == strongest
        } else {
            l.abs() == strongest
        }
    };
    config.levels.iter().copied().filter(keep).collect()
}

/// Color and alpha hint for drawing one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelStyle {
    pub level: f64,
    pub color: Srgb,
    pub alpha: f64,
}

/// Warm for positive levels, cool for negative ones, and more opaque the
/// closer the level is to the strongest one drawn.
pub fn level_style(level: f64, max_abs: f64) -> LevelStyle {
    let color = if level > 0.0 {
        POSITIVE_HINT
    } else if level < 0.0 {
        NEGATIVE_HINT
    } else {
        NEUTRAL_HINT
    };
    let weight = if max_abs > 0.0 {
        (level.abs() / max_abs).clamp(0.0, 1.0)
    } else {
        0.0
    };
    LevelStyle {
        level,
        color,
        alpha: MIN_ALPHA + (MAX_ALPHA - MIN_ALPHA) * weight,
    }
}
