//! Per-frame entry point.
//!
//! [`FieldOverlay`] owns the configuration and the contour cache. The host
//! calls [`FieldOverlay::frame`] once per render callback with a read-only
//! snapshot of the engine state and gets back borrowed contour batches and
//! freshly traced streamlines, ready to push into a [`LineSink`].

use glam::DVec2;
use serde::Serialize;

use crate::cache::ContourCache;
use crate::color::Srgb;
use crate::config::OverlayConfig;
use crate::contour::{level_style, ContourSegment};
use crate::error::OverlayError;
use crate::source::{aggregate, Magnet, Particle};
use crate::streamline::{trace_all, Streamline};
use crate::viewport::{Bounds, ScreenToWorld};

/// Color hint for streamlines.
pub const STREAMLINE_COLOR: Srgb = Srgb::from_u32(0x8b5cf6);
/// Alpha hint for streamlines.
pub const STREAMLINE_ALPHA: f64 = 0.6;

/// Everything the overlay reads from the host for one frame.
pub struct FrameInput<'a> {
    pub particles: &'a [Particle],
    pub magnets: &'a [Magnet],
    pub bounds: Bounds,
    pub transform: &'a dyn ScreenToWorld,
    pub show_contours: bool,
    pub show_streamlines: bool,
    /// Monotonically increasing; drives the periodic contour recompute.
    pub frame_index: u64,
}

/// Segments for one iso-level plus how the surface should draw them.
#[derive(Debug, Clone, Serialize)]
pub struct ContourBatch<'a> {
    pub level: f64,
    pub color: Srgb,
    pub alpha: f64,
    pub segments: &'a [ContourSegment],
}

/// One frame of overlay output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverlayFrame<'a> {
    pub contours: Vec<ContourBatch<'a>>,
    pub streamlines: Vec<Streamline>,
}

/// The render surface as seen by the overlay: it only takes primitives.
pub trait LineSink {
    fn segment(&mut self, from: DVec2, to: DVec2, color: Srgb, alpha: f64);

    fn polyline(&mut self, points: &[DVec2], color: Srgb, alpha: f64);
}

impl OverlayFrame<'_> {
    /// Pushes every primitive into `sink`: contours first, streamlines on top.
    pub fn draw(&self, sink: &mut dyn LineSink) {
        for batch in &self.contours {
            for s in batch.segments {
                sink.segment(
                    DVec2::new(s.x1, s.y1),
                    DVec2::new(s.x2, s.y2),
                    batch.color,
                    batch.alpha,
                );
            }
        }
        for line in &self.streamlines {
            sink.polyline(&line.points, STREAMLINE_COLOR, STREAMLINE_ALPHA);
        }
    }

    pub fn segment_count(&self) -> usize {
        self.contours.iter().map(|b| b.segments.len()).sum()
    }
}

/// Overlay state carried across frames.
#[derive(Debug, Clone, Default)]
pub struct FieldOverlay {
    config: OverlayConfig,
    cache: ContourCache,
}

impl FieldOverlay {
    /// Creates an overlay after validating `config`.
    pub fn new(config: OverlayConfig) -> Result<Self, OverlayError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: ContourCache::new(),
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn cache(&self) -> &ContourCache {
        &self.cache
    }

    /// Swaps in a new configuration and drops cached contours.
    pub fn set_config(&mut self, config: OverlayConfig) -> Result<(), OverlayError> {
        config.validate()?;
        self.config = config;
        self.cache.invalidate();
        Ok(())
    }

    /// Runs one frame.
    ///
    /// Disabled contours skip the cache entirely, so toggling them back on
    /// resumes from whatever was cached last (and the change detector takes
    /// it from there).
    pub fn frame(&mut self, input: &FrameInput<'_>) -> OverlayFrame<'_> {
        let sources = aggregate(input.particles, input.magnets);

        let streamlines = if input.show_streamlines {
            trace_all(&sources, &input.bounds, &self.config.streamline)
        } else {
            Vec::new()
        };

        let contours = if input.show_contours {
            let levels = self.cache.update(
                &sources,
                &input.bounds,
                input.transform,
                input.frame_index,
                &self.config,
            );
            let max_abs = levels.levels().map(f64::abs).fold(0.0, f64::max);
            levels
                .iter()
                .map(|(level, segments)| {
                    let style = level_style(level, max_abs);
                    ContourBatch {
                        level,
                        color: style.color,
                        alpha: style.alpha,
                        segments,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        OverlayFrame {
            contours,
            streamlines,
        }
    }
}
