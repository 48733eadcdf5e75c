#![deny(unsafe_code)]
//! Field visualization overlay for charged particles and bar magnets.
//!
//! Provides the source aggregator (`source`), closed-form potential and field
//! evaluation (`field`), the adaptive sampling grid (`grid`), marching-squares
//! contour extraction (`contour`), the contour change detector and cache
//! (`cache`), the field-line tracer (`streamline`), and the per-frame
//! orchestrator (`overlay`) that ties them to a host render loop.

pub mod cache;
pub mod color;
pub mod config;
pub mod contour;
pub mod error;
pub mod field;
pub mod grid;
pub mod overlay;
pub mod source;
pub mod streamline;
pub mod viewport;

pub use cache::{ContourCache, RecomputeReason, Snapshot};
pub use color::Srgb;
pub use config::OverlayConfig;
pub use contour::{ContourSegment, LevelSet};
pub use error::OverlayError;
pub use grid::{Grid, GridPlan};
pub use overlay::{ContourBatch, FieldOverlay, FrameInput, LineSink, OverlayFrame};
pub use source::{Magnet, Particle, PointSource};
pub use streamline::{Streamline, Termination};
pub use viewport::{Bounds, ScreenToWorld, ViewTransform};
