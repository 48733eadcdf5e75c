//! World-space viewport bounds and the screen-to-world mapping.
//!
//! Camera math belongs to the host. The overlay only needs two things from
//! it: the axis-aligned world rectangle currently on screen, and a way to
//! map a screen-space point into world space so that a fixed on-screen
//! sampling interval can be converted into world units.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Maps screen-space points (pixels) into world space.
pub trait ScreenToWorld {
    fn screen_to_world(&self, screen: DVec2) -> DVec2;
}

impl<F> ScreenToWorld for F
where
    F: Fn(DVec2) -> DVec2,
{
    fn screen_to_world(&self, screen: DVec2) -> DVec2 {
        self(screen)
    }
}

/// Pan/zoom camera with an optional Y flip (world Y up, screen Y down).
///
/// `world = (screen - pan) / zoom`, with the Y component negated when
/// `flip_y` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewTransform {
    pub pan: DVec2,
    pub zoom: f64,
    pub flip_y: bool,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: DVec2::ZERO,
            zoom: 1.0,
            flip_y: false,
        }
    }
}

impl ViewTransform {
    /// Camera centered on the world origin for a `width` x `height` screen.
    pub fn centered(width: f64, height: f64, zoom: f64) -> Self {
        Self {
            pan: DVec2::new(width * 0.5, height * 0.5),
            zoom,
            flip_y: true,
        }
    }
}

impl ScreenToWorld for ViewTransform {
    fn screen_to_world(&self, screen: DVec2) -> DVec2 {
        let w = (screen - self.pan) / self.zoom;
        if self.flip_y {
            DVec2::new(w.x, -w.y)
        } else {
            w
        }
    }
}

/// Axis-aligned world-space rectangle.
///
/// Inverted or zero-area bounds are legal values; they simply produce an
/// empty grid downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounding box of four world-space corners (any order, any rotation).
    pub fn from_corners(corners: [DVec2; 4]) -> Self {
        let min = corners.iter().copied().fold(DVec2::INFINITY, DVec2::min);
        let max = corners
            .iter()
            .copied()
            .fold(DVec2::NEG_INFINITY, DVec2::max);
        Self::new(min.x, min.y, max.x, max.y)
    }

    /// World bounds visible on a `width` x `height` screen.
    pub fn from_transform(transform: &dyn ScreenToWorld, width: f64, height: f64) -> Self {
        Self::from_corners([
            transform.screen_to_world(DVec2::ZERO),
            transform.screen_to_world(DVec2::new(width, 0.0)),
            transform.screen_to_world(DVec2::new(width, height)),
            transform.screen_to_world(DVec2::new(0.0, height)),
        ])
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the rectangle has positive, finite extent on both axes.
    pub fn is_valid(&self) -> bool {
        let w = self.width();
        let h = self.height();
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Sum of absolute differences of the four bound values.
    pub fn corner_delta(&self, other: &Bounds) -> f64 {
        (self.min_x - other.min_x).abs()
            + (self.min_y - other.min_y).abs()
            + (self.max_x - other.max_x).abs()
            + (self.max_y - other.max_y).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_maps_screen_to_world_unchanged() {
        let t = ViewTransform::default();
        assert_eq!(t.screen_to_world(DVec2::new(3.0, 4.0)), DVec2::new(3.0, 4.0));
    }

    #[test]
    fn centered_transform_puts_origin_mid_screen() {
        let t = ViewTransform::centered(800.0, 600.0, 2.0);
        let w = t.screen_to_world(DVec2::new(400.0, 300.0));
        assert_eq!(w, DVec2::ZERO);
        let w = t.screen_to_world(DVec2::new(400.0, 200.0));
        assert_eq!(w, DVec2::new(0.0, 50.0));
    }

    #[test]
    fn closures_are_transforms() {
        let double = |p: DVec2| p * 2.0;
        assert_eq!(double.screen_to_world(DVec2::ONE), DVec2::splat(2.0));
    }

    #[test]
    fn from_transform_covers_screen() {
        let t = ViewTransform::centered(800.0, 600.0, 1.0);
        let b = Bounds::from_transform(&t, 800.0, 600.0);
        assert_eq!(b, Bounds::new(-400.0, -300.0, 400.0, 300.0));
    }

    #[test]
    fn from_corners_handles_rotated_quad() {
        let b = Bounds::from_corners([
            DVec2::new(0.0, -5.0),
            DVec2::new(5.0, 0.0),
            DVec2::new(0.0, 5.0),
            DVec2::new(-5.0, 0.0),
        ]);
        assert_eq!(b, Bounds::new(-5.0, -5.0, 5.0, 5.0));
    }

    #[test]
    fn degenerate_bounds_are_invalid() {
        assert!(!Bounds::new(0.0, 0.0, 0.0, 10.0).is_valid());
        assert!(!Bounds::new(10.0, 0.0, 0.0, 10.0).is_valid());
        assert!(!Bounds::new(0.0, 0.0, f64::INFINITY, 10.0).is_valid());
        assert!(Bounds::new(-1.0, -1.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Bounds::new(-10.0, -10.0, 10.0, 10.0);
        assert!(b.contains(DVec2::new(10.0, -10.0)));
        assert!(!b.contains(DVec2::new(10.01, 0.0)));
    }

    #[test]
    fn corner_delta_sums_absolute_differences() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(0.5, -0.25, 10.0, 10.5);
        assert!((a.corner_delta(&b) - 1.25).abs() < 1e-12);
        assert_eq!(a.corner_delta(&a), 0.0);
    }
}
