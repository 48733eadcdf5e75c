//! SVG export of an overlay frame.
//!
//! Lines are emitted in world coordinates inside a group that flips Y, so
//! the picture has world Y pointing up like the on-screen view.

use fieldlines_core::{Bounds, LineSink, Srgb};
use glam::DVec2;
use svg::node::element::{Group, Line, Polyline, Rectangle};
use svg::{Document, Node};

const BACKGROUND: &str = "#0f172a";
const STROKE_WIDTH: f64 = 1.5;

pub struct SvgSink {
    bounds: Bounds,
    group: Group,
    primitives: usize,
}

impl SvgSink {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            group: Group::new().set("transform", "scale(1,-1)"),
            primitives: 0,
        }
    }

    fn push<N: Into<Box<dyn Node>>>(&mut self, node: N) {
        self.group.append(node);
        self.primitives += 1;
    }

    /// Number of lines and polylines drawn so far.
    pub fn primitives(&self) -> usize {
        self.primitives
    }

    pub fn into_document(self) -> Document {
        let b = self.bounds;
        // The group flips Y, so the visible band is [-max_y, -min_y].
        let view_box = (b.min_x, -b.max_y, b.width(), b.height());
        let background = Rectangle::new()
            .set("x", b.min_x)
            .set("y", -b.max_y)
            .set("width", b.width())
            .set("height", b.height())
            .set("fill", BACKGROUND);
        Document::new()
            .set("viewBox", view_box)
            .add(background)
            .add(self.group)
    }
}

impl LineSink for SvgSink {
    fn segment(&mut self, from: DVec2, to: DVec2, color: Srgb, alpha: f64) {
        let line = Line::new()
            .set("x1", from.x)
            .set("y1", from.y)
            .set("x2", to.x)
            .set("y2", to.y)
            .set("stroke", color.to_hex())
            .set("stroke-opacity", alpha)
            .set("stroke-width", STROKE_WIDTH);
        self.push(line);
    }

    fn polyline(&mut self, points: &[DVec2], color: Srgb, alpha: f64) {
        if points.len() < 2 {
            return;
        }
        let coords = points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        let polyline = Polyline::new()
            .set("points", coords)
            .set("fill", "none")
            .set("stroke", color.to_hex())
            .set("stroke-opacity", alpha)
            .set("stroke-width", STROKE_WIDTH);
        self.push(polyline);
    }
}
