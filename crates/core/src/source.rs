//! Source aggregation: flattens particles and bar magnets into point sources.
//!
//! Every downstream stage (sampler, tracer, change detector) works on a flat
//! slice of [`PointSource`] and never branches on where a source came from.
//! A magnet is approximated by a dipole: two opposite poles at either end of
//! the bar, with no higher-order terms.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A charged particle as reported by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: DVec2,
    pub charge: f64,
}

/// A bar magnet as reported by the physics engine.
///
/// `angle` is in radians and points from the south pole to the north pole.
/// `size` is the full bar length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Magnet {
    pub pos: DVec2,
    pub angle: f64,
    pub size: f64,
    pub strength: f64,
}

/// A signed point source: a charge, or one pole of a magnet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    pub position: DVec2,
    pub strength: f64,
}

impl PointSource {
    pub fn new(x: f64, y: f64, strength: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            strength,
        }
    }

    /// +1 for sources, -1 for sinks, 0 for neutral.
    pub fn sign(&self) -> f64 {
        if self.strength > 0.0 {
            1.0
        } else if self.strength < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

impl Particle {
    pub fn new(x: f64, y: f64, charge: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            charge,
        }
    }
}

impl Magnet {
    pub fn new(x: f64, y: f64, angle: f64, size: f64, strength: f64) -> Self {
        Self {
            pos: DVec2::new(x, y),
            angle,
            size,
            strength,
        }
    }

    /// North pole (`+strength`) followed by south pole (`-strength`).
    pub fn poles(&self) -> [PointSource; 2] {
        let half = 0.5 * self.size * DVec2::new(self.angle.cos(), self.angle.sin());
        [
            PointSource {
                position: self.pos + half,
                strength: self.strength,
            },
            PointSource {
                position: self.pos - half,
                strength: -self.strength,
            },
        ]
    }
}

/// Builds the flat source list for one frame.
///
/// Particles come first in input order, then each magnet's north and south
/// poles.
pub fn aggregate(particles: &[Particle], magnets: &[Magnet]) -> Vec<PointSource> {
    let mut sources = Vec::with_capacity(particles.len() + 2 * magnets.len());
    sources.extend(particles.iter().map(|p| PointSource {
        position: p.pos,
        strength: p.charge,
    }));
    sources.extend(magnets.iter().flat_map(Magnet::poles));
    sources
}
