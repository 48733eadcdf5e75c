//! Closed-form potential and field evaluation over a source snapshot.
//!
//! Both quantities use the unit-constant Coulomb form: the potential is
//! `Σ q/d` and the field is `Σ q/d² · d̂`. Points sitting exactly on a source
//! contribute nothing instead of producing an infinity; callers that care
//! about the near field check [`nearest_distance`] against their own
//! threshold first.

use glam::DVec2;

use crate::source::PointSource;

/// Distances below this are treated as zero.
const SINGULARITY_EPS: f64 = 1e-10;

/// Scalar potential `Σ strength / distance` at `p`.
pub fn potential_at(sources: &[PointSource], p: DVec2) -> f64 {
    sources
        .iter()
        .filter_map(|s| {
            let d = p.distance(s.position);
            (d >= SINGULARITY_EPS).then(|| s.strength / d)
        })
        .sum()
}

/// Field vector `Σ strength / d² · (Δ / d)` at `p`, with `Δ = p - source`.
pub fn field_at(sources: &[PointSource], p: DVec2) -> DVec2 {
    sources.iter().fold(DVec2::ZERO, |acc, s| {
        let delta = p - s.position;
        let d = delta.length();
        if d < SINGULARITY_EPS {
            return acc;
        }
        acc + delta * (s.strength / (d * d * d))
    })
}

/// Distance from `p` to the closest source, or `f64::INFINITY` when there are none.
pub fn nearest_distance(sources: &[PointSource], p: DVec2) -> f64 {
    sources
        .iter()
        .map(|s| p.distance(s.position))
        .fold(f64::INFINITY, f64::min)
}

/// Potential at `p`, or `None` if any source is closer than `close_threshold`.
///
/// This is the per-node rule of the grid sampler.
pub fn guarded_potential(sources: &[PointSource], p: DVec2, close_threshold: f64) -> Option<f64> {
    let mut sum = 0.0;
    for s in sources {
        let d = p.distance(s.position);
        if d < close_threshold || d < SINGULARITY_EPS {
            return None;
        }
        sum += s.strength / d;
    }
    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn potential_of_single_source_is_inverse_distance() {
        let sources = [PointSource::new(0.0, 0.0, 10.0)];
        let v = potential_at(&sources, DVec2::new(30.0, 40.0));
        assert!((v - 0.2).abs() < 1e-12, "expected 10/50, got {v}");
    }

    #[test]
    fn potential_of_opposite_pair_vanishes_on_bisector() {
        let sources = [
            PointSource::new(-200.0, 0.0, 10.0),
            PointSource::new(200.0, 0.0, -10.0),
        ];
        for y in [-300.0, -20.0, 0.0, 75.0, 1000.0] {
            let v = potential_at(&sources, DVec2::new(0.0, y));
            assert!(v.abs() < 1e-12, "nonzero potential {v} at (0, {y})");
        }
    }

    #[test]
    fn potential_on_top_of_source_skips_it() {
        let sources = [PointSource::new(0.0, 0.0, 10.0), PointSource::new(10.0, 0.0, 5.0)];
        let v = potential_at(&sources, DVec2::ZERO);
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn field_points_away_from_positive_source() {
        let sources = [PointSource::new(0.0, 0.0, 4.0)];
        let e = field_at(&sources, DVec2::new(2.0, 0.0));
        assert!((e.x - 1.0).abs() < 1e-12, "expected 4/2² = 1, got {}", e.x);
        assert!(e.y.abs() < 1e-12);
    }

    #[test]
    fn field_points_toward_negative_source() {
        let sources = [PointSource::new(0.0, 0.0, -4.0)];
        let e = field_at(&sources, DVec2::new(0.0, 2.0));
        assert!(e.y < 0.0);
    }

    #[test]
    fn field_of_no_sources_is_zero() {
        assert_eq!(field_at(&[], DVec2::new(1.0, 2.0)), DVec2::ZERO);
        assert_eq!(potential_at(&[], DVec2::new(1.0, 2.0)), 0.0);
    }

    #[test]
    fn nearest_distance_without_sources_is_infinite() {
        assert!(nearest_distance(&[], DVec2::ZERO).is_infinite());
    }

    #[test]
    fn guarded_potential_rejects_near_nodes() {
        let sources = [PointSource::new(0.0, 0.0, 1.0)];
        assert_eq!(guarded_potential(&sources, DVec2::new(14.9, 0.0), 15.0), None);
        assert!(guarded_potential(&sources, DVec2::new(15.0, 0.0), 15.0).is_some());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn source() -> impl Strategy<Value = PointSource> {
            (-300.0_f64..300.0, -300.0_f64..300.0, -20.0_f64..20.0)
                .prop_map(|(x, y, q)| PointSource::new(x, y, q))
        }

        proptest! {
            #[test]
            fn guarded_matches_direct_sum_when_far(
                sources in prop::collection::vec(source(), 1..8),
                x in -400.0_f64..400.0,
                y in -400.0_f64..400.0,
            ) {
                let p = DVec2::new(x, y);
                if let Some(v) = guarded_potential(&sources, p, 15.0) {
                    let direct: f64 = sources
                        .iter()
                        .map(|s| s.strength / (p - s.position).length())
                        .sum();
                    prop_assert!((v - direct).abs() <= 1e-9 * (1.0 + direct.abs()));
                    prop_assert!(nearest_distance(&sources, p) >= 15.0);
                } else {
                    prop_assert!(nearest_distance(&sources, p) < 15.0);
                }
            }

            #[test]
            fn field_is_finite_everywhere(
                sources in prop::collection::vec(source(), 0..8),
                x in -400.0_f64..400.0,
                y in -400.0_f64..400.0,
            ) {
                let e = field_at(&sources, DVec2::new(x, y));
                prop_assert!(e.x.is_finite() && e.y.is_finite());
            }
        }
    }
}
