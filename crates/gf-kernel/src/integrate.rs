//! Volume by Gauss-Legendre quadrature over analytic breakpoints.
//!
//! Between consecutive z-breakpoints every cross-section varies smoothly, so
//! a 3-point rule per z-interval is exact for the polynomial pieces swept
//! profiles produce. Inside each slice the same is done along y with a
//! 4-point rule; along x the measure is exact interval arithmetic.

use rayon::prelude::*;

use crate::csg::{Node, Plane};
use crate::types::BoundingBox;

const GAUSS3: [(f64, f64); 3] = [
    (-0.774_596_669_241_483_4, 5.0 / 9.0),
    (0.0, 8.0 / 9.0),
    (0.774_596_669_241_483_4, 5.0 / 9.0),
];

const GAUSS4: [(f64, f64); 4] = [
    (-0.861_136_311_594_052_6, 0.347_854_845_137_453_8),
    (-0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
    (0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
    (0.861_136_311_594_052_6, 0.347_854_845_137_453_8),
];

/// Longest z-interval integrated in one piece where a section edge is curved.
const MAX_CURVED_DZ: f64 = 0.5;
/// Longest y-interval integrated in one piece.
const MAX_DY: f64 = 1.0;

pub(crate) fn volume(node: &Node) -> f64 {
    let Some(bb) = node.bbox else {
        return 0.0;
    };
    let (z_lo, z_hi) = (bb.min[2], bb.max[2]);
    let mut zs = vec![z_lo, z_hi];
    let mut curved = Vec::new();
    node.z_breakpoints(&mut zs, &mut curved);
    let zs = sorted_breaks(zs, z_lo, z_hi);

    let mut samples = Vec::new();
    for w in zs.windows(2) {
        let (a, b) = (w[0], w[1]);
        let is_curved = curved.iter().any(|&(c0, c1)| c0 < b && c1 > a);
        let pieces = if is_curved {
            ((b - a) / MAX_CURVED_DZ).ceil().max(1.0) as usize
        } else {
            1
        };
        push_gauss(&mut samples, a, b, pieces, &GAUSS3);
    }

    // Ordered collect then a sequential sum keeps the result independent of
    // thread scheduling.
    let areas: Vec<f64> = samples
        .par_iter()
        .map(|&(z, w)| w * area(&node.slice_z(z)))
        .collect();
    areas.iter().sum()
}

/// Area of one horizontal slice.
pub(crate) fn area(plane: &Plane) -> f64 {
    let Some((y_lo, y_hi)) = plane.y else {
        return 0.0;
    };
    let mut ys = vec![y_lo, y_hi];
    plane.y_breakpoints(&mut ys);
    let ys = sorted_breaks(ys, y_lo, y_hi);

    let mut samples = Vec::new();
    for w in ys.windows(2) {
        let pieces = ((w[1] - w[0]) / MAX_DY).ceil().max(1.0) as usize;
        push_gauss(&mut samples, w[0], w[1], pieces, &GAUSS4);
    }
    samples
        .iter()
        .map(|&(y, w)| w * plane.x_intervals(y).measure())
        .sum()
}

/// Fraction of a breakpoint interval left out at each end when sampling
/// extents, so a sample never sits on a face where a tool starts.
const EDGE_FRACTION: f64 = 1e-9;

/// Axis-aligned extent of the material itself, `None` when there is none.
///
/// Section edges move monotonically in z between z-breakpoints, and x-interval
/// ends move monotonically in y between y-breakpoints, so extremes show up
/// at the ends of those intervals. An interval counts as filled when any of
/// its samples cuts material.
pub(crate) fn extents(node: &Node) -> Option<BoundingBox> {
    let bb = node.bbox?;
    let (z_lo, z_hi) = (bb.min[2], bb.max[2]);
    let mut zs = vec![z_lo, z_hi];
    let mut curved = Vec::new();
    node.z_breakpoints(&mut zs, &mut curved);
    let zs = sorted_breaks(zs, z_lo, z_hi);

    let layers: Vec<Option<BoundingBox>> = zs
        .par_windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            edge_samples(a, b)
                .into_iter()
                .filter_map(|z| plane_extents(&node.slice_z(z)))
                .reduce(|p, q| {
                    (
                        [p.0[0].min(q.0[0]), p.0[1].min(q.0[1])],
                        [p.1[0].max(q.1[0]), p.1[1].max(q.1[1])],
                    )
                })
                .map(|(lo, hi)| BoundingBox::new([lo[0], lo[1], a], [hi[0], hi[1], b]))
        })
        .collect();
    layers
        .into_iter()
        .flatten()
        .reduce(|a, b| a.union(&b))
        .and_then(|tight| tight.intersection(&bb))
}

/// `[x, y]` lower and upper corners of the material in one slice.
fn plane_extents(plane: &Plane) -> Option<([f64; 2], [f64; 2])> {
    let (y_lo, y_hi) = plane.y?;
    let mut ys = vec![y_lo, y_hi];
    plane.y_breakpoints(&mut ys);
    let ys = sorted_breaks(ys, y_lo, y_hi);

    let mut out: Option<([f64; 2], [f64; 2])> = None;
    for w in ys.windows(2) {
        let (c, d) = (w[0], w[1]);
        for y in edge_samples(c, d) {
            let row = plane.x_intervals(y);
            if row.measure() <= 0.0 {
                continue;
            }
            let spans = row.spans();
            let (x0, x1) = (spans[0].0, spans[spans.len() - 1].1);
            out = Some(match out {
                None => ([x0, c], [x1, d]),
                Some((lo, hi)) => ([lo[0].min(x0), lo[1].min(c)], [hi[0].max(x1), hi[1].max(d)]),
            });
        }
    }
    out
}

fn edge_samples(a: f64, b: f64) -> [f64; 3] {
    let d = (b - a) * EDGE_FRACTION;
    [a + d, (a + b) / 2.0, b - d]
}

fn sorted_breaks(mut v: Vec<f64>, lo: f64, hi: f64) -> Vec<f64> {
    v.retain(|x| x.is_finite() && *x >= lo && *x <= hi);
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| (*a - *b).abs() <= 1e-12);
    v
}

fn push_gauss(out: &mut Vec<(f64, f64)>, a: f64, b: f64, pieces: usize, rule: &[(f64, f64)]) {
    if b <= a {
        return;
    }
    let step = (b - a) / pieces as f64;
    for k in 0..pieces {
        let lo = a + step * k as f64;
        let half = step / 2.0;
        let mid = lo + half;
        for &(x, w) in rule {
            out.push((mid + half * x, half * w));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::Section;
    use crate::shape::{Axis, InsetProfile, InsetSegment, Shape};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn vol(shape: &Shape) -> f64 {
        volume(&Node::compile(shape))
    }

    #[test]
    fn box_volume_is_exact() {
        let b = Shape::extrude_z(Section::rect([0.0, 0.0], [3.0, 4.0]), 0.0, 5.0);
        assert_relative_eq!(vol(&b), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn rounded_box_matches_area_times_height() {
        let s = Section::rounded_rect([0.0, 0.0], [41.5, 41.5], 3.75);
        let expected = s.area() * 7.0;
        let b = Shape::extrude_z(s, 0.0, 7.0);
        assert_relative_eq!(vol(&b), expected, max_relative = 1e-5);
    }

    #[test]
    fn cylinder_volume() {
        let c = Shape::cylinder([0.0, 0.0], 3.25, 0.0, 2.4);
        assert_relative_eq!(vol(&c), PI * 3.25 * 3.25 * 2.4, max_relative = 1e-4);
    }

    #[test]
    fn frustum_volume() {
        let f = Shape::frustum([0.0, 0.0], 1.0, 2.0, 0.0, 3.0);
        let expected = PI * 3.0 / 3.0 * (1.0 + 2.0 + 4.0);
        assert_relative_eq!(vol(&f), expected, max_relative = 1e-4);
    }

    #[test]
    fn chamfered_block_is_exact() {
        // 45 degree chamfer from inset 1 at z=0 to 0 at z=1, then straight.
        let s = Shape::swept_z(
            Section::rect([0.0, 0.0], [10.0, 10.0]),
            0.0,
            2.0,
            InsetProfile::linear(0.0, 1.0, 1.0, 0.0),
        );
        // Frustum of squares 8..10 over 1mm, then 10x10x1.
        let expected = (64.0 + 80.0 + 100.0) / 3.0 + 100.0;
        assert_relative_eq!(vol(&s), expected, epsilon = 1e-9);
    }

    #[test]
    fn quarter_round_fillet_band() {
        // Square pocket floor fillet: outer minus rounded inner.
        let r = 1.0;
        let sec = Section::rect([0.0, 0.0], [20.0, 20.0]);
        let band = Shape::difference(
            Shape::extrude_z(sec.clone(), 0.0, r),
            vec![Shape::swept_z(
                sec,
                0.0,
                r,
                InsetProfile::new(vec![InsetSegment::Round {
                    t0: 0.0,
                    t1: r,
                    d1: 0.0,
                }]),
            )],
        );
        // Ring cross-section r^2(1 - pi/4) along a perimeter that shrinks at
        // the corners; bound it between inner and outer perimeters.
        let a = r * r * (1.0 - PI / 4.0);
        let v = vol(&band);
        assert!(v > a * 4.0 * (20.0 - 2.0 * r));
        assert!(v < a * 4.0 * 20.0);
    }

    #[test]
    fn horizontal_cylinder_volume() {
        let bore = Shape::prism(Axis::Y, Section::circle([0.0, 5.0], 2.0), [-10.0, 10.0]);
        assert_relative_eq!(vol(&bore), PI * 4.0 * 20.0, max_relative = 1e-4);
    }

    #[test]
    fn disjoint_intersection_is_zero() {
        let a = Shape::extrude_z(Section::rect([0.0, 0.0], [1.0, 1.0]), 0.0, 1.0);
        let b = Shape::extrude_z(Section::rect([5.0, 0.0], [1.0, 1.0]), 0.0, 1.0);
        assert_eq!(vol(&Shape::intersection(vec![a, b])), 0.0);
    }

    #[test]
    fn cut_through_the_top_lowers_the_extent() {
        let block = Shape::difference(
            Shape::extrude_z(Section::rect([0.0, 0.0], [10.0, 10.0]), 0.0, 10.0),
            vec![Shape::extrude_z(Section::rect([0.0, 0.0], [12.0, 12.0]), 5.0, 11.0)],
        );
        let node = Node::compile(&block);
        let bb = extents(&node).unwrap();
        assert_relative_eq!(bb.max[2], 5.0, epsilon = 1e-12);
        assert_relative_eq!(bb.min[0], -5.0, epsilon = 1e-12);
        assert_relative_eq!(bb.max[1], 5.0, epsilon = 1e-12);
        // The structural box still spans the whole base.
        assert_relative_eq!(node.bbox.unwrap().max[2], 10.0);
    }

    #[test]
    fn side_notch_trims_one_face_only() {
        let block = Shape::difference(
            Shape::extrude_z(Section::rect([0.0, 0.0], [10.0, 10.0]), 0.0, 2.0),
            vec![Shape::extrude_z(Section::rect([4.0, 0.0], [4.0, 12.0]), -1.0, 3.0)],
        );
        let bb = extents(&Node::compile(&block)).unwrap();
        assert_relative_eq!(bb.max[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(bb.min[0], -5.0, epsilon = 1e-12);
        assert_relative_eq!(bb.max[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cylinder_extent_reaches_its_equator() {
        let c = Shape::cylinder([1.0, 2.0], 3.0, 0.0, 4.0);
        let bb = extents(&Node::compile(&c)).unwrap();
        assert_relative_eq!(bb.max[0], 4.0, epsilon = 1e-9);
        assert_relative_eq!(bb.min[1], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn fully_cut_solid_has_no_extent() {
        let gone = Shape::difference(
            Shape::extrude_z(Section::rect([0.0, 0.0], [2.0, 2.0]), 0.0, 1.0),
            vec![Shape::extrude_z(Section::rect([0.0, 0.0], [3.0, 3.0]), -1.0, 2.0)],
        );
        assert!(extents(&Node::compile(&gone)).is_none());
    }

    #[test]
    fn union_counts_overlap_once() {
        let a = Shape::extrude_z(Section::rect([0.0, 0.0], [2.0, 2.0]), 0.0, 1.0);
        let b = Shape::extrude_z(Section::rect([1.0, 0.0], [2.0, 2.0]), 0.0, 1.0);
        assert_relative_eq!(vol(&Shape::union(vec![a, b])), 6.0, epsilon = 1e-9);
    }
}
