//! Planar cross-sections extruded into prisms.
//!
//! A section lives in its own (u, v) frame. Which world axes u and v map to
//! depends on the prism axis; see [`crate::shape::Axis`].

use std::f64::consts::{FRAC_PI_2, PI};

use crate::intervals::IntervalSet;

const CIRCLE_BREAKS: usize = 16;
const ARC_BREAKS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Axis-aligned rectangle with rounded corners. Radii are ordered
    /// (-u,-v), (+u,-v), (+u,+v), (-u,+v).
    RoundedRect {
        center: [f64; 2],
        size: [f64; 2],
        radii: [f64; 4],
    },
    Circle {
        center: [f64; 2],
        radius: f64,
    },
    /// Simple polygon, either winding.
    Polygon { points: Vec<[f64; 2]> },
}

impl Section {
    pub fn rect(center: [f64; 2], size: [f64; 2]) -> Self {
        Self::rounded_rect(center, size, 0.0)
    }

    pub fn rounded_rect(center: [f64; 2], size: [f64; 2], radius: f64) -> Self {
        Self::rounded_rect_corners(center, size, [radius; 4])
    }

    pub fn rounded_rect_corners(center: [f64; 2], size: [f64; 2], radii: [f64; 4]) -> Self {
        let max_r = (size[0].min(size[1]) / 2.0).max(0.0);
        Section::RoundedRect {
            center,
            size,
            radii: radii.map(|r| r.clamp(0.0, max_r)),
        }
    }

    pub fn circle(center: [f64; 2], radius: f64) -> Self {
        Section::Circle { center, radius }
    }

    pub fn polygon(points: Vec<[f64; 2]>) -> Self {
        Section::Polygon { points }
    }

    /// Regular polygon with a flat side facing +u, optionally with rounded
    /// vertices approximated by `arc_steps` chords each.
    pub fn regular_polygon(
        center: [f64; 2],
        inradius: f64,
        sides: u32,
        corner_radius: f64,
        arc_steps: u32,
    ) -> Self {
        let n = sides.max(3) as usize;
        let half = PI / n as f64;
        let circumradius = inradius / half.cos();
        let max_rc = (inradius * half.tan() - 1e-6).max(0.0);
        let rc = corner_radius.clamp(0.0, max_rc);
        let mut points = Vec::with_capacity(n * (arc_steps as usize + 1));
        for k in 0..n {
            let theta = half + 2.0 * half * k as f64;
            if rc <= 0.0 || arc_steps == 0 {
                points.push([
                    center[0] + circumradius * theta.cos(),
                    center[1] + circumradius * theta.sin(),
                ]);
                continue;
            }
            // Arc centre sits on the vertex ray, rc away from both adjacent sides.
            let dc = circumradius - rc / half.cos();
            let cu = center[0] + dc * theta.cos();
            let cv = center[1] + dc * theta.sin();
            for s in 0..=arc_steps {
                let a = theta - half + 2.0 * half * s as f64 / arc_steps as f64;
                points.push([cu + rc * a.cos(), cv + rc * a.sin()]);
            }
        }
        Section::Polygon { points }
    }

    /// Bounding rectangle as (min, max), or `None` if degenerate.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        match self {
            Section::RoundedRect { center, size, .. } => {
                if size[0] <= 0.0 || size[1] <= 0.0 {
                    return None;
                }
                Some((
                    [center[0] - size[0] / 2.0, center[1] - size[1] / 2.0],
                    [center[0] + size[0] / 2.0, center[1] + size[1] / 2.0],
                ))
            }
            Section::Circle { center, radius } => {
                if *radius <= 0.0 {
                    return None;
                }
                Some((
                    [center[0] - radius, center[1] - radius],
                    [center[0] + radius, center[1] + radius],
                ))
            }
            Section::Polygon { points } => {
                if points.len() < 3 {
                    return None;
                }
                let mut lo = [f64::INFINITY; 2];
                let mut hi = [f64::NEG_INFINITY; 2];
                for p in points {
                    for i in 0..2 {
                        lo[i] = lo[i].min(p[i]);
                        hi[i] = hi[i].max(p[i]);
                    }
                }
                Some((lo, hi))
            }
        }
    }

    /// Offset the boundary inward by `d` (outward when negative).
    /// Returns `None` once the section vanishes. Polygons are not offset.
    pub fn inset(&self, d: f64) -> Option<Section> {
        if d == 0.0 {
            return Some(self.clone());
        }
        match self {
            Section::RoundedRect {
                center,
                size,
                radii,
            } => {
                let w = size[0] - 2.0 * d;
                let h = size[1] - 2.0 * d;
                if w <= 0.0 || h <= 0.0 {
                    return None;
                }
                Some(Section::rounded_rect_corners(
                    *center,
                    [w, h],
                    radii.map(|r| (r - d).max(0.0)),
                ))
            }
            Section::Circle { center, radius } => {
                let r = radius - d;
                (r > 0.0).then(|| Section::circle(*center, r))
            }
            Section::Polygon { .. } => Some(self.clone()),
        }
    }

    pub fn translate(&self, du: f64, dv: f64) -> Section {
        match self {
            Section::RoundedRect {
                center,
                size,
                radii,
            } => Section::RoundedRect {
                center: [center[0] + du, center[1] + dv],
                size: *size,
                radii: *radii,
            },
            Section::Circle { center, radius } => Section::Circle {
                center: [center[0] + du, center[1] + dv],
                radius: *radius,
            },
            Section::Polygon { points } => Section::Polygon {
                points: points.iter().map(|p| [p[0] + du, p[1] + dv]).collect(),
            },
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Section::RoundedRect { size, radii, .. } => {
                let corner_loss: f64 = radii.iter().map(|r| r * r * (1.0 - PI / 4.0)).sum();
                (size[0] * size[1] - corner_loss).max(0.0)
            }
            Section::Circle { radius, .. } => PI * radius * radius,
            Section::Polygon { points } => polygon_area(points).abs(),
        }
    }

    /// True for boundaries that are not piecewise linear.
    pub fn is_curved(&self) -> bool {
        match self {
            Section::RoundedRect { radii, .. } => radii.iter().any(|r| *r > 0.0),
            Section::Circle { .. } => true,
            Section::Polygon { .. } => false,
        }
    }

    /// Intervals of u covered by the section on the line at `v`.
    pub fn slice(&self, v: f64) -> IntervalSet {
        match self {
            Section::RoundedRect {
                center,
                size,
                radii,
            } => {
                let (hw, hh) = (size[0] / 2.0, size[1] / 2.0);
                let from_bottom = v - (center[1] - hh);
                let from_top = (center[1] + hh) - v;
                if from_bottom < 0.0 || from_top < 0.0 {
                    return IntervalSet::new();
                }
                let left = corner_offset(radii[0], from_bottom).max(corner_offset(radii[3], from_top));
                let right = corner_offset(radii[1], from_bottom).max(corner_offset(radii[2], from_top));
                IntervalSet::single(center[0] - hw + left, center[0] + hw - right)
            }
            Section::Circle { center, radius } => {
                let dv = v - center[1];
                if dv.abs() >= *radius {
                    return IntervalSet::new();
                }
                let s = (radius * radius - dv * dv).sqrt();
                IntervalSet::single(center[0] - s, center[0] + s)
            }
            Section::Polygon { points } => {
                let n = points.len();
                let mut crossings = Vec::new();
                for i in 0..n {
                    let p = points[i];
                    let q = points[(i + 1) % n];
                    if (p[1] <= v) != (q[1] <= v) {
                        let t = (v - p[1]) / (q[1] - p[1]);
                        crossings.push(p[0] + t * (q[0] - p[0]));
                    }
                }
                crossings.sort_by(f64::total_cmp);
                let spans = crossings.chunks_exact(2).map(|c| (c[0], c[1])).collect();
                IntervalSet::from_unsorted(spans)
            }
        }
    }

    pub fn contains(&self, u: f64, v: f64) -> bool {
        self.slice(v).contains(u)
    }

    /// Values of v where the slice changes character.
    pub fn v_breakpoints(&self, out: &mut Vec<f64>) {
        match self {
            Section::RoundedRect {
                center,
                size,
                radii,
            } => {
                let lo = center[1] - size[1] / 2.0;
                let hi = center[1] + size[1] / 2.0;
                out.extend_from_slice(&[lo, hi]);
                // Breaks spaced evenly in angle keep the sqrt behaviour near
                // the tangent points inside short intervals.
                for k in 0..=ARC_BREAKS {
                    let c = (FRAC_PI_2 * k as f64 / ARC_BREAKS as f64).cos();
                    for r in [radii[0], radii[1]] {
                        if r > 0.0 {
                            out.push(lo + r - r * c);
                        }
                    }
                    for r in [radii[2], radii[3]] {
                        if r > 0.0 {
                            out.push(hi - r + r * c);
                        }
                    }
                }
            }
            Section::Circle { center, radius } => {
                for k in 0..=CIRCLE_BREAKS {
                    out.push(center[1] + radius * (PI * k as f64 / CIRCLE_BREAKS as f64).cos());
                }
            }
            Section::Polygon { points } => out.extend(points.iter().map(|p| p[1])),
        }
    }
}

/// Horizontal offset of a rounded corner of radius `r` at distance `d`
/// from the straight edge it joins.
fn corner_offset(r: f64, d: f64) -> f64 {
    if r <= 0.0 || d >= r {
        return 0.0;
    }
    let a = r - d;
    r - (r * r - a * a).max(0.0).sqrt()
}

/// Signed shoelace area.
pub fn polygon_area(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        acc += p[0] * q[1] - q[0] * p[1];
    }
    acc / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rounded_rect_slice_in_corner_band() {
        let s = Section::rounded_rect([0.0, 0.0], [10.0, 6.0], 2.0);
        let mid = s.slice(0.0);
        assert_eq!(mid.spans(), &[(-5.0, 5.0)]);
        // On the bottom edge only the flat part remains.
        let edge = s.slice(-3.0);
        assert_relative_eq!(edge.spans()[0].0, -3.0, epsilon = 1e-12);
        assert!(s.slice(-3.1).is_empty());
    }

    #[test]
    fn inset_shrinks_radii_and_size() {
        let s = Section::rounded_rect([0.0, 0.0], [10.0, 10.0], 3.0);
        match s.inset(1.0).unwrap() {
            Section::RoundedRect { size, radii, .. } => {
                assert_eq!(size, [8.0, 8.0]);
                assert_eq!(radii, [2.0; 4]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match s.inset(-1.0).unwrap() {
            Section::RoundedRect { radii, .. } => assert_eq!(radii, [4.0; 4]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(s.inset(5.0).is_none());
    }

    #[test]
    fn circle_area_and_slice() {
        let c = Section::circle([1.0, 1.0], 2.0);
        assert_relative_eq!(c.area(), PI * 4.0);
        assert_eq!(c.slice(1.0).spans(), &[(-1.0, 3.0)]);
        assert!(c.slice(3.5).is_empty());
    }

    #[test]
    fn polygon_slice_even_odd() {
        // U shape: two prongs above v = 1.
        let u = Section::polygon(vec![
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
        ]);
        assert_eq!(u.slice(2.0).spans(), &[(0.0, 1.0), (2.0, 3.0)]);
        assert_eq!(u.slice(0.5).spans(), &[(0.0, 3.0)]);
        assert_relative_eq!(u.area(), 7.0);
    }

    #[test]
    fn regular_hexagon_has_requested_inradius() {
        let hex = Section::regular_polygon([0.0, 0.0], 5.0, 6, 0.0, 0);
        let (lo, hi) = hex.bounds().unwrap();
        // Flat sides face +-u.
        assert_relative_eq!(hi[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(lo[0], -5.0, epsilon = 1e-9);
        let area = hex.area();
        assert_relative_eq!(area, 6.0 * 25.0 * (PI / 6.0).tan(), epsilon = 1e-9);
    }

    #[test]
    fn rounded_polygon_loses_corner_area() {
        let sharp = Section::regular_polygon([0.0, 0.0], 5.0, 4, 0.0, 0);
        let round = Section::regular_polygon([0.0, 0.0], 5.0, 4, 1.0, 8);
        assert_relative_eq!(sharp.area(), 100.0, epsilon = 1e-9);
        assert!(round.area() < sharp.area());
        assert!(round.area() > 100.0 - 4.0 * (1.0 - PI / 4.0) - 0.05);
    }
}
