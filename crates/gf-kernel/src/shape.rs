//! Constructive solid descriptions handed to [`crate::Kernel::make_solid`].
//!
//! Every solid is a CSG tree over prisms. A prism sweeps a planar
//! [`Section`] along one world axis; Z prisms may additionally carry an
//! [`InsetProfile`] that offsets the section as a function of height, which
//! is how chamfered and filleted profiles are swept.

use crate::section::Section;
use crate::types::BoundingBox;

const ROUND_BREAKS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// World axes carrying the section's (u, v) coordinates.
    pub fn plane_axes(self) -> (usize, usize) {
        match self {
            Axis::X => (1, 2),
            Axis::Y => (0, 2),
            Axis::Z => (0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Min,
    Max,
}

/// One piece of an inset profile over `t0..t1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsetSegment {
    Linear { t0: f64, t1: f64, d0: f64, d1: f64 },
    /// Concave quarter round of radius `t1 - t0`, from `d1 + r` at `t0`
    /// down to `d1` at `t1`.
    Round { t0: f64, t1: f64, d1: f64 },
}

impl InsetSegment {
    pub fn range(&self) -> (f64, f64) {
        match *self {
            InsetSegment::Linear { t0, t1, .. } | InsetSegment::Round { t0, t1, .. } => (t0, t1),
        }
    }

    pub fn start(&self) -> f64 {
        match *self {
            InsetSegment::Linear { d0, .. } => d0,
            InsetSegment::Round { t0, t1, d1 } => d1 + (t1 - t0),
        }
    }

    pub fn end(&self) -> f64 {
        match *self {
            InsetSegment::Linear { d1, .. } | InsetSegment::Round { d1, .. } => d1,
        }
    }

    fn at(&self, t: f64) -> f64 {
        match *self {
            InsetSegment::Linear { t0, t1, d0, d1 } => {
                if t1 <= t0 {
                    return d1;
                }
                let s = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
                d0 + s * (d1 - d0)
            }
            InsetSegment::Round { t0, t1, d1 } => {
                let r = t1 - t0;
                let a = (t1 - t.clamp(t0, t1)).min(r);
                d1 + r - (r * r - a * a).max(0.0).sqrt()
            }
        }
    }

    fn shifted(&self, dt: f64) -> InsetSegment {
        match *self {
            InsetSegment::Linear { t0, t1, d0, d1 } => InsetSegment::Linear {
                t0: t0 + dt,
                t1: t1 + dt,
                d0,
                d1,
            },
            InsetSegment::Round { t0, t1, d1 } => InsetSegment::Round {
                t0: t0 + dt,
                t1: t1 + dt,
                d1,
            },
        }
    }
}

/// Piecewise inset along a prism's sweep parameter. Outside its segments
/// the profile holds the nearest end value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsetProfile {
    segments: Vec<InsetSegment>,
}

impl InsetProfile {
    pub fn new(mut segments: Vec<InsetSegment>) -> Self {
        segments.sort_by(|a, b| a.range().0.total_cmp(&b.range().0));
        Self { segments }
    }

    pub fn constant(d: f64, t0: f64, t1: f64) -> Self {
        Self::new(vec![InsetSegment::Linear { t0, t1, d0: d, d1: d }])
    }

    pub fn linear(t0: f64, t1: f64, d0: f64, d1: f64) -> Self {
        Self::new(vec![InsetSegment::Linear { t0, t1, d0, d1 }])
    }

    pub fn segments(&self) -> &[InsetSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn at(&self, t: f64) -> f64 {
        let Some(first) = self.segments.first() else {
            return 0.0;
        };
        if t < first.range().0 {
            return first.start();
        }
        let mut value = first.start();
        for seg in &self.segments {
            let (t0, t1) = seg.range();
            if t < t0 {
                break;
            }
            value = if t <= t1 { seg.at(t) } else { seg.end() };
        }
        value
    }

    pub fn breakpoints(&self, out: &mut Vec<f64>) {
        for seg in &self.segments {
            let (t0, t1) = seg.range();
            out.push(t0);
            out.push(t1);
            if let InsetSegment::Round { .. } = seg {
                // Denser near t0, where the round meets the floor tangentially.
                let r = t1 - t0;
                for k in 1..ROUND_BREAKS {
                    let c = (std::f64::consts::FRAC_PI_2 * k as f64 / ROUND_BREAKS as f64).cos();
                    out.push(t1 - r * c);
                }
            }
        }
    }

    pub fn has_round(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, InsetSegment::Round { .. }))
    }

    /// Sub-ranges where the inset follows a curve.
    pub fn curved_ranges(&self, out: &mut Vec<(f64, f64)>) {
        for seg in &self.segments {
            if let InsetSegment::Round { t0, t1, .. } = *seg {
                out.push((t0, t1));
            }
        }
    }

    /// Parameters where a linear segment crosses `d`.
    pub fn crossings(&self, d: f64, out: &mut Vec<f64>) {
        for seg in &self.segments {
            if let InsetSegment::Linear { t0, t1, d0, d1 } = *seg {
                if (d0 - d) * (d1 - d) < 0.0 {
                    out.push(t0 + (d - d0) / (d1 - d0) * (t1 - t0));
                }
            }
        }
    }

    /// Smallest inset over `[a, b]`. Every segment is monotone, so the
    /// minimum sits at an end or a segment boundary.
    pub fn min_over(&self, a: f64, b: f64) -> f64 {
        let mut m = self.at(a).min(self.at(b));
        for seg in &self.segments {
            let (t0, t1) = seg.range();
            for t in [t0, t1] {
                if t > a && t < b {
                    m = m.min(self.at(t));
                }
            }
        }
        m
    }

    /// True when the inset takes more than one value over `[a, b]`.
    pub fn varies_over(&self, a: f64, b: f64, tol: f64) -> bool {
        let reference = self.at(a);
        let mut probes = vec![b];
        self.breakpoints(&mut probes);
        probes
            .into_iter()
            .filter(|t| *t >= a && *t <= b)
            .chain(std::iter::once((a + b) / 2.0))
            .any(|t| (self.at(t) - reference).abs() > tol)
    }

    pub fn shifted(&self, dt: f64) -> InsetProfile {
        InsetProfile {
            segments: self.segments.iter().map(|s| s.shifted(dt)).collect(),
        }
    }
}

/// A section swept along `axis` over `span`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub axis: Axis,
    pub section: Section,
    pub span: [f64; 2],
    pub inset: Option<InsetProfile>,
}

impl Prism {
    pub fn inset_at(&self, t: f64) -> f64 {
        self.inset.as_ref().map_or(0.0, |p| p.at(t))
    }

    /// The section in effect at sweep parameter `t`, `None` once it vanishes.
    pub fn section_at(&self, t: f64) -> Option<Section> {
        match &self.inset {
            None => Some(self.section.clone()),
            Some(p) => self.section.inset(p.at(t)),
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let (lo, hi) = self.section.bounds()?;
        let shrink = self
            .inset
            .as_ref()
            .map_or(0.0, |p| p.min_over(self.span[0], self.span[1]));
        let (lo, hi) = (
            [lo[0] + shrink, lo[1] + shrink],
            [hi[0] - shrink, hi[1] - shrink],
        );
        if hi[0] <= lo[0] || hi[1] <= lo[1] || self.span[1] <= self.span[0] {
            return None;
        }
        let (u, v) = self.axis.plane_axes();
        let a = self.axis.index();
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        min[u] = lo[0];
        max[u] = hi[0];
        min[v] = lo[1];
        max[v] = hi[1];
        min[a] = self.span[0];
        max[a] = self.span[1];
        Some(BoundingBox::new(min, max))
    }

    pub fn translated(&self, d: [f64; 3]) -> Prism {
        let (u, v) = self.axis.plane_axes();
        let a = self.axis.index();
        Prism {
            axis: self.axis,
            section: self.section.translate(d[u], d[v]),
            span: [self.span[0] + d[a], self.span[1] + d[a]],
            inset: self.inset.as_ref().map(|p| p.shifted(d[a])),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.span[0].is_finite() && self.span[1].is_finite()) || self.span[1] <= self.span[0] {
            return Err(format!("prism span {:?} is empty or not finite", self.span));
        }
        let finite_section = match &self.section {
            Section::RoundedRect {
                center,
                size,
                radii,
            } => center
                .iter()
                .chain(size)
                .chain(radii)
                .all(|x| x.is_finite()),
            Section::Circle { center, radius } => {
                center.iter().all(|x| x.is_finite()) && radius.is_finite()
            }
            Section::Polygon { points } => points.iter().flatten().all(|x| x.is_finite()),
        };
        if !finite_section {
            return Err("section has non-finite coordinates".to_string());
        }
        if self.section.bounds().is_none() {
            return Err("section is degenerate".to_string());
        }
        if let Some(profile) = &self.inset {
            if self.axis != Axis::Z {
                return Err("inset profiles are only supported on Z prisms".to_string());
            }
            if matches!(self.section, Section::Polygon { .. }) {
                return Err("polygon sections cannot carry an inset profile".to_string());
            }
            for seg in profile.segments() {
                let (t0, t1) = seg.range();
                if !(t0.is_finite() && t1.is_finite() && seg.start().is_finite() && seg.end().is_finite())
                    || t1 < t0
                {
                    return Err(format!("inset segment {seg:?} is malformed"));
                }
            }
        }
        Ok(())
    }

    /// Push the end (or side) of this prism lying on `plane` outward by `eps`.
    fn stretch(&mut self, axis: Axis, side: Side, plane: f64, eps: f64, tol: f64) -> bool {
        let sign = match side {
            Side::Min => -1.0,
            Side::Max => 1.0,
        };
        if self.axis == axis {
            let end = match side {
                Side::Min => 0,
                Side::Max => 1,
            };
            if (self.span[end] - plane).abs() <= tol {
                self.span[end] += sign * eps;
                return true;
            }
            return false;
        }
        if self.inset.is_some() {
            return false;
        }
        let (u, _) = self.axis.plane_axes();
        let k = if axis.index() == u { 0 } else { 1 };
        match &mut self.section {
            Section::RoundedRect { center, size, .. } => {
                let edge = center[k] + sign * size[k] / 2.0;
                if (edge - plane).abs() <= tol {
                    size[k] += eps;
                    center[k] += sign * eps / 2.0;
                    return true;
                }
                false
            }
            Section::Polygon { points } => {
                let mut moved = false;
                for p in points.iter_mut() {
                    if (p[k] - plane).abs() <= tol {
                        p[k] += sign * eps;
                        moved = true;
                    }
                }
                moved
            }
            Section::Circle { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Prism(Prism),
    Union(Vec<Shape>),
    Difference(Box<Shape>, Vec<Shape>),
    Intersection(Vec<Shape>),
}

impl Shape {
    pub fn prism(axis: Axis, section: Section, span: [f64; 2]) -> Shape {
        Shape::Prism(Prism {
            axis,
            section,
            span,
            inset: None,
        })
    }

    pub fn extrude_z(section: Section, z0: f64, z1: f64) -> Shape {
        Shape::prism(Axis::Z, section, [z0, z1])
    }

    /// Sweep `section` from `z0` to `z1`, offset by `profile` along the way.
    pub fn swept_z(section: Section, z0: f64, z1: f64, profile: InsetProfile) -> Shape {
        Shape::Prism(Prism {
            axis: Axis::Z,
            section,
            span: [z0, z1],
            inset: Some(profile),
        })
    }

    pub fn cylinder(center: [f64; 2], radius: f64, z0: f64, z1: f64) -> Shape {
        Shape::extrude_z(Section::circle(center, radius), z0, z1)
    }

    /// Truncated cone with radius `r0` at `z0` and `r1` at `z1`.
    pub fn frustum(center: [f64; 2], r0: f64, r1: f64, z0: f64, z1: f64) -> Shape {
        let r = r0.max(r1);
        Shape::swept_z(
            Section::circle(center, r),
            z0,
            z1,
            InsetProfile::linear(z0, z1, r - r0, r - r1),
        )
    }

    pub fn union(parts: Vec<Shape>) -> Shape {
        Shape::Union(parts)
    }

    pub fn difference(base: Shape, tools: Vec<Shape>) -> Shape {
        Shape::Difference(Box::new(base), tools)
    }

    pub fn intersection(parts: Vec<Shape>) -> Shape {
        Shape::Intersection(parts)
    }

    pub fn translated(&self, d: [f64; 3]) -> Shape {
        match self {
            Shape::Prism(p) => Shape::Prism(p.translated(d)),
            Shape::Union(parts) => Shape::Union(parts.iter().map(|s| s.translated(d)).collect()),
            Shape::Difference(base, tools) => Shape::Difference(
                Box::new(base.translated(d)),
                tools.iter().map(|s| s.translated(d)).collect(),
            ),
            Shape::Intersection(parts) => {
                Shape::Intersection(parts.iter().map(|s| s.translated(d)).collect())
            }
        }
    }

    /// Structural bounding box: unions grow, differences keep the base,
    /// intersections clip.
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Shape::Prism(p) => p.bounds(),
            Shape::Union(parts) => parts
                .iter()
                .filter_map(Shape::bounds)
                .reduce(|a, b| a.union(&b)),
            Shape::Difference(base, _) => base.bounds(),
            Shape::Intersection(parts) => {
                let mut acc: Option<BoundingBox> = None;
                for (i, part) in parts.iter().enumerate() {
                    let b = part.bounds()?;
                    acc = if i == 0 { Some(b) } else { acc?.intersection(&b) };
                }
                acc
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Shape::Prism(p) => p.validate(),
            Shape::Union(parts) | Shape::Intersection(parts) => {
                if parts.is_empty() {
                    return Err("empty union or intersection".to_string());
                }
                parts.iter().try_for_each(Shape::validate)
            }
            Shape::Difference(base, tools) => {
                base.validate()?;
                tools.iter().try_for_each(Shape::validate)
            }
        }
    }

    pub fn prism_count(&self) -> usize {
        match self {
            Shape::Prism(_) => 1,
            Shape::Union(parts) | Shape::Intersection(parts) => {
                parts.iter().map(Shape::prism_count).sum()
            }
            Shape::Difference(base, tools) => {
                base.prism_count() + tools.iter().map(Shape::prism_count).sum::<usize>()
            }
        }
    }

    /// Move every prism boundary lying on the plane `axis = plane` outward
    /// (towards `side`) by `eps`. Prisms subtracted inside the shape are left
    /// where they are. Returns the new shape and the number of prisms
    /// touched.
    pub fn stretch(&self, axis: Axis, side: Side, plane: f64, eps: f64, tol: f64) -> (Shape, usize) {
        let mut out = self.clone();
        let count = out.stretch_in_place(axis, side, plane, eps, tol);
        (out, count)
    }

    fn stretch_in_place(&mut self, axis: Axis, side: Side, plane: f64, eps: f64, tol: f64) -> usize {
        match self {
            Shape::Prism(p) => usize::from(p.stretch(axis, side, plane, eps, tol)),
            Shape::Union(parts) | Shape::Intersection(parts) => parts
                .iter_mut()
                .map(|s| s.stretch_in_place(axis, side, plane, eps, tol))
                .sum(),
            // Growing a subtracted prism would shrink the tool.
            Shape::Difference(base, _) => base.stretch_in_place(axis, side, plane, eps, tol),
        }
    }
}

impl From<Prism> for Shape {
    fn from(p: Prism) -> Self {
        Shape::Prism(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_segment_matches_quarter_circle() {
        let p = InsetProfile::new(vec![InsetSegment::Round {
            t0: 0.0,
            t1: 2.0,
            d1: 1.0,
        }]);
        assert_relative_eq!(p.at(0.0), 3.0);
        assert_relative_eq!(p.at(2.0), 1.0);
        // Halfway up a quarter round of radius 2.
        assert_relative_eq!(p.at(1.0), 1.0 + 2.0 - 3.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(p.at(-5.0), 3.0);
        assert_relative_eq!(p.at(9.0), 1.0);
    }

    #[test]
    fn profile_holds_values_in_gaps() {
        let p = InsetProfile::new(vec![
            InsetSegment::Linear {
                t0: 0.0,
                t1: 1.0,
                d0: 2.0,
                d1: 1.0,
            },
            InsetSegment::Linear {
                t0: 3.0,
                t1: 4.0,
                d0: 1.0,
                d1: 0.0,
            },
        ]);
        assert_relative_eq!(p.at(2.0), 1.0);
        assert_relative_eq!(p.at(3.5), 0.5);
        assert_relative_eq!(p.min_over(0.0, 4.0), 0.0);
        assert_relative_eq!(p.min_over(0.0, 2.0), 1.0);
        assert!(!p.varies_over(1.0, 3.0, 1e-9));
        assert!(p.varies_over(0.0, 3.0, 1e-9));
    }

    #[test]
    fn frustum_bounds_use_larger_radius() {
        let f = Shape::frustum([0.0, 0.0], 1.0, 2.0, 0.0, 1.0);
        let b = f.bounds().unwrap();
        assert_relative_eq!(b.min[0], -2.0);
        assert_relative_eq!(b.max[2], 1.0);
    }

    #[test]
    fn axis_mapping_for_horizontal_prisms() {
        let bar = Shape::prism(Axis::X, Section::rect([0.0, 5.0], [2.0, 4.0]), [-10.0, 10.0]);
        let b = bar.bounds().unwrap();
        assert_eq!(b.min, [-10.0, -1.0, 3.0]);
        assert_eq!(b.max, [10.0, 1.0, 7.0]);
    }

    #[test]
    fn translated_moves_profile_with_prism() {
        let s = Shape::swept_z(
            Section::rect([0.0, 0.0], [10.0, 10.0]),
            0.0,
            2.0,
            InsetProfile::linear(0.0, 2.0, 1.0, 0.0),
        )
        .translated([1.0, 2.0, 3.0]);
        let Shape::Prism(p) = &s else {
            panic!("expected prism");
        };
        assert_eq!(p.span, [3.0, 5.0]);
        assert_relative_eq!(p.inset_at(3.0), 1.0);
        assert_relative_eq!(p.inset_at(5.0), 0.0);
    }

    #[test]
    fn stretch_moves_only_coplanar_ends() {
        let tool = Shape::union(vec![
            Shape::extrude_z(Section::rect([0.0, 0.0], [2.0, 2.0]), 0.0, 1.0),
            Shape::extrude_z(Section::rect([5.0, 0.0], [2.0, 2.0]), 0.5, 1.0),
        ]);
        let (stretched, n) = tool.stretch(Axis::Z, Side::Min, 0.0, 1e-5, 1e-7);
        assert_eq!(n, 1);
        assert_relative_eq!(stretched.bounds().unwrap().min[2], -1e-5);
    }

    #[test]
    fn stretch_leaves_subtracted_prisms_alone() {
        // A ring-shaped tool: both the outer block and the hole through it
        // start on the target's bottom face.
        let ring = Shape::difference(
            Shape::extrude_z(Section::rect([0.0, 0.0], [6.0, 6.0]), 0.0, 2.0),
            vec![Shape::extrude_z(Section::rect([0.0, 0.0], [2.0, 2.0]), 0.0, 2.0)],
        );
        let (stretched, n) = ring.stretch(Axis::Z, Side::Min, 0.0, 1e-5, 1e-7);
        assert_eq!(n, 1);
        let Shape::Difference(base, tools) = &stretched else {
            panic!("expected a difference");
        };
        assert_relative_eq!(base.bounds().unwrap().min[2], -1e-5);
        assert_relative_eq!(tools[0].bounds().unwrap().min[2], 0.0);
    }

    #[test]
    fn stretch_in_plane_grows_rect_side() {
        let tool = Shape::extrude_z(Section::rect([0.0, 0.0], [2.0, 2.0]), 0.0, 1.0);
        let (stretched, n) = tool.stretch(Axis::X, Side::Max, 1.0, 0.5, 1e-7);
        assert_eq!(n, 1);
        let b = stretched.bounds().unwrap();
        assert_relative_eq!(b.min[0], -1.0);
        assert_relative_eq!(b.max[0], 1.5);
    }

    #[test]
    fn validation_rejects_inset_on_horizontal_prism() {
        let bad = Shape::Prism(Prism {
            axis: Axis::Y,
            section: Section::rect([0.0, 0.0], [1.0, 1.0]),
            span: [0.0, 1.0],
            inset: Some(InsetProfile::constant(0.1, 0.0, 1.0)),
        });
        assert!(bad.validate().is_err());
        assert!(Shape::Union(vec![]).validate().is_err());
    }
}
