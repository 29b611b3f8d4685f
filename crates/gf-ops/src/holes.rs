//! Hole strategy library.
//!
//! This module is the only place that constructs hole geometry. Standard
//! holes go through the kernel's native counterbore primitive; enhanced
//! holes are built as explicit cutting shapes from independent modifier
//! functions applied in a fixed order: base bore, crush ribs, chamfer,
//! printable bridge, shaft.
//!
//! Builders work in hole coordinates: `s` is the depth below the entry
//! face, measured into the material along the frame direction.

use std::f64::consts::PI;
use std::marker::PhantomData;

use gf_kernel::{
    Axis, Counterbore, HoleDirection, Kernel, Section, Shaft, Shape, SolidHandle,
};
use gf_types::constants::*;
use gf_types::{HoleModifiers, HoleSpec, HoleStyle};
use tracing::{debug, info, instrument};

use crate::boolean;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// How far a constructed tool starts outside its entry face.
pub const ENTRY_OVERSHOOT: f64 = 0.01;

/// Radial overhang of a crush rib tool past the bore wall.
const RIB_OVERHANG: f64 = 0.1;

/// Entry face and drilling direction of a set of holes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleFrame {
    pub face_z: f64,
    pub direction: HoleDirection,
}

impl HoleFrame {
    /// Holes entering a downward-facing face and going up into material.
    pub fn up(face_z: f64) -> Self {
        Self {
            face_z,
            direction: HoleDirection::Up,
        }
    }

    /// Holes entering an upward-facing face and going down.
    pub fn down(face_z: f64) -> Self {
        Self {
            face_z,
            direction: HoleDirection::Down,
        }
    }

    /// World z range of the depth range `s0..s1`.
    pub fn span(&self, s0: f64, s1: f64) -> [f64; 2] {
        match self.direction {
            HoleDirection::Up => [self.face_z + s0, self.face_z + s1],
            HoleDirection::Down => [self.face_z - s1, self.face_z - s0],
        }
    }

    fn bore(&self, center: [f64; 2], radius: f64, s0: f64, s1: f64) -> Shape {
        let [z0, z1] = self.span(s0, s1);
        Shape::cylinder(center, radius, z0, z1)
    }

    /// Cone with radius `r0` at depth `s0` and `r1` at depth `s1`.
    fn cone(&self, center: [f64; 2], r0: f64, r1: f64, s0: f64, s1: f64) -> Shape {
        let [z0, z1] = self.span(s0, s1);
        match self.direction {
            HoleDirection::Up => Shape::frustum(center, r0, r1, z0, z1),
            HoleDirection::Down => Shape::frustum(center, r1, r0, z0, z1),
        }
    }
}

/// A hole ready to be cut, tagged with its construction strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum HoleTool {
    Native(Counterbore),
    Boolean(Shape),
}

/// Build the cutting tool for one hole of `spec` centred at `center`.
/// `shaft` adds a narrower through bore measured from the same face.
pub fn build(spec: &HoleSpec, frame: HoleFrame, center: [f64; 2], shaft: Option<Shaft>) -> HoleTool {
    match spec.style {
        HoleStyle::Standard => HoleTool::Native(Counterbore {
            center,
            face_z: frame.face_z,
            direction: frame.direction,
            bore_diameter: spec.diameter,
            bore_depth: spec.depth,
            shaft,
        }),
        HoleStyle::Enhanced(modifiers) => {
            HoleTool::Boolean(enhanced(spec, modifiers, frame, center, shaft))
        }
    }
}

fn enhanced(
    spec: &HoleSpec,
    m: HoleModifiers,
    frame: HoleFrame,
    center: [f64; 2],
    shaft: Option<Shaft>,
) -> Shape {
    let (diameter, depth) = if m.refined {
        refine(spec)
    } else {
        (spec.diameter, spec.depth)
    };
    let radius = diameter / 2.0;
    let mut tool = frame.bore(center, radius, -ENTRY_OVERSHOOT, depth);
    if m.crush_ribs {
        tool = crush_ribs(tool, frame, center, radius, depth, CRUSH_RIB_COUNT);
    }
    let mut parts = vec![tool];
    if m.chamfer {
        parts.push(chamfer(frame, center, radius));
    }
    if m.printable_top {
        parts.push(printable_bridge(frame, center, diameter, depth));
    }
    if let Some(shaft) = shaft {
        parts.push(frame.bore(center, shaft.diameter / 2.0, -ENTRY_OVERSHOOT, shaft.depth));
    }
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Shape::union(parts)
    }
}

/// Diameter and depth of the refined press-fit recess.
pub fn refine(spec: &HoleSpec) -> (f64, f64) {
    match spec.style {
        HoleStyle::Enhanced(m) if m.refined => (REFINED_HOLE_D, REFINED_HOLE_H),
        _ => (spec.diameter, spec.depth),
    }
}

/// Leave `count` radial ribs standing inside `bore`, reaching in to the
/// crush rib inner diameter.
pub fn crush_ribs(
    bore: Shape,
    frame: HoleFrame,
    center: [f64; 2],
    radius: f64,
    depth: f64,
    count: usize,
) -> Shape {
    let inner = CRUSH_RIB_INNER_D / 2.0;
    let outer = radius + RIB_OVERHANG;
    let half_w = CRUSH_RIB_WIDTH / 2.0;
    let [z0, z1] = frame.span(-2.0 * ENTRY_OVERSHOOT, depth + ENTRY_OVERSHOOT);
    let ribs = (0..count)
        .map(|k| {
            let theta = 2.0 * PI * k as f64 / count as f64;
            let (s, c) = theta.sin_cos();
            let corner = |a: f64, b: f64| [center[0] + a * c - b * s, center[1] + a * s + b * c];
            let points = vec![
                corner(inner, -half_w),
                corner(outer, -half_w),
                corner(outer, half_w),
                corner(inner, half_w),
            ];
            Shape::extrude_z(Section::polygon(points), z0, z1)
        })
        .collect();
    Shape::difference(bore, ribs)
}

/// Lead-in cone at the hole entry, `CHAMFER_EXTRA_R` wider than the bore.
pub fn chamfer(frame: HoleFrame, center: [f64; 2], radius: f64) -> Shape {
    let slope = CHAMFER_ANGLE.to_radians().tan();
    let height = CHAMFER_EXTRA_R / slope;
    let entry = radius + CHAMFER_EXTRA_R + ENTRY_OVERSHOOT * slope;
    frame.cone(center, entry, radius, -ENTRY_OVERSHOOT, height)
}

/// One extra layer past the bore bottom, open only in a central strip half
/// the bore diameter wide, so the roof over the recess bridges.
pub fn printable_bridge(frame: HoleFrame, center: [f64; 2], diameter: f64, depth: f64) -> Shape {
    let [z0, z1] = frame.span(depth, depth + HOLE_SLICE);
    Shape::intersection(vec![
        Shape::cylinder(center, diameter / 2.0, z0, z1),
        Shape::extrude_z(Section::rect(center, [diameter / 2.0, diameter]), z0, z1),
    ])
}

/// Countersunk through hole: a `hole_d` bore `depth` deep under a cone of
/// included angle `angle_deg` opening to `csk_d` at the face.
pub fn countersink(
    frame: HoleFrame,
    center: [f64; 2],
    hole_d: f64,
    csk_d: f64,
    angle_deg: f64,
    depth: f64,
) -> Shape {
    let slope = (angle_deg / 2.0).to_radians().tan();
    let (r, rc) = (hole_d / 2.0, csk_d / 2.0);
    let cone_h = (rc - r) / slope;
    Shape::union(vec![
        frame.bore(center, r, -ENTRY_OVERSHOOT, depth),
        frame.cone(center, rc + ENTRY_OVERSHOOT * slope, r, -ENTRY_OVERSHOOT, cone_h),
    ])
}

/// Plain bore `depth` deep into the material.
pub fn through_hole(frame: HoleFrame, center: [f64; 2], diameter: f64, depth: f64) -> Shape {
    frame.bore(center, diameter / 2.0, -ENTRY_OVERSHOOT, depth)
}

/// Horizontal bore along `axis` (X or Y) over `span`. `at` is the bore
/// centre in the prism's section plane: (y, z) for X, (x, z) for Y.
pub fn cross_bore(axis: Axis, at: [f64; 2], diameter: f64, span: [f64; 2]) -> Shape {
    Shape::prism(axis, Section::circle(at, diameter / 2.0), span)
}

// ── Removed volume ──────────────────────────────────────────────────────────

/// Marker for holes cut with the native counterbore primitive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Standard;

/// Marker for holes cut as constructed boolean tools.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Enhanced;

/// Material removed by one hole strategy. Values of different strategies
/// have different types and cannot be compared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RemovedVolume<S> {
    mm3: f64,
    strategy: PhantomData<S>,
}

impl<S> RemovedVolume<S> {
    fn new(mm3: f64) -> Self {
        Self {
            mm3,
            strategy: PhantomData,
        }
    }

    pub fn mm3(&self) -> f64 {
        self.mm3
    }
}

#[derive(Debug)]
pub struct HoleOutcome {
    pub solid: SolidHandle,
    pub count: usize,
    pub standard: Option<RemovedVolume<Standard>>,
    pub enhanced: Option<RemovedVolume<Enhanced>>,
}

/// Cut every hole in `tools` from `target`, consuming it. Native holes go
/// through one counterbore call, constructed tools through one boolean cut.
#[instrument(skip(kb, target, tools), fields(holes = tools.len()))]
pub fn apply_holes(
    kb: &mut dyn KernelBundle,
    target: SolidHandle,
    tools: Vec<HoleTool>,
    feature: &str,
) -> Result<HoleOutcome, OpError> {
    let count = tools.len();
    let mut natives = Vec::new();
    let mut shapes = Vec::new();
    for tool in tools {
        match tool {
            HoleTool::Native(cb) => natives.push(cb),
            HoleTool::Boolean(shape) => shapes.push(shape),
        }
    }

    let mut solid = target;
    let mut standard = None;
    if !natives.is_empty() {
        let before = kb.volume_of(&solid)?;
        let next = kb.counterbore_holes(&solid, &natives);
        kb.release(solid);
        let next = next?;
        let after = kb.volume_of(&next)?;
        if after >= before {
            kb.release(next);
            return Err(OpError::NoMaterialRemoved {
                feature: feature.to_string(),
            });
        }
        debug!(feature, holes = natives.len(), removed = before - after, "counterbores cut");
        standard = Some(RemovedVolume::new(before - after));
        solid = next;
    }

    let mut enhanced = None;
    if !shapes.is_empty() {
        let n = shapes.len();
        let tool = if n == 1 {
            shapes.remove(0)
        } else {
            Shape::union(shapes)
        };
        let out = boolean::cut(kb, solid, &tool, feature, true)?;
        debug!(feature, holes = n, removed = out.removed(), "enhanced holes cut");
        enhanced = Some(RemovedVolume::new(out.removed()));
        solid = out.solid;
    }

    info!(feature, count, "holes applied");
    Ok(HoleOutcome {
        solid,
        count,
        standard,
        enhanced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gf_kernel::{KernelIntrospect, SectionKernel};

    fn tool_volume(shape: &Shape) -> f64 {
        let mut k = SectionKernel::new();
        let h = k.make_solid(shape).unwrap();
        k.volume(&h).unwrap()
    }

    fn tool_bbox(shape: &Shape) -> gf_kernel::BoundingBox {
        shape.bounds().unwrap()
    }

    fn boolean(tool: HoleTool) -> Shape {
        match tool {
            HoleTool::Boolean(s) => s,
            HoleTool::Native(_) => panic!("expected a constructed tool"),
        }
    }

    fn modifiers() -> HoleModifiers {
        HoleModifiers::default()
    }

    // ── Strategy selection ──

    #[test]
    fn standard_hole_uses_native_counterbore() {
        let tool = build(&HoleSpec::magnet(), HoleFrame::up(0.0), [13.0, 13.0], None);
        match tool {
            HoleTool::Native(cb) => {
                assert_eq!(cb.center, [13.0, 13.0]);
                assert_eq!(cb.bore_diameter, MAGNET_HOLE_D);
                assert_eq!(cb.bore_depth, MAGNET_HOLE_H);
                assert_eq!(cb.direction, HoleDirection::Up);
            }
            HoleTool::Boolean(_) => panic!("standard hole must be native"),
        }
    }

    #[test]
    fn refined_hole_is_smaller() {
        let spec = HoleSpec::enhanced(HoleModifiers {
            refined: true,
            ..modifiers()
        });
        let b = tool_bbox(&boolean(build(&spec, HoleFrame::up(0.0), [0.0, 0.0], None)));
        assert_relative_eq!(b.size()[0], REFINED_HOLE_D, epsilon = 1e-9);
        assert_relative_eq!(b.max[2], REFINED_HOLE_H, epsilon = 1e-9);
    }

    // ── Modifiers ──

    #[test]
    fn crush_ribs_keep_material_in_the_bore() {
        let frame = HoleFrame::up(0.0);
        let r = MAGNET_HOLE_D / 2.0;
        let plain = frame.bore([0.0, 0.0], r, 0.0, MAGNET_HOLE_H);
        let four = crush_ribs(plain.clone(), frame, [0.0, 0.0], r, MAGNET_HOLE_H, 4);
        let eight = crush_ribs(plain.clone(), frame, [0.0, 0.0], r, MAGNET_HOLE_H, 8);
        let (vp, v4, v8) = (tool_volume(&plain), tool_volume(&four), tool_volume(&eight));
        assert!(vp > v4 && v4 > v8, "{vp} {v4} {v8}");
        assert!(tool_bbox(&eight).approx_eq(&tool_bbox(&plain), 1e-9));
    }

    #[test]
    fn chamfer_cone_dimensions() {
        let r = MAGNET_HOLE_D / 2.0;
        let b = tool_bbox(&chamfer(HoleFrame::up(0.0), [0.0, 0.0], r));
        let d = 2.0 * (r + CHAMFER_EXTRA_R + ENTRY_OVERSHOOT);
        assert_relative_eq!(b.size()[0], d, epsilon = 1e-9);
        assert_relative_eq!(b.max[2], CHAMFER_EXTRA_R, epsilon = 1e-9);
    }

    #[test]
    fn downward_frame_mirrors_the_tool() {
        let spec = HoleSpec::enhanced(HoleModifiers {
            chamfer: true,
            ..modifiers()
        });
        let b = tool_bbox(&boolean(build(&spec, HoleFrame::down(5.0), [0.0, 0.0], None)));
        assert_relative_eq!(b.min[2], 5.0 - MAGNET_HOLE_H, epsilon = 1e-9);
        assert_relative_eq!(b.max[2], 5.0 + ENTRY_OVERSHOOT, epsilon = 1e-9);
    }

    #[test]
    fn printable_bridge_deepens_a_central_strip() {
        let d = MAGNET_HOLE_D;
        let bridge = printable_bridge(HoleFrame::up(0.0), [0.0, 0.0], d, MAGNET_HOLE_H);
        let b = tool_bbox(&bridge);
        assert_relative_eq!(b.min[2], MAGNET_HOLE_H, epsilon = 1e-12);
        assert_relative_eq!(b.max[2], MAGNET_HOLE_H + HOLE_SLICE, epsilon = 1e-12);
        assert_relative_eq!(b.size()[0], d / 2.0, epsilon = 1e-12);
        let v = tool_volume(&bridge);
        assert!(v > 0.0 && v < PI * (d / 2.0).powi(2) * HOLE_SLICE);
    }

    #[test]
    fn countersink_cone_height_follows_angle() {
        let shape = countersink(HoleFrame::down(5.0), [0.0, 0.0], CSK_HOLE_D, CSK_D, CSK_ANGLE, 5.0);
        let b = tool_bbox(&shape);
        assert_relative_eq!(b.min[2], 0.0, epsilon = 1e-12);
        assert!(b.size()[0] > CSK_D);
    }

    #[test]
    fn cross_bore_runs_along_its_axis() {
        let b = tool_bbox(&cross_bore(Axis::Y, [4.0, 3.0], 2.0, [-10.0, 10.0]));
        assert_relative_eq!(b.min[1], -10.0);
        assert_relative_eq!(b.max[1], 10.0);
        assert_relative_eq!(b.min[0], 3.0);
        assert_relative_eq!(b.max[2], 4.0);
    }

    // ── Cutting ──

    fn plate(k: &mut SectionKernel) -> SolidHandle {
        k.make_solid(&Shape::extrude_z(Section::rect([0.0, 0.0], [42.0, 42.0]), 0.0, 5.0))
            .unwrap()
    }

    #[test]
    fn native_holes_remove_their_cylinders() {
        let mut k = SectionKernel::new();
        let target = plate(&mut k);
        let spec = HoleSpec::magnet();
        let tools = [-13.0, 13.0]
            .iter()
            .flat_map(|&x| [-13.0, 13.0].map(|y| [x, y]))
            .map(|c| build(&spec, HoleFrame::down(5.0), c, None))
            .collect();
        let out = apply_holes(&mut k, target, tools, "magnets").unwrap();
        let expected = 4.0 * PI * (MAGNET_HOLE_D / 2.0).powi(2) * MAGNET_HOLE_H;
        assert_eq!(out.count, 4);
        assert!(out.enhanced.is_none());
        assert_relative_eq!(out.standard.unwrap().mm3(), expected, max_relative = 1e-4);
    }

    #[test]
    fn mixed_strategies_report_separately() {
        let mut k = SectionKernel::new();
        let target = plate(&mut k);
        let fancy = HoleSpec::enhanced(HoleModifiers {
            chamfer: true,
            ..modifiers()
        });
        let tools = vec![
            build(&HoleSpec::magnet(), HoleFrame::down(5.0), [-13.0, 0.0], None),
            build(&fancy, HoleFrame::down(5.0), [13.0, 0.0], None),
        ];
        let out = apply_holes(&mut k, target, tools, "magnets").unwrap();
        assert!(out.standard.unwrap().mm3() > 0.0);
        assert!(out.enhanced.unwrap().mm3() > 0.0);
        assert_eq!(k.solid_count(), 1);
    }
}
