//! SectionKernel: the analytic CSG implementation of [`Kernel`].
//!
//! Solids are immutable [`Node`] trees kept in a slot map. Booleans never
//! touch their operands; they allocate a new root that shares them. Volumes
//! and material extents are computed on demand and cached per solid; the
//! trees themselves only carry conservative boxes for pruning.

use std::cell::RefCell;
use std::sync::Arc;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, info, instrument};

use crate::csg::Node;
use crate::integrate;
use crate::section::Section;
use crate::shape::{Axis, InsetProfile, InsetSegment, Prism, Shape};
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// How far a drilled tool starts outside the face it enters through.
const FACE_OVERSHOOT: f64 = 0.01;
/// Geometric matching tolerance for edge selection.
const SELECT_TOL: f64 = 1e-6;
/// Height offset of the material/void probes around a floor.
const PROBE_DZ: f64 = 0.05;
/// Overlap of a fillet band into the floor it sits on.
const BAND_OVERLAP: f64 = 1e-4;

#[derive(Default)]
pub struct SectionKernel {
    solids: SlotMap<SolidKey, Arc<Node>>,
    volumes: RefCell<SecondaryMap<SolidKey, f64>>,
    extents: RefCell<SecondaryMap<SolidKey, BoundingBox>>,
}

impl SectionKernel {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, solid: &SolidHandle) -> Result<&Arc<Node>, KernelError> {
        self.solids
            .get(solid.key())
            .ok_or(KernelError::SolidNotFound)
    }

    fn insert(&mut self, node: Arc<Node>) -> SolidHandle {
        SolidHandle(self.solids.insert(node))
    }

    /// Store a copy of an existing solid under a new handle.
    pub fn duplicate(&mut self, solid: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let node = self.node(solid)?.clone();
        Ok(self.insert(node))
    }

    /// Point membership test, boundary inclusive.
    pub fn contains_point(&self, solid: &SolidHandle, p: [f64; 3]) -> Result<bool, KernelError> {
        Ok(self.node(solid)?.contains(p))
    }

    fn floor_ring(&self, root: &Arc<Node>, z: f64, r: f64) -> Result<Arc<Node>, KernelError> {
        let mut prisms = Vec::new();
        root.collect_prisms(true, &mut prisms);

        let mut bands = Vec::new();
        for (p, positive) in prisms {
            if positive || p.axis != Axis::Z {
                continue;
            }
            if p.span[0] > z + SELECT_TOL || p.span[1] <= z + SELECT_TOL {
                continue;
            }
            let Some(Section::RoundedRect {
                center,
                size,
                radii,
            }) = p.section_at(z)
            else {
                continue;
            };
            if !floor_probes_pass(root, center, size, z, r) {
                continue;
            }
            if r >= size[0].min(size[1]) / 2.0 {
                return Err(KernelError::FilletFailed {
                    reason: format!(
                        "radius {r} does not fit a {:.3} x {:.3} pocket floor",
                        size[0], size[1]
                    ),
                });
            }
            if p.span[1] < z + r {
                return Err(KernelError::FilletFailed {
                    reason: format!("pocket above z={z:.3} is shallower than radius {r}"),
                });
            }
            if let Some(profile) = &p.inset {
                if profile.varies_over(z, z + r, SELECT_TOL) {
                    return Err(KernelError::FilletFailed {
                        reason: format!("pocket wall is not vertical over z={z:.3}..{:.3}", z + r),
                    });
                }
            }
            let section = Section::RoundedRect {
                center,
                size,
                radii,
            };
            bands.push(fillet_band(section, z, r));
        }

        if bands.is_empty() {
            return Err(KernelError::EmptySelection {
                selector: EdgeSelector::FloorRing { z }.to_string(),
            });
        }
        debug!(count = bands.len(), z, r, "floor ring fillet bands");
        let mut parts = vec![root.clone()];
        parts.extend(bands.iter().map(Node::compile));
        Ok(Node::make_union(parts))
    }

    fn round_vertical(
        &self,
        root: &Arc<Node>,
        selector: &EdgeSelector,
        r: f64,
    ) -> Result<Arc<Node>, KernelError> {
        let mut matched = 0usize;
        let mut failure: Option<String> = None;
        let mut round = |p: &Prism, positive: bool| -> Option<Prism> {
            let selected = match *selector {
                EdgeSelector::PocketVerticalEdges { min_length } => {
                    !positive && p.span[1] - p.span[0] >= min_length - SELECT_TOL
                }
                EdgeSelector::BossVerticalEdges { height } => {
                    positive && (p.span[1] - p.span[0] - height).abs() <= SELECT_TOL
                }
                EdgeSelector::FloorRing { .. } => false,
            };
            if !selected || p.axis != Axis::Z || p.inset.is_some() {
                return None;
            }
            let Section::RoundedRect {
                center,
                size,
                radii,
            } = &p.section
            else {
                return None;
            };
            matched += 1;
            if radii.iter().all(|ri| *ri >= r) {
                return None;
            }
            if r >= size[0].min(size[1]) / 2.0 {
                if failure.is_none() {
                    failure = Some(format!(
                        "radius {r} does not fit a {:.3} x {:.3} profile",
                        size[0], size[1]
                    ));
                }
                return None;
            }
            Some(Prism {
                section: Section::RoundedRect {
                    center: *center,
                    size: *size,
                    radii: radii.map(|ri| ri.max(r)),
                },
                ..p.clone()
            })
        };
        let mapped = root.map_prisms(true, &mut round);

        if let Some(reason) = failure {
            return Err(KernelError::FilletFailed { reason });
        }
        if matched == 0 {
            return Err(KernelError::EmptySelection {
                selector: selector.to_string(),
            });
        }
        debug!(matched, r, "vertical edges rounded");
        Ok(mapped.unwrap_or_else(|| root.clone()))
    }
}

/// Material just below the floor and void just above it, probed at the
/// middle of each side of the pocket. One matching side is enough: scoops
/// and other fills may cover the rest.
fn floor_probes_pass(root: &Node, center: [f64; 2], size: [f64; 2], z: f64, r: f64) -> bool {
    let m = r / 2.0 + 0.1;
    let hx = size[0] / 2.0 - m;
    let hy = size[1] / 2.0 - m;
    if hx <= 0.0 || hy <= 0.0 {
        return false;
    }
    let probes = [
        [center[0] - hx, center[1]],
        [center[0] + hx, center[1]],
        [center[0], center[1] - hy],
        [center[0], center[1] + hy],
    ];
    probes.iter().any(|&[x, y]| {
        root.contains([x, y, z - PROBE_DZ]) && !root.contains([x, y, z + PROBE_DZ])
    })
}

/// Concave quarter-round ring filling the corner between a pocket's walls
/// and its floor.
fn fillet_band(section: Section, z: f64, r: f64) -> Shape {
    let z0 = z - BAND_OVERLAP;
    let inner = InsetProfile::new(vec![
        InsetSegment::Linear {
            t0: z0,
            t1: z,
            d0: r,
            d1: r,
        },
        InsetSegment::Round {
            t0: z,
            t1: z + r,
            d1: 0.0,
        },
    ]);
    Shape::difference(
        Shape::extrude_z(section.clone(), z0, z + r),
        vec![Shape::swept_z(section, z0, z + r, inner)],
    )
}

fn counterbore_shape(hole: &Counterbore) -> Result<Shape, KernelError> {
    let dims_ok = hole.bore_diameter > 0.0
        && hole.bore_depth > 0.0
        && hole.bore_diameter.is_finite()
        && hole.bore_depth.is_finite()
        && hole.face_z.is_finite();
    if !dims_ok {
        return Err(KernelError::InvalidShape {
            reason: format!("counterbore {hole:?} has non-positive dimensions"),
        });
    }
    let drill = |diameter: f64, depth: f64| match hole.direction {
        HoleDirection::Up => Shape::cylinder(
            hole.center,
            diameter / 2.0,
            hole.face_z - FACE_OVERSHOOT,
            hole.face_z + depth,
        ),
        HoleDirection::Down => Shape::cylinder(
            hole.center,
            diameter / 2.0,
            hole.face_z - depth,
            hole.face_z + FACE_OVERSHOOT,
        ),
    };
    let mut parts = vec![drill(hole.bore_diameter, hole.bore_depth)];
    if let Some(shaft) = hole.shaft {
        if !(shaft.diameter > 0.0 && shaft.depth > 0.0) {
            return Err(KernelError::InvalidShape {
                reason: format!("counterbore shaft {shaft:?} has non-positive dimensions"),
            });
        }
        parts.push(drill(shaft.diameter, shaft.depth));
    }
    Ok(Shape::union(parts))
}

impl Kernel for SectionKernel {
    #[instrument(skip(self, shape), fields(prisms = shape.prism_count()))]
    fn make_solid(&mut self, shape: &Shape) -> Result<SolidHandle, KernelError> {
        shape
            .validate()
            .map_err(|reason| KernelError::InvalidShape { reason })?;
        let node = Node::compile(shape);
        debug!(bbox = ?node.bbox, "solid compiled");
        Ok(self.insert(node))
    }

    fn boolean_union(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let node = Node::make_union(vec![self.node(a)?.clone(), self.node(b)?.clone()]);
        Ok(self.insert(node))
    }

    fn boolean_subtract(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let target = self.node(a)?.clone();
        if target.bbox.is_none() {
            return Err(KernelError::BooleanFailed {
                reason: "cannot subtract from an empty solid".to_string(),
            });
        }
        let node = Node::make_difference(target, vec![self.node(b)?.clone()]);
        Ok(self.insert(node))
    }

    fn boolean_intersect(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let node = Node::make_intersection(vec![self.node(a)?.clone(), self.node(b)?.clone()]);
        Ok(self.insert(node))
    }

    #[instrument(skip(self, solid, holes), fields(count = holes.len()))]
    fn counterbore_holes(
        &mut self,
        solid: &SolidHandle,
        holes: &[Counterbore],
    ) -> Result<SolidHandle, KernelError> {
        let target = self.node(solid)?.clone();
        let tools = holes
            .iter()
            .map(|h| counterbore_shape(h).map(|s| Node::compile(&s)))
            .collect::<Result<Vec<_>, _>>()?;
        let node = Node::make_difference(target, tools);
        Ok(self.insert(node))
    }

    #[instrument(skip(self, solid))]
    fn fillet_edges(
        &mut self,
        solid: &SolidHandle,
        selector: &EdgeSelector,
        radius: f64,
    ) -> Result<SolidHandle, KernelError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(KernelError::FilletFailed {
                reason: format!("radius {radius} must be positive"),
            });
        }
        let root = self.node(solid)?.clone();
        let node = match *selector {
            EdgeSelector::FloorRing { z } => self.floor_ring(&root, z, radius)?,
            EdgeSelector::PocketVerticalEdges { .. } | EdgeSelector::BossVerticalEdges { .. } => {
                self.round_vertical(&root, selector, radius)?
            }
        };
        info!(%selector, radius, "fillet applied");
        Ok(self.insert(node))
    }

    fn release(&mut self, solid: SolidHandle) {
        self.solids.remove(solid.key());
        self.volumes.borrow_mut().remove(solid.key());
        self.extents.borrow_mut().remove(solid.key());
    }
}

impl KernelIntrospect for SectionKernel {
    fn volume(&self, solid: &SolidHandle) -> Result<f64, KernelError> {
        let node = self.node(solid)?;
        if let Some(v) = self.volumes.borrow().get(solid.key()) {
            return Ok(*v);
        }
        let v = integrate::volume(node);
        self.volumes.borrow_mut().insert(solid.key(), v);
        Ok(v)
    }

    fn bounding_box(&self, solid: &SolidHandle) -> Result<BoundingBox, KernelError> {
        let node = self.node(solid)?;
        if let Some(bb) = self.extents.borrow().get(solid.key()) {
            return Ok(*bb);
        }
        let bb = integrate::extents(node).ok_or_else(|| KernelError::InvalidShape {
            reason: "empty solid has no bounding box".to_string(),
        })?;
        self.extents.borrow_mut().insert(solid.key(), bb);
        Ok(bb)
    }

    fn check_validity(&self, solid: &SolidHandle) -> Result<ValidityReport, KernelError> {
        let node = self.node(solid)?;
        let mut issues = Vec::new();
        let finite = match node.bbox {
            Some(bb) => bb.min.iter().chain(&bb.max).all(|x| x.is_finite()),
            None => {
                issues.push("solid is empty".to_string());
                false
            }
        };
        let volume = self.volume(solid)?;
        let non_empty = volume > 0.0 && volume.is_finite();
        if !non_empty {
            issues.push(format!("enclosed volume is {volume}"));
        }
        if !finite && node.bbox.is_some() {
            issues.push("bounding box is not finite".to_string());
        }
        // Every stored tree bounds a regularized point set, so a non-empty
        // one has a closed boundary by construction.
        let closed = node.bbox.is_some();
        Ok(ValidityReport {
            finite,
            non_empty,
            closed,
            issues,
        })
    }

    fn solid_count(&self) -> usize {
        self.solids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn block(k: &mut SectionKernel, size: [f64; 3]) -> SolidHandle {
        k.make_solid(&Shape::extrude_z(
            Section::rect([0.0, 0.0], [size[0], size[1]]),
            0.0,
            size[2],
        ))
        .unwrap()
    }

    /// 40x40x10 block with a 30x30 pocket from z=3 upward.
    fn tray(k: &mut SectionKernel) -> SolidHandle {
        k.make_solid(&Shape::difference(
            Shape::extrude_z(Section::rounded_rect([0.0, 0.0], [40.0, 40.0], 3.0), 0.0, 10.0),
            vec![Shape::extrude_z(
                Section::rounded_rect([0.0, 0.0], [30.0, 30.0], 0.0),
                3.0,
                11.0,
            )],
        ))
        .unwrap()
    }

    #[test]
    fn subtract_leaves_operands_untouched() {
        let mut k = SectionKernel::new();
        let a = block(&mut k, [10.0, 10.0, 10.0]);
        let b = k
            .make_solid(&Shape::extrude_z(Section::rect([0.0, 0.0], [4.0, 4.0]), -1.0, 11.0))
            .unwrap();
        let c = k.boolean_subtract(&a, &b).unwrap();
        assert_relative_eq!(k.volume(&a).unwrap(), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(k.volume(&c).unwrap(), 1000.0 - 160.0, epsilon = 1e-9);
        assert_eq!(k.solid_count(), 3);
    }

    #[test]
    fn subtract_through_the_top_shrinks_the_box() {
        let mut k = SectionKernel::new();
        let a = block(&mut k, [10.0, 10.0, 10.0]);
        let b = k
            .make_solid(&Shape::extrude_z(Section::rect([0.0, 0.0], [12.0, 12.0]), 5.0, 11.0))
            .unwrap();
        let c = k.boolean_subtract(&a, &b).unwrap();
        assert_relative_eq!(k.volume(&c).unwrap(), 500.0, epsilon = 1e-9);
        let bb = k.bounding_box(&c).unwrap();
        assert_relative_eq!(bb.max[2], 5.0, epsilon = 1e-9);
        assert_relative_eq!(bb.min[2], 0.0);
        assert!(k.bounding_box(&a).unwrap().approx_eq(
            &BoundingBox::new([-5.0, -5.0, 0.0], [5.0, 5.0, 10.0]),
            1e-12
        ));
    }

    #[test]
    fn released_handles_are_rejected() {
        let mut k = SectionKernel::new();
        let a = block(&mut k, [1.0, 1.0, 1.0]);
        let stale = a.clone();
        k.release(a);
        assert_eq!(k.volume(&stale), Err(KernelError::SolidNotFound));
    }

    #[test]
    fn counterbore_removes_bore_and_shaft() {
        let mut k = SectionKernel::new();
        let a = block(&mut k, [20.0, 20.0, 10.0]);
        let hole = Counterbore {
            center: [0.0, 0.0],
            face_z: 0.0,
            direction: HoleDirection::Up,
            bore_diameter: 6.5,
            bore_depth: 2.4,
            shaft: Some(Shaft {
                diameter: 3.0,
                depth: 6.0,
            }),
        };
        let b = k.counterbore_holes(&a, &[hole]).unwrap();
        let removed = k.volume(&a).unwrap() - k.volume(&b).unwrap();
        let expected = PI * (3.25 * 3.25 * 2.4 + 1.5 * 1.5 * 3.6);
        assert_relative_eq!(removed, expected, max_relative = 1e-4);
    }

    #[test]
    fn invalid_shapes_are_refused() {
        let mut k = SectionKernel::new();
        let err = k
            .make_solid(&Shape::extrude_z(Section::rect([0.0, 0.0], [1.0, 1.0]), 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidShape { .. }));
    }

    #[test]
    fn floor_ring_adds_material_in_pocket_corners() {
        let mut k = SectionKernel::new();
        let t = tray(&mut k);
        let f = k
            .fillet_edges(&t, &EdgeSelector::FloorRing { z: 3.0 }, 1.0)
            .unwrap();
        let added = k.volume(&f).unwrap() - k.volume(&t).unwrap();
        let ring = 1.0 - PI / 4.0;
        assert!(added > ring * 4.0 * 28.0, "added {added}");
        assert!(added < ring * 4.0 * 30.0, "added {added}");
        assert!(k.bounding_box(&f).unwrap().approx_eq(&k.bounding_box(&t).unwrap(), 1e-12));
    }

    #[test]
    fn floor_ring_on_wrong_height_selects_nothing() {
        let mut k = SectionKernel::new();
        let t = tray(&mut k);
        let err = k
            .fillet_edges(&t, &EdgeSelector::FloorRing { z: 5.0 }, 1.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::EmptySelection { .. }));
    }

    #[test]
    fn oversized_radius_fails() {
        let mut k = SectionKernel::new();
        let t = tray(&mut k);
        let err = k
            .fillet_edges(&t, &EdgeSelector::FloorRing { z: 3.0 }, 16.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }));
    }

    #[test]
    fn pocket_vertical_edges_round_sharp_corners() {
        let mut k = SectionKernel::new();
        let t = tray(&mut k);
        let f = k
            .fillet_edges(&t, &EdgeSelector::PocketVerticalEdges { min_length: 5.0 }, 2.0)
            .unwrap();
        let added = k.volume(&f).unwrap() - k.volume(&t).unwrap();
        // Four corners of 4(1 - pi/4) over the 7mm pocket inside the block.
        assert_relative_eq!(added, 4.0 * 4.0 * (1.0 - PI / 4.0) * 7.0, max_relative = 1e-3);
    }

    #[test]
    fn boss_selector_matches_exact_height() {
        let mut k = SectionKernel::new();
        let a = block(&mut k, [10.0, 10.0, 4.0]);
        assert!(k
            .fillet_edges(&a, &EdgeSelector::BossVerticalEdges { height: 4.0 }, 1.0)
            .is_ok());
        let err = k
            .fillet_edges(&a, &EdgeSelector::BossVerticalEdges { height: 5.0 }, 1.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::EmptySelection { .. }));
    }

    #[test]
    fn validity_of_plain_and_empty_solids() {
        let mut k = SectionKernel::new();
        let a = block(&mut k, [2.0, 2.0, 2.0]);
        assert!(k.check_validity(&a).unwrap().is_valid());
        let far = k
            .make_solid(&Shape::extrude_z(Section::rect([10.0, 0.0], [2.0, 2.0]), 0.0, 2.0))
            .unwrap();
        let none = k.boolean_intersect(&a, &far).unwrap();
        let report = k.check_validity(&none).unwrap();
        assert!(!report.is_valid());
        assert!(!report.non_empty);
    }
}
