//! Bin recipe: feet, walls and lip, then compartments and the features
//! that live inside them.

use gf_kernel::{Axis, EdgeSelector, InsetProfile, InsetSegment, Section, Shaft, Shape};
use gf_ops::fillet::FilletGroup;
use gf_ops::holes::{self, HoleFrame};
use gf_ops::{pattern, OpError};
use gf_types::constants::*;
use gf_types::profile::base_profile;
use tracing::debug;

use super::plan::BinPlan;
use super::shapes::{inset_profile, outline, union_or_single};
use super::{Composer, Recipe};
use crate::types::EngineError;

/// How far the lip cavity reaches above the rim.
const LIP_OVERSHOOT: f64 = 1.0;

/// Height of the thumbscrew bore axis above the floor.
const THUMBSCREW_LIFT: f64 = 3.0;

impl BinPlan {
    /// Cavity swept from the lip support up through the rim. Below the lip
    /// profile a linear transition joins the wall face to the lip start.
    fn lip_cavity(&self) -> Option<Shape> {
        let profile = self.lip.profile()?;
        let body = self.height.body;
        let mut segments = Vec::new();
        if body - self.top_z > DIMENSION_TOLERANCE {
            segments.push(InsetSegment::Linear {
                t0: self.top_z,
                t1: body,
                d0: self.wall,
                d1: profile.start_inset,
            });
        }
        segments.extend(inset_profile(&profile, body).segments().iter().cloned());
        Some(Shape::swept_z(
            outline(self.layout.outer_size),
            self.top_z,
            self.height.total + LIP_OVERSHOOT,
            InsetProfile::new(segments),
        ))
    }

    /// One void per compartment. Only corners against the outer walls are
    /// rounded; corners against dividers stay square.
    pub fn compartments(&self) -> Vec<Shape> {
        let (nx, ny) = (self.dividers.length_count, self.dividers.width_count);
        let r = self.inner_radius();
        let mut out = Vec::with_capacity(((nx + 1) * (ny + 1)) as usize);
        for iy in 0..=ny {
            for ix in 0..=nx {
                let (x0, sx) = self.compartment_span(0, ix);
                let (y0, sy) = self.compartment_span(1, iy);
                let corner = |outer: bool| if outer { r } else { 0.0 };
                let radii = [
                    corner(ix == 0 && iy == 0),
                    corner(ix == nx && iy == 0),
                    corner(ix == nx && iy == ny),
                    corner(ix == 0 && iy == ny),
                ];
                out.push(Shape::extrude_z(
                    Section::rounded_rect_corners([x0 + sx / 2.0, y0 + sy / 2.0], [sx, sy], radii),
                    self.floor_eff,
                    self.top_z,
                ));
            }
        }
        out
    }

    /// `tool` clipped to the compartment voids.
    fn inside_compartments(&self, tool: Shape) -> Shape {
        Shape::intersection(vec![tool, union_or_single(self.compartments())])
    }

    /// Hollow feet: the base profile offset inwards by one wall, from a
    /// floor one wall thick up to the compartment floor so every foot opens
    /// into the compartment above it.
    fn lite_feet(&self) -> Shape {
        let foot = self.layout.unit - GRID_CLEARANCE;
        let hollow = inset_profile(&base_profile().offset(self.wall), 0.0);
        let voids = self
            .layout
            .cells
            .iter()
            .map(|c| {
                Shape::swept_z(
                    Section::rounded_rect(c.center, [foot; 2], OUTER_RADIUS),
                    self.wall,
                    self.floor_eff,
                    hollow.clone(),
                )
            })
            .collect();
        union_or_single(voids)
    }

    /// Concave ramp at the front of every compartment row.
    fn scoops(&self, r: f64) -> Shape {
        let [il, _] = self.inner_size();
        let span = [-il / 2.0, il / 2.0];
        let z0 = self.floor_eff;
        let ramps = (0..=self.dividers.width_count)
            .map(|iy| {
                let (y0, _) = self.compartment_span(1, iy);
                Shape::difference(
                    Shape::prism(Axis::X, Section::rect([y0 + r / 2.0, z0 + r / 2.0], [r, r]), span),
                    vec![Shape::prism(Axis::X, Section::circle([y0 + r, z0 + r], r), span)],
                )
            })
            .collect();
        self.inside_compartments(union_or_single(ramps))
    }

    /// Label shelf along the back of every compartment row.
    fn label_shelves(&self, width: f64, depth: f64) -> Shape {
        let [il, _] = self.inner_size();
        let span = [-il / 2.0, il / 2.0];
        let zt = self.top_z;
        let shelves = (0..=self.dividers.width_count)
            .map(|iy| {
                let (y0, sy) = self.compartment_span(1, iy);
                let yb = y0 + sy;
                let section = Section::polygon(vec![
                    [yb, zt],
                    [yb - width, zt],
                    [yb - width, zt - LABEL_LIP],
                    [yb, zt - depth],
                ]);
                Shape::prism(Axis::X, section, span)
            })
            .collect();
        self.inside_compartments(union_or_single(shelves))
    }

    fn thumbscrew_bores(&self) -> Vec<Shape> {
        let [_, hy] = self.layout.half_extent();
        let z = self.floor_eff + THUMBSCREW_LIFT;
        self.layout
            .full_unit_columns()
            .into_iter()
            .map(|x| holes::cross_bore(Axis::Y, [x, z], THUMBSCREW_D, [-hy, -hy + 3.0 * self.wall]))
            .collect()
    }
}

fn pattern_failure(feature: &str, e: gf_ops::PatternError) -> EngineError {
    EngineError::feature(feature, OpError::Pattern(e))
}

impl Recipe for BinPlan {
    fn shell(&self) -> Shape {
        let foot = self.layout.unit - GRID_CLEARANCE;
        let base = inset_profile(&base_profile(), 0.0);
        let mut parts: Vec<Shape> = self
            .layout
            .cells
            .iter()
            .map(|c| {
                Shape::swept_z(
                    Section::rounded_rect(c.center, [foot; 2], OUTER_RADIUS),
                    0.0,
                    BASE_HEIGHT,
                    base.clone(),
                )
            })
            .collect();
        parts.push(Shape::extrude_z(
            outline(self.layout.outer_size),
            BASE_HEIGHT,
            self.height.total,
        ));
        let body = Shape::union(parts);
        match self.lip_cavity() {
            Some(cavity) => Shape::difference(body, vec![cavity]),
            None => body,
        }
    }

    fn divisions(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if !self.has_compartments() {
            debug!("solid bin, no compartments");
            return Ok(());
        }
        let voids = self.compartments();
        let n = voids.len();
        c.cut("compartments", &union_or_single(voids), n)
    }

    fn feature_cuts(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if self.lite {
            c.cut("lite-base", &self.lite_feet(), self.layout.cells.len())?;
        }
        let rows = self.dividers.width_count as usize + 1;
        if let Some(r) = self.scoop_radius {
            c.fuse("scoops", &self.scoops(r), rows)?;
        }
        if let Some(label) = self.label {
            c.fuse("labels", &self.label_shelves(label.width, label.depth), rows)?;
        }
        Ok(())
    }

    fn holes(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if let Some(spec) = &self.holes {
            let shaft = Shaft {
                diameter: BOLT_D,
                depth: BOLT_H,
            };
            let tools = self
                .layout
                .hole_centers(Some(spec))
                .into_iter()
                .map(|p| holes::build(spec, HoleFrame::up(0.0), p, Some(shaft)))
                .collect();
            c.holes("magnet-holes", tools)?;
        }
        if self.thumbscrew {
            let bores = self.thumbscrew_bores();
            let n = bores.len();
            c.cut("thumbscrew", &union_or_single(bores), n)?;
        }
        Ok(())
    }

    fn patterns(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if let Some(spec) = &self.wall_pattern {
            let tools = self
                .wall_regions(spec)
                .into_iter()
                .map(|w| pattern::pattern_tool(w.region, spec, w.axis, w.span))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| pattern_failure("wall-pattern", e))?;
            let tool = union_or_single(tools);
            let n = tool.prism_count();
            c.cut("wall-pattern", &tool, n)?;
        }
        if let Some(spec) = &self.floor_pattern {
            let tool = pattern::pattern_tool(self.floor_region(), spec, Axis::Z, [0.0, self.floor_eff])
                .map_err(|e| pattern_failure("floor-pattern", e))?;
            let n = tool.prism_count();
            c.cut("floor-pattern", &tool, n)?;
        }
        Ok(())
    }

    fn fillet_groups(&self) -> Vec<FilletGroup> {
        let Some(r) = self.fillet_radius else {
            return Vec::new();
        };
        let mut groups = vec![FilletGroup::new(
            "compartment-corners",
            EdgeSelector::PocketVerticalEdges {
                min_length: self.top_z - self.floor_eff,
            },
            r,
        )];
        // A lite bin has no floor at the compartment bottom, only the open
        // tops of its feet.
        if !self.lite {
            groups.push(FilletGroup::new("floor", EdgeSelector::FloorRing { z: self.floor_eff }, r));
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gf_kernel::{KernelIntrospect, SectionKernel};
    use gf_types::{BinSpec, Dividers, LipStyle};

    use crate::composer::{Composed, ComposerState, StageOp};

    fn compose(bin: &BinSpec) -> (SectionKernel, Composed) {
        let plan = BinPlan::derive(bin);
        let mut k = SectionKernel::new();
        let out = Composer::new(&mut k).run(&plan).unwrap();
        (k, out)
    }

    #[test]
    fn compartments_tile_the_interior() {
        let mut bin = BinSpec::new(3.0, 2.0, 3.0);
        bin.dividers = Dividers {
            length_count: 2,
            width_count: 1,
        };
        let plan = BinPlan::derive(&bin);
        assert_eq!(plan.compartments().len(), 6);
        let [sx, sy] = plan.compartment_size();
        let [il, iw] = plan.inner_size();
        assert_relative_eq!(3.0 * sx + 2.0 * DIVIDER_WALL, il, epsilon = 1e-9);
        assert_relative_eq!(2.0 * sy + DIVIDER_WALL, iw, epsilon = 1e-9);
    }

    #[test]
    fn only_outer_compartment_corners_are_rounded() {
        let mut bin = BinSpec::new(2.0, 1.0, 3.0);
        bin.dividers.length_count = 1;
        let plan = BinPlan::derive(&bin);
        let voids = plan.compartments();
        let Shape::Prism(p) = &voids[0] else {
            panic!("expected a prism");
        };
        let Section::RoundedRect { radii, .. } = &p.section else {
            panic!("expected a rounded rect");
        };
        let r = plan.inner_radius();
        assert_eq!(*radii, [r, 0.0, 0.0, r]);
    }

    #[test]
    fn lite_feet_open_into_the_compartment() {
        let bin = BinSpec {
            lite: true,
            ..BinSpec::new(1.0, 1.0, 3.0)
        };
        let plan = BinPlan::derive(&bin);
        let (k, out) = compose(&bin);
        let solid_at = |z: f64| k.contains_point(&out.solid, [0.0, 0.0, z]).unwrap();
        assert!(solid_at(plan.wall / 2.0), "foot floor");
        assert!(!solid_at((plan.wall + BASE_HEIGHT) / 2.0), "foot hollow");
        assert!(!solid_at((BASE_HEIGHT + plan.floor_z) / 2.0), "between foot and compartment");
        assert!(!solid_at(plan.floor_z + 1.0), "compartment");
        assert!(k.check_validity(&out.solid).unwrap().is_valid());
        let groups: Vec<_> = out.fillets.iter().map(|f| f.group.as_str()).collect();
        assert_eq!(groups, ["compartment-corners"]);
    }

    #[test]
    fn plain_bin_walks_every_stage() {
        let (k, out) = compose(&BinSpec::new(1.0, 1.0, 3.0));
        let stages: Vec<_> = out.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages[0], ComposerState::ShellBuilt);
        assert!(stages.contains(&ComposerState::DividersCut));
        assert!(stages.contains(&ComposerState::Filleted));
        let bb = k.bounding_box(&out.solid).unwrap();
        assert_relative_eq!(bb.max[2], 21.0, epsilon = 1e-9);
        assert_relative_eq!(bb.size()[0], 41.5, epsilon = 1e-9);
    }

    #[test]
    fn scoops_and_labels_add_material() {
        let mut bin = BinSpec::new(2.0, 1.0, 4.0);
        bin.scoops = true;
        bin.labels = true;
        let (_, out) = compose(&bin);
        for feature in ["scoops", "labels"] {
            let rec = out.stages.iter().find(|s| s.feature == feature).unwrap();
            assert_eq!(rec.op, StageOp::Fuse);
            assert!(rec.volume_after > rec.volume_before, "{feature}");
        }
    }

    #[test]
    fn lipless_bin_has_no_cavity() {
        let mut bin = BinSpec::new(1.0, 1.0, 3.0);
        bin.lip = LipStyle::None;
        let plan = BinPlan::derive(&bin);
        assert!(plan.lip_cavity().is_none());
        assert_relative_eq!(plan.top_z, plan.height.total);
    }

    #[test]
    fn magnet_holes_cut_every_corner() {
        let mut bin = BinSpec::new(2.0, 2.0, 3.0);
        bin.holes = Some(gf_types::HoleSpec::magnet());
        let (k, out) = compose(&bin);
        let rec = out.stages.iter().find(|s| s.feature == "magnet-holes").unwrap();
        assert_eq!(rec.items, 16);
        assert!(rec.removed() > 0.0);
        // Inside a recess at the first hole.
        let p = [-21.0 - HOLE_DIST, -21.0 - HOLE_DIST, 1.0];
        assert!(!k.contains_point(&out.solid, p).unwrap());
    }

    #[test]
    fn thumbscrew_bores_one_per_full_column() {
        let mut bin = BinSpec::new(3.0, 1.0, 4.0);
        bin.thumbscrew = true;
        let plan = BinPlan::derive(&bin);
        assert_eq!(plan.thumbscrew_bores().len(), 3);
    }
}
