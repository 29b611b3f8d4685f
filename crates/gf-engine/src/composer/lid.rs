//! Lid recipe: a plug that seats in the stacking lip below a flat plate,
//! hollowed from underneath.

use gf_kernel::{Axis, Section, Shape};
use gf_types::constants::*;
use gf_types::profile::{base_profile, lid_profile};
use gf_types::LidStyle;

use super::plan::LidPlan;
use super::shapes::{inset_profile, outline, union_or_single};
use super::{Composer, Recipe};
use crate::types::EngineError;

/// How far the finger slot runs out past the front face.
const SLOT_OVERSHOOT: f64 = 1.0;

impl LidPlan {
    /// Void inside the plug, from the bottom face up to the plate.
    pub fn hollow(&self) -> Shape {
        let inset = self.hollow_inset();
        let [l, w] = self.layout.outer_size;
        Shape::extrude_z(
            Section::rounded_rect(
                [0.0, 0.0],
                [l - 2.0 * inset, w - 2.0 * inset],
                (OUTER_RADIUS - inset).max(0.0),
            ),
            0.0,
            LIP_HEIGHT,
        )
    }

    /// Baseplate receptacles sunk into the slab above the plate.
    pub fn receptacles(&self) -> Vec<Shape> {
        let z0 = self.plate_top();
        let insets = inset_profile(&base_profile(), z0);
        let unit = self.layout.unit;
        self.layout
            .cells
            .iter()
            .map(|c| {
                Shape::swept_z(
                    Section::rounded_rect(c.center, [unit; 2], RECEPTACLE_RADIUS),
                    z0,
                    self.total_height(),
                    insets.clone(),
                )
            })
            .collect()
    }

    /// Stadium notch through the front of the plug, centred half a depth
    /// above the bottom face.
    pub fn finger_slot_tool(&self, width: f64, depth: f64) -> Shape {
        let [_, hy] = self.layout.half_extent();
        Shape::prism(
            Axis::Y,
            Section::rounded_rect([0.0, depth / 2.0], [width, 2.0 * depth], depth),
            [-hy - SLOT_OVERSHOOT, 0.0],
        )
    }

    pub fn label_tool(&self, width: f64, height: f64, depth: f64) -> Shape {
        let top = self.total_height();
        Shape::extrude_z(Section::rect([0.0, 0.0], [width, height]), top - depth, top)
    }
}

impl Recipe for LidPlan {
    fn shell(&self) -> Shape {
        let plug = Shape::swept_z(
            outline(self.layout.outer_size),
            0.0,
            LIP_HEIGHT,
            inset_profile(&lid_profile(), 0.0),
        );
        let plate = Shape::extrude_z(outline(self.layout.outer_size), LIP_HEIGHT, self.total_height());
        Shape::union(vec![plug, plate])
    }

    fn divisions(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        c.cut("underside", &self.hollow(), 1)
    }

    fn feature_cuts(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if self.style == LidStyle::Stackable {
            let pockets = self.receptacles();
            let n = pockets.len();
            c.cut("receptacles", &union_or_single(pockets), n)?;
        }
        if let Some([width, depth]) = self.finger_slot {
            c.cut("finger-slot", &self.finger_slot_tool(width, depth), 1)?;
        }
        if let Some([width, height, depth]) = self.label {
            c.cut("label", &self.label_tool(width, height, depth), 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gf_kernel::{KernelIntrospect, SectionKernel};
    use gf_types::LidSpec;

    use crate::composer::plan::Plan;
    use crate::composer::Composed;

    fn compose(lid: &LidSpec) -> (SectionKernel, LidPlan, Composed) {
        let plan = LidPlan::derive(lid);
        let mut k = SectionKernel::new();
        let out = Composer::new(&mut k).run(&plan).unwrap();
        (k, plan, out)
    }

    fn matches_prediction(k: &SectionKernel, plan: &LidPlan, out: &Composed) -> bool {
        let predicted = Plan::Lid(plan.clone()).predicted_bbox();
        let bb = k.bounding_box(&out.solid).unwrap();
        bb.approx_eq(&predicted, DIMENSION_TOLERANCE)
    }

    #[test]
    fn flat_lid_plug_is_hollow_with_a_front_notch() {
        let (k, plan, out) = compose(&LidSpec::new(1.0, 1.0));
        let [_, hy] = plan.layout.half_extent();
        let solid_at = |p: [f64; 3]| k.contains_point(&out.solid, p).unwrap();

        assert!(solid_at([0.0, 0.0, LIP_HEIGHT + LID_THICKNESS / 2.0]), "plate");
        assert!(!solid_at([0.0, 0.0, 2.0]), "hollow");
        assert!(solid_at([0.0, hy - 3.0, 1.0]), "back of the plug");
        assert!(!solid_at([0.0, -hy + 3.0, 1.0]), "finger slot");
        assert!(solid_at([12.0, -hy + 3.0, 1.0]), "front beside the slot");

        let features: Vec<_> = out.stages.iter().map(|s| s.feature.as_str()).collect();
        assert_eq!(features, ["shell", "underside", "finger-slot"]);
        assert!(out.stages.iter().skip(1).all(|s| s.removed() > 0.0));
        assert!(k.check_validity(&out.solid).unwrap().is_valid());
        assert!(matches_prediction(&k, &plan, &out));
    }

    #[test]
    fn plug_leaves_clearance_inside_the_lip() {
        let lid = LidSpec {
            finger_slot: false,
            ..LidSpec::new(1.0, 1.0)
        };
        let (k, plan, out) = compose(&lid);
        let [_, hy] = plan.layout.half_extent();
        // Just above the bottom face the plug starts at the lip width plus
        // the clearance.
        let z = 0.01;
        let edge = -hy + LIP_WIDTH + LID_CLEARANCE;
        assert!(!k.contains_point(&out.solid, [0.0, edge - 0.05, z]).unwrap());
        assert!(k.contains_point(&out.solid, [0.0, edge + 0.05, z]).unwrap());
    }

    #[test]
    fn stackable_lid_carries_receptacles() {
        let lid = LidSpec {
            style: LidStyle::Stackable,
            ..LidSpec::new(2.0, 1.0)
        };
        let (k, plan, out) = compose(&lid);
        let rec = out.stages.iter().find(|s| s.feature == "receptacles").unwrap();
        assert_eq!(rec.items, 2);
        assert!(rec.coplanar_offsets > 0);
        let centre = plan.layout.cells[0].center;
        let top = plan.total_height();
        assert!(!k.contains_point(&out.solid, [centre[0], centre[1], top - 0.5]).unwrap());
        assert!(k
            .contains_point(&out.solid, [centre[0], centre[1], plan.plate_top() - 0.1])
            .unwrap());
        assert!(matches_prediction(&k, &plan, &out));
    }

    #[test]
    fn single_cell_stackable_rim_drops() {
        let lid = LidSpec {
            style: LidStyle::Stackable,
            finger_slot: false,
            ..LidSpec::new(1.0, 1.0)
        };
        let (k, plan, out) = compose(&lid);
        assert!(plan.rim_top() < plan.total_height());
        assert!(matches_prediction(&k, &plan, &out));
    }

    #[test]
    fn label_recess_is_sunk_into_the_top() {
        let lid = LidSpec {
            label: true,
            ..LidSpec::new(2.0, 2.0)
        };
        let (k, plan, out) = compose(&lid);
        let top = plan.total_height();
        let rec = out.stages.iter().find(|s| s.feature == "label").unwrap();
        assert_eq!(rec.coplanar_offsets, 1);
        approx::assert_relative_eq!(
            rec.removed(),
            LID_LABEL_WIDTH * LID_LABEL_HEIGHT * LID_LABEL_DEPTH,
            epsilon = 1e-6
        );
        assert!(!k.contains_point(&out.solid, [0.0, 0.0, top - 0.2]).unwrap());
        assert!(k.contains_point(&out.solid, [0.0, 0.0, top - 0.6]).unwrap());
        assert!(matches_prediction(&k, &plan, &out));
    }
}
