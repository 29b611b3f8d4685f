//! Baseplate recipe.

use gf_kernel::{Axis, EdgeSelector, Section, Shape};
use gf_ops::fillet::FilletGroup;
use gf_ops::holes::{self, HoleFrame};
use gf_ops::pattern::{self, PatternError, PatternRegion};
use gf_ops::OpError;
use gf_types::constants::*;
use gf_types::profile::{base_profile, straight_base_profile};

use super::plan::BaseplatePlan;
use super::shapes::{inset_profile, outline, square_prism, union_or_single};
use super::{Composer, Recipe};
use crate::types::EngineError;

/// Side of one skeleton pocket.
const SKELETON_POCKET: f64 = (SKELETON_INNER - SKELETON_RIB) / 2.0;

impl BaseplatePlan {
    fn corner_tabs_fused(&self) -> bool {
        self.corner_screws && !self.slab
    }

    pub fn receptacles(&self) -> Vec<Shape> {
        let profile = if self.straight_bottom {
            straight_base_profile()
        } else {
            base_profile()
        };
        let (z0, insets) = if self.slab {
            (self.ext_depth, inset_profile(&profile, self.ext_depth))
        } else {
            (0.0, inset_profile(&profile.extended_below(self.ext_depth), 0.0))
        };
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

    /// Bosses under the four outer corners for the countersunk screws. The
    /// corner facing outwards follows the plate outline.
    fn corner_tabs(&self) -> Vec<Shape> {
        self.layout
            .corner_points(CORNER_TAB)
            .into_iter()
            .enumerate()
            .map(|(k, p)| {
                let mut radii = [0.0; 4];
                radii[k] = OUTER_RADIUS;
                Shape::extrude_z(
                    Section::rounded_rect_corners(p, [CORNER_TAB; 2], radii),
                    0.0,
                    self.ext_depth,
                )
            })
            .collect()
    }

    /// Central weight pocket plus a channel out to each side.
    fn weight_pockets(&self) -> Vec<Shape> {
        let channel = WEIGHT_CUT + 2.0 * WEIGHT_CHANNEL_L;
        self.layout
            .cells
            .iter()
            .flat_map(|c| {
                [
                    square_prism(c.center, WEIGHT_CUT, 0.0, WEIGHT_CUT_DEPTH),
                    Shape::extrude_z(
                        Section::rect(c.center, [channel, WEIGHT_CHANNEL_W]),
                        0.0,
                        WEIGHT_CHANNEL_D,
                    ),
                    Shape::extrude_z(
                        Section::rect(c.center, [WEIGHT_CHANNEL_W, channel]),
                        0.0,
                        WEIGHT_CHANNEL_D,
                    ),
                ]
            })
            .collect()
    }

    fn skeleton_sections(&self, center: [f64; 2]) -> Vec<Section> {
        let d = (SKELETON_RIB + SKELETON_POCKET) / 2.0;
        [[-d, -d], [d, -d], [d, d], [-d, d]]
            .into_iter()
            .map(|[dx, dy]| {
                Section::rounded_rect(
                    [center[0] + dx, center[1] + dy],
                    [SKELETON_POCKET; 2],
                    SKELETON_RADIUS,
                )
            })
            .collect()
    }

    fn skeleton_pockets(&self) -> Result<Vec<Shape>, PatternError> {
        let unit = self.layout.unit;
        let mut out = Vec::new();
        for c in &self.layout.cells {
            let sections = self.skeleton_sections(c.center);
            let region = PatternRegion::new(c.center, [unit, unit]);
            if pattern::residual_area(&region, &sections) <= 0.0 {
                return Err(PatternError::FullCoverage {
                    width: unit,
                    height: unit,
                });
            }
            out.extend(
                sections
                    .into_iter()
                    .map(|s| Shape::extrude_z(s, 0.0, self.skeleton_depth())),
            );
        }
        Ok(out)
    }

    /// Bores through the plate edges for joining neighbouring plates: one
    /// set per row along X and one per column along Y.
    fn joining_bores(&self, per_edge: u8) -> Vec<Shape> {
        let [hx, hy] = self.layout.half_extent();
        let z = self.ext_depth / 2.0;
        let n = f64::from(per_edge);
        let offsets: Vec<f64> = (0..per_edge)
            .map(|k| (f64::from(k) - (n - 1.0) / 2.0) * SCREW_TOGETHER_SPACING)
            .collect();
        let along_x = self.layout.rows().into_iter().flat_map(|y| {
            offsets
                .iter()
                .map(move |o| holes::cross_bore(Axis::X, [y + o, z], SCREW_TOGETHER_D, [-hx, hx]))
        });
        let along_y = self.layout.columns().into_iter().flat_map(|x| {
            offsets
                .iter()
                .map(move |o| holes::cross_bore(Axis::Y, [x + o, z], SCREW_TOGETHER_D, [-hy, hy]))
        });
        along_x.chain(along_y).collect()
    }
}

impl Recipe for BaseplatePlan {
    fn shell(&self) -> Shape {
        Shape::extrude_z(outline(self.layout.outer_size), 0.0, self.total_height())
    }

    fn divisions(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        let receptacles = self.receptacles();
        let n = receptacles.len();
        c.cut("receptacles", &union_or_single(receptacles), n)
    }

    fn feature_cuts(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if self.corner_tabs_fused() {
            c.fuse("corner-tabs", &Shape::union(self.corner_tabs()), 4)?;
        }
        if self.weighted {
            let pockets = self.weight_pockets();
            c.cut("weight-pockets", &Shape::union(pockets), self.layout.cells.len())?;
        }
        if self.skeleton {
            let pockets = self
                .skeleton_pockets()
                .map_err(|e| EngineError::feature("skeleton", OpError::Pattern(e)))?;
            let n = pockets.len();
            c.cut("skeleton", &union_or_single(pockets), n)?;
        }
        Ok(())
    }

    fn holes(&self, c: &mut Composer<'_>) -> Result<(), EngineError> {
        if let Some(spec) = &self.magnets {
            let tools = self
                .layout
                .hole_centers(Some(spec))
                .into_iter()
                .map(|p| holes::build(spec, HoleFrame::down(self.ext_depth), p, None))
                .collect();
            c.holes("magnet-holes", tools)?;
        }
        if self.screw_holes {
            let top = self.screw_top();
            let bores: Vec<Shape> = self
                .layout
                .hole_centers(self.magnets.as_ref())
                .into_iter()
                .map(|p| holes::through_hole(HoleFrame::up(0.0), p, BOLT_D, top))
                .collect();
            let n = bores.len();
            c.cut("screw-holes", &union_or_single(bores), n)?;
        }
        if self.corner_screws {
            let sinks: Vec<Shape> = self
                .layout
                .corner_points(CORNER_TAB)
                .into_iter()
                .map(|p| {
                    holes::countersink(
                        HoleFrame::down(self.ext_depth),
                        p,
                        CSK_HOLE_D,
                        CSK_D,
                        CSK_ANGLE,
                        self.ext_depth,
                    )
                })
                .collect();
            c.cut("corner-screws", &Shape::union(sinks), 4)?;
        }
        if let Some(per_edge) = self.screw_together {
            let bores = self.joining_bores(per_edge);
            let n = bores.len();
            c.cut("screw-together", &union_or_single(bores), n)?;
        }
        Ok(())
    }

    fn fillet_groups(&self) -> Vec<FilletGroup> {
        if !self.corner_tabs_fused() {
            return Vec::new();
        }
        vec![FilletGroup::new(
            "corner-tabs",
            EdgeSelector::BossVerticalEdges {
                height: self.ext_depth,
            },
            RECEPTACLE_RADIUS,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gf_kernel::{KernelIntrospect, SectionKernel};
    use gf_types::{BaseplateSpec, HoleSpec};

    use crate::composer::StageOp;

    fn plan(bp: &BaseplateSpec) -> BaseplatePlan {
        BaseplatePlan::derive(bp).unwrap()
    }

    #[test]
    fn plain_plate_passes_through() {
        let p = plan(&BaseplateSpec::new(2.0, 2.0));
        assert!(!p.slab);
        assert_relative_eq!(p.total_height(), BASE_HEIGHT);
        let mut k = SectionKernel::new();
        let out = Composer::new(&mut k).run(&p).unwrap();
        let rec = &out.stages[1];
        assert_eq!(rec.feature, "receptacles");
        assert!(rec.coplanar_offsets > 0);
        // Open all the way down at a cell centre.
        assert!(!k.contains_point(&out.solid, [21.0, 21.0, 0.1]).unwrap());
    }

    #[test]
    fn magnet_plate_keeps_a_slab() {
        let mut bp = BaseplateSpec::new(4.0, 3.0);
        bp.holes = Some(HoleSpec::magnet());
        let p = plan(&bp);
        assert!(p.slab);
        assert_relative_eq!(p.ext_depth, MAGNET_HOLE_H);
        let mut k = SectionKernel::new();
        let out = Composer::new(&mut k).run(&p).unwrap();
        let rec = out.stages.iter().find(|s| s.feature == "magnet-holes").unwrap();
        assert_eq!(rec.items, 48);
        let recess = std::f64::consts::PI * (MAGNET_HOLE_D / 2.0).powi(2) * MAGNET_HOLE_H;
        assert_relative_eq!(rec.removed(), 48.0 * recess, max_relative = 1e-4);
    }

    #[test]
    fn skeleton_pockets_leave_ribs() {
        let mut bp = BaseplateSpec::new(1.0, 1.0);
        bp.skeleton = true;
        let p = plan(&bp);
        let sections = p.skeleton_sections([0.0, 0.0]);
        assert_eq!(sections.len(), 4);
        let region = PatternRegion::new([0.0, 0.0], [GRID_UNIT, GRID_UNIT]);
        assert!(pattern::residual_area(&region, &sections) > 0.0);
        assert_eq!(p.skeleton_pockets().unwrap().len(), 4);
    }

    #[test]
    fn corner_tabs_get_filleted() {
        let mut bp = BaseplateSpec::new(2.0, 2.0);
        bp.corner_screws = true;
        bp.ext_depth = Some(CORNER_SCREW_MIN_DEPTH);
        let p = plan(&bp);
        assert!(p.corner_tabs_fused());
        let mut k = SectionKernel::new();
        let out = Composer::new(&mut k).run(&p).unwrap();
        let tabs = out.stages.iter().find(|s| s.feature == "corner-tabs").unwrap();
        assert_eq!(tabs.op, StageOp::Fuse);
        assert_eq!(out.fillets.len(), 1);
        assert!(out.stages.iter().any(|s| s.feature == "corner-screws"));
    }

    #[test]
    fn joining_bores_per_row_and_column() {
        let mut bp = BaseplateSpec::new(3.0, 2.0);
        bp.screw_together = Some(2);
        let p = plan(&bp);
        assert_eq!(p.joining_bores(2).len(), 2 * (2 + 3));
    }
}
