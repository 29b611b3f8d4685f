//! Per-build working copies of a spec.
//!
//! A plan is derived from the caller's spec once and never written back:
//! lite overrides, the vase lip, raised floors and the automatic plate
//! thickness all live here, so the canonical spec stays untouched on every
//! exit path.

use gf_kernel::{Axis, BoundingBox};
use gf_ops::PatternRegion;
use gf_types::constants::*;
use gf_types::{
    BaseplateSpec, BinSpec, ComponentSpec, ConfigError, Dividers, HoleSpec, LidSpec, LidStyle,
    LipStyle, PatternSpec,
};

use crate::grid::{self, GridLayout};
use crate::heights::{self, ResolvedHeight};

/// Clearance kept between a scoop and the compartment top.
const SCOOP_CLEARANCE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Bin(BinPlan),
    Baseplate(BaseplatePlan),
    Lid(LidPlan),
}

impl Plan {
    pub fn derive(spec: &ComponentSpec) -> Result<Self, ConfigError> {
        match spec {
            ComponentSpec::Bin(bin) => Ok(Plan::Bin(BinPlan::derive(bin))),
            ComponentSpec::Baseplate(bp) => Ok(Plan::Baseplate(BaseplatePlan::derive(bp)?)),
            ComponentSpec::Lid(lid) => Ok(Plan::Lid(LidPlan::derive(lid))),
        }
    }

    pub fn layout(&self) -> &GridLayout {
        match self {
            Plan::Bin(p) => &p.layout,
            Plan::Baseplate(p) => &p.layout,
            Plan::Lid(p) => &p.layout,
        }
    }

    /// Bounding box the finished solid must have.
    pub fn predicted_bbox(&self) -> BoundingBox {
        let [hx, hy] = self.layout().half_extent();
        let top = match self {
            Plan::Bin(p) => p.height.total,
            Plan::Baseplate(p) => p.rim_top(),
            Plan::Lid(p) => p.rim_top(),
        };
        BoundingBox::new([-hx, -hy, 0.0], [hx, hy, top])
    }
}

/// Label shelf cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelShelf {
    pub width: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinPlan {
    pub layout: GridLayout,
    pub height: ResolvedHeight,
    pub lip: LipStyle,
    pub wall: f64,
    /// Top of the compartments: the foot of the lip support, or the rim.
    pub top_z: f64,
    /// Nominal floor.
    pub floor_z: f64,
    /// Floor after any raise from `interior_height` or a solid fill.
    pub floor_eff: f64,
    pub dividers: Dividers,
    pub scoop_radius: Option<f64>,
    pub label: Option<LabelShelf>,
    pub lite: bool,
    pub vase: bool,
    pub holes: Option<HoleSpec>,
    pub thumbscrew: bool,
    pub wall_pattern: Option<PatternSpec>,
    pub floor_pattern: Option<PatternSpec>,
    pub fillet_radius: Option<f64>,
}

impl BinPlan {
    pub fn derive(bin: &BinSpec) -> Self {
        let layout = grid::resolve_bin(bin);
        let height = heights::resolve(bin);
        let lip = heights::effective_lip(bin);
        let wall = bin.wall_thickness;

        let top_z = match lip.profile() {
            Some(p) => height.body - (p.start_inset - wall).abs(),
            None => height.total,
        };
        let floor_z = if bin.vase {
            BASE_HEIGHT + VASE_FLOOR
        } else if bin.lite {
            BASE_HEIGHT + wall
        } else {
            BASE_HEIGHT + FLOOR_THICKNESS
        };
        let floor_eff = match (bin.interior_height, bin.solid) {
            (Some(h), _) => (top_z - h).max(floor_z),
            (None, Some(ratio)) => floor_z + ratio * (top_z - floor_z),
            (None, None) => floor_z,
        };
        let open = top_z - floor_eff > DIMENSION_TOLERANCE;

        let dividers = if bin.lite {
            let forced = |count: u32, cells: usize| if count > 0 { cells.saturating_sub(1) as u32 } else { 0 };
            Dividers {
                length_count: forced(bin.dividers.length_count, layout.counts[0]),
                width_count: forced(bin.dividers.width_count, layout.counts[1]),
            }
        } else {
            bin.dividers
        };

        let depth = top_z - floor_eff;
        let scoop_radius = (bin.scoops && open)
            .then(|| (SCOOP_RADIUS * bin.scoop_scale).min(depth - SCOOP_CLEARANCE));
        let label = (bin.labels && open).then(|| LabelShelf {
            width: bin.label_width,
            depth: bin.label_height.min(depth - LABEL_LIP),
        });
        let fillet_radius =
            (bin.fillet_interior && open && !bin.vase).then(|| bin.fillet_radius());

        Self {
            layout,
            height,
            lip,
            wall,
            top_z,
            floor_z,
            floor_eff,
            dividers,
            scoop_radius,
            label,
            lite: bin.lite,
            vase: bin.vase,
            holes: bin.holes.clone(),
            thumbscrew: bin.thumbscrew,
            wall_pattern: bin.wall_pattern.clone(),
            floor_pattern: bin.floor_pattern.clone(),
            fillet_radius,
        }
    }

    /// True when anything is left to hollow out above the floor.
    pub fn has_compartments(&self) -> bool {
        self.top_z - self.floor_eff > DIMENSION_TOLERANCE
    }

    /// Interior footprint inside the walls.
    pub fn inner_size(&self) -> [f64; 2] {
        let [l, w] = self.layout.outer_size;
        [l - 2.0 * self.wall, w - 2.0 * self.wall]
    }

    pub fn inner_radius(&self) -> f64 {
        (OUTER_RADIUS - self.wall).max(0.0)
    }

    /// Compartment size along each axis once the divider walls are taken out.
    pub fn compartment_size(&self) -> [f64; 2] {
        let [il, iw] = self.inner_size();
        let split = |extent: f64, n: u32| (extent - f64::from(n) * DIVIDER_WALL) / f64::from(n + 1);
        [
            split(il, self.dividers.length_count),
            split(iw, self.dividers.width_count),
        ]
    }

    /// Lower edge of compartment `k` along an axis, and its size.
    pub fn compartment_span(&self, axis: usize, k: u32) -> (f64, f64) {
        let size = self.compartment_size()[axis];
        let lo = -self.inner_size()[axis] / 2.0 + f64::from(k) * (size + DIVIDER_WALL);
        (lo, size)
    }

    /// Depth of a hole tool measured from the bottom face.
    pub fn hole_depth(&self) -> f64 {
        match &self.holes {
            Some(h) => {
                let (_, depth) = h.effective_size();
                let slice = if h.modifiers().is_some_and(|m| m.printable_top) {
                    HOLE_SLICE
                } else {
                    0.0
                };
                (depth + slice).max(BOLT_H)
            }
            None => 0.0,
        }
    }

    /// Pattern canvases on each wall the pattern's mask enables.
    pub fn wall_regions(&self, spec: &PatternSpec) -> Vec<WallRegion> {
        let [hx, hy] = self.layout.half_extent();
        let z0 = self.floor_eff + PATTERN_FLOOR_CLEARANCE;
        let z1 = self.top_z - PATTERN_LIP_CLEARANCE;
        let depth = self.wall + WALL_CUT_DEPTH;
        let along_x = PatternRegion::from_corners([-hx + PATTERN_CORNER_INSET, z0], [hx - PATTERN_CORNER_INSET, z1]);
        let along_y = PatternRegion::from_corners([-hy + PATTERN_CORNER_INSET, z0], [hy - PATTERN_CORNER_INSET, z1]);
        let mask = spec.wall_mask();
        [
            (mask.front, Wall::Front, Axis::Y, along_x, [-hy, -hy + depth]),
            (mask.back, Wall::Back, Axis::Y, along_x, [hy - depth, hy]),
            (mask.left, Wall::Left, Axis::X, along_y, [-hx, -hx + depth]),
            (mask.right, Wall::Right, Axis::X, along_y, [hx - depth, hx]),
        ]
        .into_iter()
        .filter(|(on, ..)| *on)
        .map(|(_, wall, axis, region, span)| WallRegion {
            wall,
            axis,
            region,
            span,
        })
        .collect()
    }

    /// Floor pattern canvas, kept clear of the walls.
    pub fn floor_region(&self) -> PatternRegion {
        let [il, iw] = self.inner_size();
        PatternRegion::new(
            [0.0, 0.0],
            [il - 2.0 * FLOOR_PATTERN_INSET, iw - 2.0 * FLOOR_PATTERN_INSET],
        )
    }
}

/// How far a wall pattern reaches past the inner wall face.
const WALL_CUT_DEPTH: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Front,
    Back,
    Left,
    Right,
}

/// Pattern canvas on one wall: the region lies in the plane normal to
/// `axis` and the cutouts run through `span`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallRegion {
    pub wall: Wall,
    pub axis: Axis,
    pub region: PatternRegion,
    pub span: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseplatePlan {
    pub layout: GridLayout,
    /// Plate thickness added under the receptacles.
    pub ext_depth: f64,
    /// Receptacles sit on a solid slab instead of passing through.
    pub slab: bool,
    pub straight_bottom: bool,
    pub magnets: Option<HoleSpec>,
    /// Depth of a magnet recess including any printable bridge layer.
    pub magnet_depth: f64,
    pub screw_holes: bool,
    pub corner_screws: bool,
    pub weighted: bool,
    pub skeleton: bool,
    pub screw_together: Option<u8>,
}

impl BaseplatePlan {
    pub fn derive(bp: &BaseplateSpec) -> Result<Self, ConfigError> {
        let layout = grid::resolve_baseplate(bp)?;
        let magnet_depth = bp.holes.as_ref().map(magnet_depth).unwrap_or(0.0);
        let ext_depth = bp
            .ext_depth
            .unwrap_or_else(|| auto_ext_depth(bp, magnet_depth));
        Ok(Self {
            layout,
            ext_depth,
            slab: bp.has_bottom_features() && ext_depth > 0.0,
            straight_bottom: bp.straight_bottom,
            magnets: bp.holes.clone(),
            magnet_depth,
            screw_holes: bp.screw_holes,
            corner_screws: bp.corner_screws,
            weighted: bp.weighted,
            skeleton: bp.skeleton,
            screw_together: bp.screw_together,
        })
    }

    pub fn total_height(&self) -> f64 {
        BASE_HEIGHT + self.ext_depth
    }

    /// Highest point of the finished plate. Receptacle mouths span a full
    /// unit, so a single-cell rim loses half the clearance off its top.
    pub fn rim_top(&self) -> f64 {
        self.total_height() - self.layout.receptacle_rim_trim()
    }

    /// Height of the skeleton pockets cut up from the bottom.
    pub fn skeleton_depth(&self) -> f64 {
        self.ext_depth - SKELETON_FLOOR - self.magnet_depth
    }

    /// Top of the screw holes: the magnet recess bottom, or the slab top.
    pub fn screw_top(&self) -> f64 {
        if self.magnets.is_some() {
            self.ext_depth - self.magnet_depth
        } else {
            self.ext_depth
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LidPlan {
    pub layout: GridLayout,
    pub style: LidStyle,
    pub thickness: f64,
    /// Width and depth of the grip notch.
    pub finger_slot: Option<[f64; 2]>,
    /// Width, height and depth of the label recess.
    pub label: Option<[f64; 3]>,
}

impl LidPlan {
    pub fn derive(lid: &LidSpec) -> Self {
        Self {
            layout: grid::resolve(lid.size, false),
            style: lid.style,
            thickness: lid.thickness,
            finger_slot: lid
                .finger_slot
                .then_some([lid.finger_slot_width, lid.finger_slot_depth]),
            label: lid
                .label
                .then_some([lid.label_width, lid.label_height, lid.label_depth]),
        }
    }

    /// Top of the plate lying on the bin rim.
    pub fn plate_top(&self) -> f64 {
        LIP_HEIGHT + self.thickness
    }

    pub fn total_height(&self) -> f64 {
        match self.style {
            LidStyle::Flat => self.plate_top(),
            LidStyle::Stackable => self.plate_top() + BASE_HEIGHT,
        }
    }

    pub fn rim_top(&self) -> f64 {
        match self.style {
            LidStyle::Flat => self.total_height(),
            LidStyle::Stackable => self.total_height() - self.layout.receptacle_rim_trim(),
        }
    }

    /// Inset of the hollow inside the plug, leaving one lid wall at the
    /// plug's narrowest point.
    pub fn hollow_inset(&self) -> f64 {
        gf_types::profile::lid_profile().max_inset() + LID_WALL
    }
}

fn magnet_depth(h: &HoleSpec) -> f64 {
    let (_, depth) = h.effective_size();
    if h.modifiers().is_some_and(|m| m.printable_top) {
        depth + HOLE_SLICE
    } else {
        depth
    }
}

/// Thinnest plate that leaves material for every bottom feature.
pub fn auto_ext_depth(bp: &BaseplateSpec, magnet_depth: f64) -> f64 {
    let mut depth = if bp.weighted {
        BASEPLATE_BOTTOM_H
    } else {
        match (bp.has_magnets(), bp.screw_holes) {
            (true, true) => magnet_depth + SCREW_HOLE_H,
            (true, false) => magnet_depth,
            (false, true) => SCREW_HOLE_H,
            (false, false) => 0.0,
        }
    };
    if bp.corner_screws {
        depth = depth.max(CORNER_SCREW_MIN_DEPTH);
    }
    if bp.skeleton {
        depth = depth.max(SKELETON_FLOOR + magnet_depth + SKELETON_MIN_ROOF);
    }
    if bp.screw_together.is_some() {
        depth = depth.max(SCREW_TOGETHER_MIN_DEPTH);
    }
    depth
}
