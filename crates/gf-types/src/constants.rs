//! Dimensional constants shared by every component.
//!
//! Two independently built parts only mate if they agree on these values
//! exactly. Treat any edit here as a breaking change to the grid system.

// ── Grid ────────────────────────────────────────────────────────────────────

/// Planar pitch of one grid unit.
pub const GRID_UNIT: f64 = 42.0;
/// Planar pitch in half-grid mode.
pub const HALF_GRID_UNIT: f64 = 21.0;
/// Vertical pitch of one height unit.
pub const HEIGHT_UNIT: f64 = 7.0;
/// Total clearance between neighbouring components on one axis.
pub const GRID_CLEARANCE: f64 = 0.5;
/// Corner radius of component outlines.
pub const OUTER_RADIUS: f64 = 3.75;
/// Corner radius of a baseplate receptacle.
pub const RECEPTACLE_RADIUS: f64 = 4.0;

// ── Base profile ────────────────────────────────────────────────────────────

pub const BASE_CHAMFER_LOW: f64 = 0.8;
pub const BASE_VERTICAL: f64 = 1.8;
pub const BASE_CHAMFER_HIGH: f64 = 2.15;
/// Height of the base-mating profile.
pub const BASE_HEIGHT: f64 = BASE_CHAMFER_LOW + BASE_VERTICAL + BASE_CHAMFER_HIGH;
/// Horizontal depth of the base-mating profile.
pub const BASE_PROFILE_INSET: f64 = BASE_CHAMFER_LOW + BASE_CHAMFER_HIGH;
/// Floor material above the base of a bin.
pub const FLOOR_THICKNESS: f64 = 2.25;

// ── Stacking lip ────────────────────────────────────────────────────────────

pub const LIP_HEIGHT: f64 = 4.4;
pub const LIP_WIDTH: f64 = 2.6;
pub const LIP_TOP_CHAMFER: f64 = 0.7;
pub const LIP_VERTICAL: f64 = 1.8;
pub const LIP_LOW_CHAMFER: f64 = LIP_WIDTH - LIP_TOP_CHAMFER;
pub const REDUCED_LIP_HEIGHT: f64 = LIP_TOP_CHAMFER + LIP_VERTICAL;
/// Clearance between a lid plug and the lip it seats in.
pub const LID_CLEARANCE: f64 = 0.25;

// ── Walls ───────────────────────────────────────────────────────────────────

pub const WALL_THICKNESS: f64 = 1.0;
pub const MIN_WALL_THICKNESS: f64 = 0.5;
pub const MAX_WALL_THICKNESS: f64 = 2.5;
pub const LITE_MAX_WALL: f64 = 1.5;
pub const DIVIDER_WALL: f64 = 1.2;
pub const FILLET_RADIUS: f64 = 1.1;
pub const VASE_FLOOR: f64 = 0.8;

// ── Holes ───────────────────────────────────────────────────────────────────

pub const MAGNET_HOLE_D: f64 = 6.5;
pub const MAGNET_HOLE_H: f64 = 2.4;
pub const REFINED_HOLE_D: f64 = 5.86;
pub const REFINED_HOLE_H: f64 = 1.9;
pub const BOLT_D: f64 = 3.0;
pub const BOLT_H: f64 = 6.0;
/// Baseplate screw hole depth when no other feature sets the plate thickness.
pub const SCREW_HOLE_H: f64 = 4.0;
/// Offset of a hole from its cell centre along both axes.
pub const HOLE_DIST: f64 = 13.0;
/// Distance of a corners-only hole from the grid block edge.
pub const HALF_GRID_HOLE_EDGE: f64 = 8.0;
pub const HOLE_SLICE: f64 = 0.25;
pub const CRUSH_RIB_COUNT: usize = 8;
pub const CRUSH_RIB_INNER_D: f64 = 5.9;
pub const CRUSH_RIB_WIDTH: f64 = 0.6;
pub const CHAMFER_EXTRA_R: f64 = 0.8;
/// Chamfer angle from the hole axis, in degrees.
pub const CHAMFER_ANGLE: f64 = 45.0;

// ── Baseplate ───────────────────────────────────────────────────────────────

/// Plate thickness used by weighted plates and magnet + screw plates.
pub const BASEPLATE_BOTTOM_H: f64 = 6.4;
pub const WEIGHT_CUT: f64 = 21.4;
pub const WEIGHT_CUT_DEPTH: f64 = 4.0;
pub const WEIGHT_CHANNEL_W: f64 = 8.5;
pub const WEIGHT_CHANNEL_L: f64 = 8.5;
pub const WEIGHT_CHANNEL_D: f64 = 2.0;
pub const SKELETON_RIB: f64 = 11.5;
pub const SKELETON_INNER: f64 = 36.3;
pub const SKELETON_RADIUS: f64 = 2.0;
/// Material kept between a skeleton pocket and the hole above it.
pub const SKELETON_FLOOR: f64 = 1.0;
pub const SKELETON_MIN_ROOF: f64 = 3.35;
pub const CORNER_TAB: f64 = 21.0;
pub const CORNER_SCREW_MIN_DEPTH: f64 = 5.0;
pub const CSK_HOLE_D: f64 = 5.0;
pub const CSK_D: f64 = 10.0;
/// Included countersink angle, in degrees.
pub const CSK_ANGLE: f64 = 82.0;
pub const SCREW_TOGETHER_D: f64 = 3.35;
pub const SCREW_TOGETHER_SPACING: f64 = 6.0;
pub const SCREW_TOGETHER_MIN_DEPTH: f64 = 6.75;

// ── Bin features ────────────────────────────────────────────────────────────

pub const SCOOP_RADIUS: f64 = 14.0;
pub const LABEL_WIDTH: f64 = 12.0;
pub const LABEL_HEIGHT: f64 = 10.0;
pub const LABEL_LIP: f64 = 0.8;
pub const THUMBSCREW_D: f64 = 4.0;

// ── Lids ────────────────────────────────────────────────────────────────────

pub const LID_THICKNESS: f64 = 1.2;
/// Wall left around the hollow inside a lid plug.
pub const LID_WALL: f64 = 1.0;
pub const LID_FINGER_W: f64 = 16.0;
pub const LID_FINGER_D: f64 = 2.5;
pub const LID_LABEL_WIDTH: f64 = 30.0;
pub const LID_LABEL_HEIGHT: f64 = 12.0;
pub const LID_LABEL_DEPTH: f64 = 0.4;

// ── Patterns ────────────────────────────────────────────────────────────────

pub const PATTERN_CELL: f64 = 10.0;
pub const PATTERN_SPACING: f64 = 2.0;
pub const PATTERN_SIDES: u32 = 6;
pub const PATTERN_CORNER_RADIUS: f64 = 0.5;
pub const PATTERN_CORNER_INSET: f64 = 6.0;
pub const PATTERN_FLOOR_CLEARANCE: f64 = 2.0;
pub const PATTERN_LIP_CLEARANCE: f64 = 1.0;
pub const FLOOR_PATTERN_INSET: f64 = 5.0;

// ── Tolerances ──────────────────────────────────────────────────────────────

/// Offset applied to a cutting tool face that coincides with the target face.
pub const COPLANAR_EPS: f64 = 1e-5;
/// Bounding boxes must match their predicted size this closely.
pub const DIMENSION_TOLERANCE: f64 = 1e-6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_profile_dimensions() {
        assert!((BASE_HEIGHT - 4.75).abs() < 1e-12);
        assert!((BASE_PROFILE_INSET - 2.95).abs() < 1e-12);
        assert!((LIP_TOP_CHAMFER + LIP_VERTICAL + LIP_LOW_CHAMFER - LIP_HEIGHT).abs() < 1e-12);
        assert!((REDUCED_LIP_HEIGHT - 2.5).abs() < 1e-12);
    }

    #[test]
    fn skeleton_pockets_leave_the_rib() {
        let pocket = (SKELETON_INNER - SKELETON_RIB) / 2.0;
        assert!((pocket - 12.4).abs() < 1e-12);
    }
}
