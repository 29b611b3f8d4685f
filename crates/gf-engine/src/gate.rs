//! Compatibility gate.
//!
//! Runs before any geometry is built. Feature pairs that cannot coexist
//! are listed in static tables; single-feature checks compare the derived
//! plan against the material actually available.

use gf_ops::pattern;
use gf_types::constants::*;
use gf_types::{
    BaseplateSpec, BinSpec, ComponentSpec, ConfigDocument, ConfigError, ConfigWarning, LidSpec, LidStyle,
};
use tracing::{debug, warn};

use crate::composer::plan::{BaseplatePlan, BinPlan, LidPlan, Plan};

/// Why a configuration was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateRejection {
    #[error("'{a}' cannot be combined with '{b}'")]
    Incompatible { a: &'static str, b: &'static str },

    #[error("'{feature}' cannot be built: {reason}")]
    Unbuildable { feature: &'static str, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GateRejection {
    /// Feature the rejection is attributed to.
    pub fn feature(&self) -> Option<&str> {
        match self {
            GateRejection::Incompatible { a, .. } => Some(a),
            GateRejection::Unbuildable { feature, .. } => Some(feature),
            GateRejection::Config(ConfigError::OutOfRange { field, .. })
            | GateRejection::Config(ConfigError::Invalid { field, .. }) => Some(field),
            GateRejection::Config(_) => None,
        }
    }
}

/// An accepted configuration, ready for the composer.
#[derive(Debug, Clone, PartialEq)]
pub struct GateReport {
    pub plan: Plan,
    pub warnings: Vec<ConfigWarning>,
}

struct Pair<S> {
    a: &'static str,
    b: &'static str,
    applies: fn(&S) -> bool,
}

static BASEPLATE_PAIRS: &[Pair<BaseplateSpec>] = &[
    Pair {
        a: "weighted",
        b: "skeleton",
        applies: |s| s.weighted && s.skeleton,
    },
    Pair {
        a: "half_grid",
        b: "skeleton",
        applies: |s| s.half_grid && s.skeleton,
    },
    Pair {
        a: "half_grid",
        b: "weighted",
        applies: |s| s.half_grid && s.weighted,
    },
];

static BIN_PAIRS: &[Pair<BinSpec>] = &[
    Pair {
        a: "vase",
        b: "dividers",
        applies: |s| s.vase && s.dividers.any(),
    },
    Pair {
        a: "vase",
        b: "scoops",
        applies: |s| s.vase && s.scoops,
    },
    Pair {
        a: "vase",
        b: "labels",
        applies: |s| s.vase && s.labels,
    },
    Pair {
        a: "vase",
        b: "holes",
        applies: |s| s.vase && s.holes.is_some(),
    },
    Pair {
        a: "vase",
        b: "solid",
        applies: |s| s.vase && s.solid.is_some(),
    },
    Pair {
        a: "vase",
        b: "interior_height",
        applies: |s| s.vase && s.interior_height.is_some(),
    },
    Pair {
        a: "vase",
        b: "wall_pattern",
        applies: |s| s.vase && s.wall_pattern.is_some(),
    },
    Pair {
        a: "vase",
        b: "floor_pattern",
        applies: |s| s.vase && s.floor_pattern.is_some(),
    },
    Pair {
        a: "vase",
        b: "thumbscrew",
        applies: |s| s.vase && s.thumbscrew,
    },
    Pair {
        a: "vase",
        b: "lite",
        applies: |s| s.vase && s.lite,
    },
    Pair {
        a: "lite",
        b: "solid",
        applies: |s| s.lite && s.solid.is_some(),
    },
    Pair {
        a: "lite",
        b: "holes",
        applies: |s| s.lite && s.holes.is_some(),
    },
    Pair {
        a: "lite",
        b: "interior_height",
        applies: |s| s.lite && s.interior_height.is_some(),
    },
    Pair {
        a: "lite",
        b: "floor_pattern",
        applies: |s| s.lite && s.floor_pattern.is_some(),
    },
    Pair {
        a: "solid",
        b: "dividers",
        applies: |s| s.solid.is_some() && s.dividers.any(),
    },
    Pair {
        a: "solid",
        b: "scoops",
        applies: |s| s.solid.is_some() && s.scoops,
    },
    Pair {
        a: "solid",
        b: "labels",
        applies: |s| s.solid.is_some() && s.labels,
    },
    Pair {
        a: "solid",
        b: "wall_pattern",
        applies: |s| s.solid.is_some() && s.wall_pattern.is_some(),
    },
    Pair {
        a: "solid",
        b: "floor_pattern",
        applies: |s| s.solid.is_some() && s.floor_pattern.is_some(),
    },
    Pair {
        a: "solid",
        b: "thumbscrew",
        applies: |s| s.solid.is_some() && s.thumbscrew,
    },
    Pair {
        a: "solid",
        b: "interior_height",
        applies: |s| s.solid.is_some() && s.interior_height.is_some(),
    },
    Pair {
        a: "floor_pattern",
        b: "holes",
        applies: |s| s.floor_pattern.is_some() && s.holes.is_some(),
    },
];

static LID_PAIRS: &[Pair<LidSpec>] = &[Pair {
    a: "stackable",
    b: "label",
    applies: |s| s.style == LidStyle::Stackable && s.label,
}];

/// The incompatibility table for one component kind, as feature name pairs.
pub fn incompatible_pairs(kind: &str) -> Vec<(&'static str, &'static str)> {
    match kind {
        "bin" => BIN_PAIRS.iter().map(|p| (p.a, p.b)).collect(),
        "baseplate" => BASEPLATE_PAIRS.iter().map(|p| (p.a, p.b)).collect(),
        "lid" => LID_PAIRS.iter().map(|p| (p.a, p.b)).collect(),
        _ => Vec::new(),
    }
}

fn check_pairs<S>(pairs: &[Pair<S>], spec: &S) -> Result<(), GateRejection> {
    match pairs.iter().find(|p| (p.applies)(spec)) {
        Some(p) => Err(GateRejection::Incompatible { a: p.a, b: p.b }),
        None => Ok(()),
    }
}

fn unbuildable(feature: &'static str, reason: String) -> GateRejection {
    GateRejection::Unbuildable { feature, reason }
}

/// Validate a typed spec and derive its plan.
pub fn validate(spec: &ComponentSpec) -> Result<GateReport, GateRejection> {
    spec.validate()?;
    let plan = match spec {
        ComponentSpec::Bin(bin) => {
            check_pairs(BIN_PAIRS, bin)?;
            let plan = BinPlan::derive(bin);
            check_bin(bin, &plan)?;
            Plan::Bin(plan)
        }
        ComponentSpec::Baseplate(bp) => {
            check_pairs(BASEPLATE_PAIRS, bp)?;
            let plan = BaseplatePlan::derive(bp)?;
            check_baseplate(bp, &plan)?;
            Plan::Baseplate(plan)
        }
        ComponentSpec::Lid(lid) => {
            check_pairs(LID_PAIRS, lid)?;
            let plan = LidPlan::derive(lid);
            check_lid(&plan)?;
            Plan::Lid(plan)
        }
    };
    debug!(kind = spec.kind_name(), "configuration accepted");
    Ok(GateReport {
        plan,
        warnings: Vec::new(),
    })
}

/// Validate a loaded document, carrying its warnings along.
pub fn check(doc: &ConfigDocument) -> Result<GateReport, GateRejection> {
    for w in &doc.warnings {
        warn!(warning = %w, "configuration warning");
    }
    let mut report = validate(&doc.spec)?;
    report.warnings = doc.warnings.clone();
    Ok(report)
}

fn check_bin(bin: &BinSpec, plan: &BinPlan) -> Result<(), GateRejection> {
    if bin.lite && bin.wall_thickness > LITE_MAX_WALL {
        return Err(unbuildable(
            "lite",
            format!("wall {} mm is thicker than the {LITE_MAX_WALL} mm lite maximum", bin.wall_thickness),
        ));
    }
    let usable = plan.top_z - plan.floor_z;
    if usable < 1.0 {
        return Err(unbuildable(
            "height",
            format!("{:.2} mm body leaves {usable:.2} mm above the floor", plan.height.body),
        ));
    }
    if let Some(h) = bin.interior_height {
        if h > usable + DIMENSION_TOLERANCE {
            return Err(unbuildable(
                "interior_height",
                format!("{h} mm exceeds the {usable:.2} mm available"),
            ));
        }
    }
    if plan.dividers.any() {
        let [cl, cw] = plan.compartment_size();
        if cl.min(cw) < 2.0 {
            return Err(unbuildable(
                "dividers",
                format!("compartments would be {cl:.2} x {cw:.2} mm"),
            ));
        }
    }
    if let Some(holes) = &plan.holes {
        let depth = plan.hole_depth();
        if depth >= plan.floor_z {
            return Err(unbuildable(
                "holes",
                format!("{depth:.2} mm deep holes leave no floor under {:.2} mm", plan.floor_z),
            ));
        }
        check_hole_fit(&plan.layout, holes.effective_size().0, holes.placements.is_some())?;
    }
    if plan.thumbscrew {
        let top = plan.floor_eff + THUMBSCREW_D + 1.0;
        if top > plan.top_z {
            return Err(unbuildable(
                "thumbscrew",
                format!("bore reaches {top:.2} mm but compartments end at {:.2} mm", plan.top_z),
            ));
        }
    }
    if let Some(label) = plan.label {
        let [_, cw] = plan.compartment_size();
        if label.depth <= LABEL_LIP {
            return Err(unbuildable("labels", "compartments are too shallow for a label shelf".to_string()));
        }
        if label.width >= cw {
            return Err(unbuildable(
                "labels",
                format!("{} mm shelf does not fit a {cw:.2} mm compartment", label.width),
            ));
        }
    }
    if let Some(spec) = &plan.wall_pattern {
        for r in plan.wall_regions(spec) {
            if r.region.size[0] <= 0.0 || r.region.size[1] <= 0.0 {
                return Err(unbuildable("wall_pattern", "walls are too short for a pattern".to_string()));
            }
            pattern::cutouts(r.region, spec).map_err(|e| unbuildable("wall_pattern", e.to_string()))?;
        }
    }
    if let Some(spec) = &plan.floor_pattern {
        let region = plan.floor_region();
        if region.size[0] <= 0.0 || region.size[1] <= 0.0 {
            return Err(unbuildable("floor_pattern", "floor is too small for a pattern".to_string()));
        }
        pattern::cutouts(region, spec).map_err(|e| unbuildable("floor_pattern", e.to_string()))?;
    }
    Ok(())
}

/// Holes at the standard positions must stay inside the foot or
/// receptacle floor and must not run into each other.
fn check_hole_fit(
    layout: &crate::grid::GridLayout,
    diameter: f64,
    explicit: bool,
) -> Result<(), GateRejection> {
    if explicit {
        return Ok(());
    }
    let radius = diameter / 2.0;
    if layout.half_grid {
        let block = layout.block_size();
        let spread = block[0].min(block[1]) - 2.0 * HALF_GRID_HOLE_EDGE;
        if spread < diameter {
            return Err(unbuildable(
                "holes",
                format!("{:.1} x {:.1} mm half-grid block is too small for corner holes", block[0], block[1]),
            ));
        }
    } else {
        let floor_half = (layout.unit - GRID_CLEARANCE) / 2.0 - BASE_PROFILE_INSET;
        if HOLE_DIST + radius >= floor_half {
            return Err(unbuildable(
                "holes",
                format!("{diameter} mm holes do not fit inside the {:.2} mm cell floor", 2.0 * floor_half),
            ));
        }
    }
    Ok(())
}

fn check_baseplate(bp: &BaseplateSpec, plan: &BaseplatePlan) -> Result<(), GateRejection> {
    let ext = plan.ext_depth;
    if bp.has_bottom_features() && ext <= 0.0 {
        return Err(unbuildable("ext_depth", "bottom features need a plate under the receptacles".to_string()));
    }
    if let Some(holes) = &plan.magnets {
        if plan.magnet_depth > ext + DIMENSION_TOLERANCE {
            return Err(unbuildable(
                "holes",
                format!("{:.2} mm recesses do not fit a {ext:.2} mm plate", plan.magnet_depth),
            ));
        }
        check_hole_fit(&plan.layout, holes.effective_size().0, holes.placements.is_some())?;
    }
    if plan.screw_holes && plan.screw_top() <= DIMENSION_TOLERANCE {
        return Err(unbuildable(
            "screw_holes",
            "magnet recesses leave no material for the screw holes".to_string(),
        ));
    }
    if plan.corner_screws && ext < CORNER_SCREW_MIN_DEPTH {
        return Err(unbuildable(
            "corner_screws",
            format!("countersinks need {CORNER_SCREW_MIN_DEPTH} mm of plate, got {ext:.2}"),
        ));
    }
    if plan.weighted && ext <= WEIGHT_CUT_DEPTH {
        return Err(unbuildable(
            "weighted",
            format!("{WEIGHT_CUT_DEPTH} mm pockets would break through a {ext:.2} mm plate"),
        ));
    }
    if plan.skeleton && plan.skeleton_depth() <= 0.0 {
        return Err(unbuildable(
            "skeleton",
            format!("{ext:.2} mm plate leaves no room for skeleton pockets"),
        ));
    }
    if plan.screw_together.is_some() && ext < SCREW_TOGETHER_D + 2.0 {
        return Err(unbuildable(
            "screw_together",
            format!("{SCREW_TOGETHER_D} mm bores do not fit a {ext:.2} mm plate"),
        ));
    }
    Ok(())
}

fn check_lid(plan: &LidPlan) -> Result<(), GateRejection> {
    let [l, w] = plan.layout.outer_size;
    let flat = [l - 2.0 * OUTER_RADIUS, w - 2.0 * OUTER_RADIUS];
    if let Some([width, depth]) = plan.finger_slot {
        let reach = 1.5 * depth;
        if reach > LIP_HEIGHT {
            return Err(unbuildable(
                "finger_slot",
                format!("{depth} mm slot reaches {reach:.2} mm, above the {LIP_HEIGHT} mm plug"),
            ));
        }
        if width > flat[0] {
            return Err(unbuildable(
                "finger_slot",
                format!("{width} mm slot is wider than the {:.2} mm front edge", flat[0]),
            ));
        }
    }
    if let Some([width, height, depth]) = plan.label {
        if depth >= plan.thickness {
            return Err(unbuildable(
                "label",
                format!("{depth} mm recess breaks through a {} mm plate", plan.thickness),
            ));
        }
        if width > flat[0] || height > flat[1] {
            return Err(unbuildable(
                "label",
                format!("{width} x {height} mm recess does not fit a {:.2} x {:.2} mm top", flat[0], flat[1]),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gf_types::{Dividers, HoleSpec, PatternSpec};

    fn bin(f: impl FnOnce(&mut BinSpec)) -> ComponentSpec {
        let mut spec = BinSpec::new(2.0, 2.0, 3.0);
        f(&mut spec);
        ComponentSpec::Bin(spec)
    }

    fn baseplate(f: impl FnOnce(&mut BaseplateSpec)) -> ComponentSpec {
        let mut spec = BaseplateSpec::new(2.0, 2.0);
        f(&mut spec);
        ComponentSpec::Baseplate(spec)
    }

    fn lid(f: impl FnOnce(&mut LidSpec)) -> ComponentSpec {
        let mut spec = LidSpec::new(1.0, 1.0);
        f(&mut spec);
        ComponentSpec::Lid(spec)
    }

    #[test]
    fn plain_specs_pass() {
        assert!(validate(&bin(|_| {})).is_ok());
        assert!(validate(&baseplate(|_| {})).is_ok());
        assert!(matches!(validate(&lid(|_| {})).unwrap().plan, Plan::Lid(_)));
    }

    #[test]
    fn stackable_lid_has_no_room_for_a_label() {
        let err = validate(&lid(|l| {
            l.style = LidStyle::Stackable;
            l.label = true;
        }))
        .unwrap_err();
        assert_eq!(err, GateRejection::Incompatible { a: "stackable", b: "label" });
    }

    #[test]
    fn lid_features_must_fit_the_plate() {
        let deep_label = validate(&lid(|l| {
            l.label = true;
            l.label_depth = 1.5;
        }))
        .unwrap_err();
        assert_eq!(deep_label.feature(), Some("label"));

        let tall_slot = validate(&lid(|l| l.finger_slot_depth = 3.5)).unwrap_err();
        assert_eq!(tall_slot.feature(), Some("finger_slot"));

        let wide_slot = validate(&lid(|l| l.finger_slot_width = 40.0)).unwrap_err();
        assert_eq!(wide_slot.feature(), Some("finger_slot"));

        // The same slot fits a wider lid.
        assert!(validate(&lid(|l| {
            l.size = gf_types::GridSize::new(2.0, 1.0);
            l.finger_slot_width = 40.0;
        }))
        .is_ok());
    }

    #[test]
    fn weighted_and_skeleton_are_rejected() {
        let err = validate(&baseplate(|b| {
            b.weighted = true;
            b.skeleton = true;
        }))
        .unwrap_err();
        assert_eq!(
            err,
            GateRejection::Incompatible {
                a: "weighted",
                b: "skeleton"
            }
        );
    }

    #[test]
    fn vase_rejects_interior_features() {
        let err = validate(&bin(|b| {
            b.vase = true;
            b.scoops = true;
        }))
        .unwrap_err();
        assert_eq!(err.feature(), Some("vase"));
    }

    #[test]
    fn lite_rejects_thick_walls_and_holes() {
        assert!(matches!(
            validate(&bin(|b| {
                b.lite = true;
                b.wall_thickness = 2.0;
            })),
            Err(GateRejection::Unbuildable { feature: "lite", .. })
        ));
        assert!(matches!(
            validate(&bin(|b| {
                b.lite = true;
                b.holes = Some(HoleSpec::magnet());
            })),
            Err(GateRejection::Incompatible { a: "lite", b: "holes" })
        ));
    }

    #[test]
    fn too_many_dividers() {
        let err = validate(&bin(|b| {
            b.dividers = Dividers {
                length_count: 30,
                width_count: 0,
            };
        }))
        .unwrap_err();
        assert_eq!(err.feature(), Some("dividers"));
    }

    #[test]
    fn deep_bin_holes_are_rejected() {
        let err = validate(&bin(|b| {
            b.holes = Some(HoleSpec {
                depth: 7.5,
                ..HoleSpec::magnet()
            });
        }))
        .unwrap_err();
        assert_eq!(err.feature(), Some("holes"));
    }

    #[test]
    fn short_bin_is_rejected() {
        let err = validate(&bin(|b| b.height = gf_types::HeightSpec::units(1.0))).unwrap_err();
        assert_eq!(err.feature(), Some("height"));
    }

    #[test]
    fn thin_plate_with_magnets_is_rejected() {
        let err = validate(&baseplate(|b| {
            b.holes = Some(HoleSpec::magnet());
            b.ext_depth = Some(1.0);
        }))
        .unwrap_err();
        assert_eq!(err.feature(), Some("holes"));
    }

    #[test]
    fn oversized_wall_pattern_cell_is_rejected() {
        let spec = PatternSpec {
            cell: 40.0,
            ..PatternSpec::default()
        };
        let err = validate(&bin(|b| b.wall_pattern = Some(spec))).unwrap_err();
        assert_eq!(err.feature(), Some("wall_pattern"));
    }

    #[test]
    fn default_wall_pattern_fits_a_tall_bin() {
        let spec = bin(|b| {
            b.height = gf_types::HeightSpec::units(6.0);
            b.wall_pattern = Some(PatternSpec::default());
        });
        assert!(validate(&spec).is_ok());
    }

    #[test]
    fn size_and_drawer_fit_together_fail_as_config() {
        let err = validate(&baseplate(|b| {
            b.drawer_fit = Some(gf_types::DrawerFit {
                target: [300.0, 200.0],
                alignment: [0.0, 0.0],
            });
        }))
        .unwrap_err();
        assert!(matches!(err, GateRejection::Config(_)));
    }

    #[test]
    fn table_is_exposed_per_kind() {
        assert!(incompatible_pairs("baseplate").contains(&("weighted", "skeleton")));
        assert!(incompatible_pairs("bin").contains(&("lite", "solid")));
        assert_eq!(incompatible_pairs("lid"), [("stackable", "label")]);
        assert!(incompatible_pairs("drawer").is_empty());
    }

    #[test]
    fn document_warnings_are_carried() {
        let doc = ConfigDocument::from_json_str(r#"{"kind": "bin", "size": {"length_u": 1, "width_u": 1}, "scoop": true}"#)
            .unwrap();
        let report = check(&doc).unwrap();
        assert_eq!(report.warnings.len(), 1);
    }
}
