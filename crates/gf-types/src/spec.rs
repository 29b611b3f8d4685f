use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::*;
use crate::profile::{lip_profile, reduced_lip_profile, Profile};

/// A component to build. Tagged by `"kind"` in configuration documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentSpec {
    Baseplate(BaseplateSpec),
    Bin(BinSpec),
    Lid(LidSpec),
}

impl ComponentSpec {
    /// Check every numeric field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ComponentSpec::Baseplate(bp) => bp.validate(),
            ComponentSpec::Bin(bin) => bin.validate(),
            ComponentSpec::Lid(lid) => lid.validate(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ComponentSpec::Baseplate(_) => "baseplate",
            ComponentSpec::Bin(_) => "bin",
            ComponentSpec::Lid(_) => "lid",
        }
    }
}

/// Grid footprint in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSize {
    pub length_u: f64,
    pub width_u: f64,
}

impl GridSize {
    pub const fn new(length_u: f64, width_u: f64) -> Self {
        Self { length_u, width_u }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.length_u, self.width_u]
    }

    fn validate(&self, half_grid: bool) -> Result<(), ConfigError> {
        let step = if half_grid { 0.5 } else { 1.0 };
        for (field, value) in [("size.length_u", self.length_u), ("size.width_u", self.width_u)] {
            check_range(field, value, step, 64.0)?;
            let steps = value / step;
            if (steps - steps.round()).abs() > 1e-9 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: format!("{value} is not a multiple of {step} grid units"),
                });
            }
        }
        Ok(())
    }
}

// ── Baseplate ───────────────────────────────────────────────────────────────

/// Fit a baseplate to a drawer instead of an integral grid size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawerFit {
    /// Drawer interior in millimetres, X then Y.
    pub target: [f64; 2],
    /// Placement of the grid block inside the padding: -1 flush negative,
    /// 0 centred, +1 flush positive.
    #[serde(default)]
    pub alignment: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseplateSpec {
    /// Exactly one of `size` and `drawer_fit` is set.
    pub size: Option<GridSize>,
    pub drawer_fit: Option<DrawerFit>,
    pub half_grid: bool,
    /// Extra plate thickness under the receptacles. Derived from the
    /// bottom features when unset.
    pub ext_depth: Option<f64>,
    pub straight_bottom: bool,
    /// Magnet recesses opening into each receptacle floor.
    pub holes: Option<HoleSpec>,
    pub screw_holes: bool,
    pub corner_screws: bool,
    pub weighted: bool,
    pub skeleton: bool,
    /// Horizontal screw bores per cell edge (1 to 3).
    pub screw_together: Option<u8>,
}

impl Default for BaseplateSpec {
    fn default() -> Self {
        Self {
            size: None,
            drawer_fit: None,
            half_grid: false,
            ext_depth: None,
            straight_bottom: false,
            holes: None,
            screw_holes: false,
            corner_screws: false,
            weighted: false,
            skeleton: false,
            screw_together: None,
        }
    }
}

impl BaseplateSpec {
    pub fn new(length_u: f64, width_u: f64) -> Self {
        Self {
            size: Some(GridSize::new(length_u, width_u)),
            ..Self::default()
        }
    }

    pub fn fit_to_drawer(target: [f64; 2], alignment: [f64; 2]) -> Self {
        Self {
            drawer_fit: Some(DrawerFit { target, alignment }),
            ..Self::default()
        }
    }

    pub fn unit(&self) -> f64 {
        if self.half_grid {
            HALF_GRID_UNIT
        } else {
            GRID_UNIT
        }
    }

    pub fn has_magnets(&self) -> bool {
        self.holes.is_some()
    }

    /// Any feature cut into the plate underneath the receptacles.
    pub fn has_bottom_features(&self) -> bool {
        self.holes.is_some()
            || self.screw_holes
            || self.weighted
            || self.skeleton
            || self.screw_together.is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.size, &self.drawer_fit) {
            (Some(size), None) => size.validate(self.half_grid)?,
            (None, Some(fit)) => {
                for (i, d) in fit.target.iter().enumerate() {
                    check_range(&format!("drawer_fit.target[{i}]"), *d, self.unit() / 2.0, 2000.0)?;
                }
                for (i, a) in fit.alignment.iter().enumerate() {
                    check_range(&format!("drawer_fit.alignment[{i}]"), *a, -1.0, 1.0)?;
                }
            }
            (None, None) => {
                return Err(ConfigError::Invalid {
                    field: "size".to_string(),
                    reason: "a baseplate needs either a grid size or a drawer fit".to_string(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid {
                    field: "size".to_string(),
                    reason: "grid size and drawer fit are mutually exclusive".to_string(),
                })
            }
        }
        if let Some(d) = self.ext_depth {
            check_range("ext_depth", d, 0.0, 20.0)?;
        }
        if let Some(holes) = &self.holes {
            holes.validate("holes")?;
        }
        if let Some(n) = self.screw_together {
            check_range("screw_together", f64::from(n), 1.0, 3.0)?;
        }
        Ok(())
    }
}

// ── Bin ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LipStyle {
    #[default]
    Normal,
    Reduced,
    None,
}

impl LipStyle {
    pub fn height(self) -> f64 {
        match self {
            LipStyle::Normal => LIP_HEIGHT,
            LipStyle::Reduced => REDUCED_LIP_HEIGHT,
            LipStyle::None => 0.0,
        }
    }

    /// Cavity profile of the lip; `None` when the bin has straight walls.
    pub fn profile(self) -> Option<Profile> {
        match self {
            LipStyle::Normal => Some(lip_profile()),
            LipStyle::Reduced => Some(reduced_lip_profile()),
            LipStyle::None => None,
        }
    }
}

/// How `HeightSpec::value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightMode {
    /// Multiples of 7 mm, lip included.
    #[default]
    Units,
    /// Usable depth above the floor, excluding base and lip.
    InternalMm,
    /// Outside height, excluding the lip.
    ExternalMm,
    /// Outside height, lip included.
    ExternalWithLipMm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightSpec {
    pub mode: HeightMode,
    pub value: f64,
    /// Round the resolved height up to the next multiple of 7 mm.
    pub z_snap: bool,
}

impl Default for HeightSpec {
    fn default() -> Self {
        Self::units(3.0)
    }
}

impl HeightSpec {
    pub fn units(u: f64) -> Self {
        Self {
            mode: HeightMode::Units,
            value: u,
            z_snap: false,
        }
    }

    pub fn mm(mode: HeightMode, value: f64) -> Self {
        Self {
            mode,
            value,
            z_snap: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dividers {
    /// Walls splitting the length (X) axis.
    pub length_count: u32,
    /// Walls splitting the width (Y) axis.
    pub width_count: u32,
}

impl Dividers {
    pub fn any(&self) -> bool {
        self.length_count > 0 || self.width_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinSpec {
    pub size: GridSize,
    pub height: HeightSpec,
    pub half_grid: bool,
    pub wall_thickness: f64,
    pub lip: LipStyle,
    pub dividers: Dividers,
    pub scoops: bool,
    /// Scoop radius as a fraction of the full radius.
    pub scoop_scale: f64,
    pub labels: bool,
    pub label_width: f64,
    pub label_height: f64,
    /// Fixed usable depth; the floor is raised to match.
    pub interior_height: Option<f64>,
    /// Fill ratio of the interior below the lip.
    pub solid: Option<f64>,
    pub lite: bool,
    pub vase: bool,
    pub holes: Option<HoleSpec>,
    pub thumbscrew: bool,
    pub wall_pattern: Option<PatternSpec>,
    pub floor_pattern: Option<PatternSpec>,
    pub fillet_interior: bool,
    pub fillet_radius: Option<f64>,
}

impl Default for BinSpec {
    fn default() -> Self {
        Self {
            size: GridSize::new(1.0, 1.0),
            height: HeightSpec::default(),
            half_grid: false,
            wall_thickness: WALL_THICKNESS,
            lip: LipStyle::Normal,
            dividers: Dividers::default(),
            scoops: false,
            scoop_scale: 1.0,
            labels: false,
            label_width: LABEL_WIDTH,
            label_height: LABEL_HEIGHT,
            interior_height: None,
            solid: None,
            lite: false,
            vase: false,
            holes: None,
            thumbscrew: false,
            wall_pattern: None,
            floor_pattern: None,
            fillet_interior: true,
            fillet_radius: None,
        }
    }
}

impl BinSpec {
    pub fn new(length_u: f64, width_u: f64, height_u: f64) -> Self {
        Self {
            size: GridSize::new(length_u, width_u),
            height: HeightSpec::units(height_u),
            ..Self::default()
        }
    }

    pub fn unit(&self) -> f64 {
        if self.half_grid {
            HALF_GRID_UNIT
        } else {
            GRID_UNIT
        }
    }

    pub fn fillet_radius(&self) -> f64 {
        self.fillet_radius.unwrap_or(FILLET_RADIUS)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.size.validate(self.half_grid)?;
        let (lo, hi) = match self.height.mode {
            HeightMode::Units => (0.5, 40.0),
            _ => (1.0, 300.0),
        };
        check_range("height.value", self.height.value, lo, hi)?;
        check_range(
            "wall_thickness",
            self.wall_thickness,
            MIN_WALL_THICKNESS,
            MAX_WALL_THICKNESS,
        )?;
        check_range("dividers.length_count", f64::from(self.dividers.length_count), 0.0, 32.0)?;
        check_range("dividers.width_count", f64::from(self.dividers.width_count), 0.0, 32.0)?;
        check_range_open_low("scoop_scale", self.scoop_scale, 0.0, 1.0)?;
        check_range_open_low("label_width", self.label_width, 0.0, 30.0)?;
        check_range_open_low("label_height", self.label_height, 0.0, 30.0)?;
        if let Some(h) = self.interior_height {
            check_range_open_low("interior_height", h, 0.0, 300.0)?;
        }
        if let Some(r) = self.solid {
            check_range_open_low("solid", r, 0.0, 1.0)?;
        }
        if let Some(r) = self.fillet_radius {
            check_range_open_low("fillet_radius", r, 0.0, 5.0)?;
        }
        if let Some(holes) = &self.holes {
            holes.validate("holes")?;
        }
        if let Some(p) = &self.wall_pattern {
            p.validate("wall_pattern")?;
        }
        if let Some(p) = &self.floor_pattern {
            p.validate("floor_pattern")?;
        }
        Ok(())
    }
}

// ── Lid ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LidStyle {
    #[default]
    Flat,
    /// Baseplate receptacles on top so bins can stand on the lid.
    Stackable,
}

impl LidStyle {
    pub fn name(self) -> &'static str {
        match self {
            LidStyle::Flat => "flat",
            LidStyle::Stackable => "stackable",
        }
    }
}

/// Cover that seats in the stacking lip of a bin of the same footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidSpec {
    pub size: GridSize,
    pub style: LidStyle,
    /// Plate thickness above the lip plug.
    pub thickness: f64,
    /// Grip notch in the front of the plug.
    pub finger_slot: bool,
    pub finger_slot_width: f64,
    pub finger_slot_depth: f64,
    /// Recessed label area in the middle of the top face.
    pub label: bool,
    pub label_width: f64,
    pub label_height: f64,
    pub label_depth: f64,
}

impl Default for LidSpec {
    fn default() -> Self {
        Self {
            size: GridSize::new(1.0, 1.0),
            style: LidStyle::Flat,
            thickness: LID_THICKNESS,
            finger_slot: true,
            finger_slot_width: LID_FINGER_W,
            finger_slot_depth: LID_FINGER_D,
            label: false,
            label_width: LID_LABEL_WIDTH,
            label_height: LID_LABEL_HEIGHT,
            label_depth: LID_LABEL_DEPTH,
        }
    }
}

impl LidSpec {
    pub fn new(length_u: f64, width_u: f64) -> Self {
        Self {
            size: GridSize::new(length_u, width_u),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.size.validate(false)?;
        check_range("thickness", self.thickness, 0.4, 10.0)?;
        check_range_open_low("finger_slot_width", self.finger_slot_width, 0.0, 100.0)?;
        check_range_open_low("finger_slot_depth", self.finger_slot_depth, 0.0, 10.0)?;
        check_range_open_low("label_width", self.label_width, 0.0, 200.0)?;
        check_range_open_low("label_height", self.label_height, 0.0, 200.0)?;
        check_range_open_low("label_depth", self.label_depth, 0.0, 5.0)?;
        Ok(())
    }
}

// ── Holes ───────────────────────────────────────────────────────────────────

/// Named hole variants, used for reporting and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleKind {
    Standard,
    CrushRib,
    Chamfered,
    Refined,
    PrintableTop,
}

impl HoleKind {
    pub fn tag(self) -> &'static str {
        match self {
            HoleKind::Standard => "std",
            HoleKind::CrushRib => "cr",
            HoleKind::Chamfered => "ch",
            HoleKind::Refined => "rf",
            HoleKind::PrintableTop => "pt",
        }
    }
}

/// Independent features layered onto an enhanced hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleModifiers {
    pub crush_ribs: bool,
    pub chamfer: bool,
    pub refined: bool,
    pub printable_top: bool,
}

impl HoleModifiers {
    pub fn any(&self) -> bool {
        self.crush_ribs || self.chamfer || self.refined || self.printable_top
    }
}

/// Construction strategy for a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleStyle {
    /// Native counterbore.
    #[default]
    Standard,
    /// Boolean subtraction of a constructed tool.
    Enhanced(HoleModifiers),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleSpec {
    pub style: HoleStyle,
    pub diameter: f64,
    pub depth: f64,
    /// Offsets from each cell centre. `None` selects the standard corner
    /// placement.
    pub placements: Option<Vec<[f64; 2]>>,
}

impl Default for HoleSpec {
    fn default() -> Self {
        Self::magnet()
    }
}

impl HoleSpec {
    pub fn magnet() -> Self {
        Self {
            style: HoleStyle::Standard,
            diameter: MAGNET_HOLE_D,
            depth: MAGNET_HOLE_H,
            placements: None,
        }
    }

    pub fn enhanced(modifiers: HoleModifiers) -> Self {
        Self {
            style: HoleStyle::Enhanced(modifiers),
            ..Self::magnet()
        }
    }

    pub fn modifiers(&self) -> Option<HoleModifiers> {
        match self.style {
            HoleStyle::Standard => None,
            HoleStyle::Enhanced(m) => Some(m),
        }
    }

    /// Diameter and depth after the refined modifier is taken into account.
    pub fn effective_size(&self) -> (f64, f64) {
        match self.style {
            HoleStyle::Enhanced(m) if m.refined => (REFINED_HOLE_D, REFINED_HOLE_H),
            _ => (self.diameter, self.depth),
        }
    }

    pub fn kinds(&self) -> Vec<HoleKind> {
        match self.style {
            HoleStyle::Standard => vec![HoleKind::Standard],
            HoleStyle::Enhanced(m) => {
                let mut kinds = Vec::new();
                if m.crush_ribs {
                    kinds.push(HoleKind::CrushRib);
                }
                if m.chamfer {
                    kinds.push(HoleKind::Chamfered);
                }
                if m.refined {
                    kinds.push(HoleKind::Refined);
                }
                if m.printable_top {
                    kinds.push(HoleKind::PrintableTop);
                }
                kinds
            }
        }
    }

    fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        check_range_open_low(&format!("{prefix}.diameter"), self.diameter, 0.0, 20.0)?;
        check_range_open_low(&format!("{prefix}.depth"), self.depth, 0.0, 20.0)?;
        if let HoleStyle::Enhanced(m) = self.style {
            if !m.any() {
                return Err(ConfigError::Invalid {
                    field: format!("{prefix}.style"),
                    reason: "an enhanced hole needs at least one modifier".to_string(),
                });
            }
            if m.crush_ribs && self.effective_size().0 <= CRUSH_RIB_INNER_D {
                return Err(ConfigError::Invalid {
                    field: format!("{prefix}.diameter"),
                    reason: format!("crush ribs need a hole wider than {CRUSH_RIB_INNER_D} mm"),
                });
            }
        }
        if let Some(placements) = &self.placements {
            if placements.is_empty() {
                return Err(ConfigError::Invalid {
                    field: format!("{prefix}.placements"),
                    reason: "placement list is empty".to_string(),
                });
            }
            for (i, p) in placements.iter().enumerate() {
                for (axis, v) in p.iter().enumerate() {
                    check_range(&format!("{prefix}.placements[{i}][{axis}]"), *v, -21.0, 21.0)?;
                }
            }
        }
        Ok(())
    }
}

// ── Patterns ────────────────────────────────────────────────────────────────

/// Per-axis leftover-space policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisFill {
    /// Fill from the region edge and clip what overhangs.
    None,
    /// Keep only shapes that fit entirely, centred.
    Crop,
    /// Stretch the spacing so the shapes span the region exactly.
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    None,
    #[default]
    Crop,
    Space,
    CropX,
    CropY,
    SpaceX,
    SpaceY,
    CropXSpaceY,
    SpaceXCropY,
}

impl FillMode {
    pub const ALL: [FillMode; 9] = [
        FillMode::None,
        FillMode::Crop,
        FillMode::Space,
        FillMode::CropX,
        FillMode::CropY,
        FillMode::SpaceX,
        FillMode::SpaceY,
        FillMode::CropXSpaceY,
        FillMode::SpaceXCropY,
    ];

    /// Policies for the X and Y axes of the pattern region.
    pub fn axes(self) -> (AxisFill, AxisFill) {
        use AxisFill as A;
        match self {
            FillMode::None => (A::None, A::None),
            FillMode::Crop => (A::Crop, A::Crop),
            FillMode::Space => (A::Space, A::Space),
            FillMode::CropX => (A::Crop, A::None),
            FillMode::CropY => (A::None, A::Crop),
            FillMode::SpaceX => (A::Space, A::None),
            FillMode::SpaceY => (A::None, A::Space),
            FillMode::CropXSpaceY => (A::Crop, A::Space),
            FillMode::SpaceXCropY => (A::Space, A::Crop),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLayout {
    Grid,
    #[default]
    HexGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallMask {
    pub front: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl Default for WallMask {
    fn default() -> Self {
        Self {
            front: true,
            back: true,
            left: true,
            right: true,
        }
    }
}

impl WallMask {
    pub fn any(&self) -> bool {
        self.front || self.back || self.left || self.right
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSpec {
    /// 4, 6, 8 or 64 (round).
    pub sides: u32,
    pub cell: f64,
    pub spacing: f64,
    pub corner_radius: f64,
    pub fill: FillMode,
    pub layout: PatternLayout,
    /// Walls to cut; only meaningful for wall patterns.
    pub walls: Option<WallMask>,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            sides: PATTERN_SIDES,
            cell: PATTERN_CELL,
            spacing: PATTERN_SPACING,
            corner_radius: PATTERN_CORNER_RADIUS,
            fill: FillMode::Crop,
            layout: PatternLayout::HexGrid,
            walls: None,
        }
    }
}

impl PatternSpec {
    pub fn pitch(&self) -> f64 {
        self.cell + self.spacing
    }

    pub fn wall_mask(&self) -> WallMask {
        self.walls.unwrap_or_default()
    }

    fn validate(&self, prefix: &str) -> Result<(), ConfigError> {
        if !matches!(self.sides, 4 | 6 | 8 | 64) {
            return Err(ConfigError::Invalid {
                field: format!("{prefix}.sides"),
                reason: format!("{} sides is not one of 4, 6, 8, 64", self.sides),
            });
        }
        check_range_open_low(&format!("{prefix}.cell"), self.cell, 0.0, 100.0)?;
        check_range(&format!("{prefix}.spacing"), self.spacing, 0.0, 100.0)?;
        check_range(
            &format!("{prefix}.corner_radius"),
            self.corner_radius,
            0.0,
            self.cell / 2.0,
        )?;
        if let Some(mask) = self.walls {
            if !mask.any() {
                return Err(ConfigError::Invalid {
                    field: format!("{prefix}.walls"),
                    reason: "no wall enabled".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ── Range helpers ───────────────────────────────────────────────────────────

fn check_range(field: &str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            range: format!("[{lo}, {hi}]"),
        })
    }
}

fn check_range_open_low(field: &str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            range: format!("({lo}, {hi}]"),
        })
    }
}
