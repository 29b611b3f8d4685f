//! Pattern tiler: repeating cutouts over a rectangular wall or floor region.
//!
//! Regions and placements live in the section plane of the prism that will
//! carry the cutouts, so the same tiling serves floors (x, y) and walls
//! (x or y, z). The caller insets the region by its border clearance.

use gf_kernel::intervals::IntervalSet;
use gf_kernel::{Axis, Section, Shape};
use gf_types::{AxisFill, PatternLayout, PatternSpec};
use tracing::debug;

/// Chords per rounded polygon vertex.
const CORNER_ARC_STEPS: u32 = 4;
/// Sides value that selects a round cutout.
const ROUND_SIDES: u32 = 64;
/// Longest v interval integrated with one Gauss pair.
const MAX_DV: f64 = 0.25;
const FIT_TOL: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("no {cell} mm cutout fits in a {width:.2} x {height:.2} mm region")]
    NothingFits { width: f64, height: f64, cell: f64 },

    #[error("cutouts cover the whole {width:.2} x {height:.2} mm region")]
    FullCoverage { width: f64, height: f64 },
}

/// Axis-aligned rectangle in section-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternRegion {
    pub center: [f64; 2],
    pub size: [f64; 2],
}

impl PatternRegion {
    pub fn new(center: [f64; 2], size: [f64; 2]) -> Self {
        Self { center, size }
    }

    /// The region spanned by two corners.
    pub fn from_corners(lo: [f64; 2], hi: [f64; 2]) -> Self {
        Self {
            center: [(lo[0] + hi[0]) / 2.0, (lo[1] + hi[1]) / 2.0],
            size: [hi[0] - lo[0], hi[1] - lo[1]],
        }
    }

    pub fn area(&self) -> f64 {
        self.size[0] * self.size[1]
    }

    pub fn lo(&self) -> [f64; 2] {
        [
            self.center[0] - self.size[0] / 2.0,
            self.center[1] - self.size[1] / 2.0,
        ]
    }

    pub fn hi(&self) -> [f64; 2] {
        [
            self.center[0] + self.size[0] / 2.0,
            self.center[1] + self.size[1] / 2.0,
        ]
    }

    pub fn section(&self) -> Section {
        Section::rect(self.center, self.size)
    }
}

/// One cutout position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub center: [f64; 2],
    /// The cutout overhangs the region and must be clipped.
    pub clipped: bool,
}

/// Centres along one axis, relative to the region centre.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisPlan {
    start: f64,
    step: f64,
    count: usize,
    policy: AxisFill,
}

impl AxisPlan {
    fn new(length: f64, extent: f64, pitch: f64, policy: AxisFill) -> Self {
        let fit = if length + FIT_TOL < extent {
            0
        } else {
            ((length - extent) / pitch + FIT_TOL).floor() as usize + 1
        };
        match policy {
            AxisFill::Crop => Self {
                start: -(fit.saturating_sub(1) as f64) * pitch / 2.0,
                step: pitch,
                count: fit,
                policy,
            },
            AxisFill::Space if fit > 1 => Self {
                start: -(length - extent) / 2.0,
                step: (length - extent) / (fit - 1) as f64,
                count: fit,
                policy,
            },
            AxisFill::Space => Self {
                start: 0.0,
                step: pitch,
                count: fit,
                policy,
            },
            AxisFill::None => Self {
                start: -length / 2.0 + extent / 2.0,
                step: pitch,
                count: ((length / pitch) - FIT_TOL).ceil().max(1.0) as usize,
                policy,
            },
        }
    }
}

/// Lazily produced cutout placements, row by row. Calling [`tile`] again
/// with the same inputs yields the same sequence.
#[derive(Debug, Clone)]
pub struct Tiling {
    region: PatternRegion,
    extent: [f64; 2],
    u: AxisPlan,
    v: AxisPlan,
    stagger: bool,
    row: usize,
    col: usize,
}

impl Tiling {
    fn candidate(&self, row: usize, col: usize) -> Option<Placement> {
        let shift = if self.stagger && row % 2 == 1 {
            self.u.step / 2.0
        } else {
            0.0
        };
        let du = self.u.start + col as f64 * self.u.step + shift;
        let dv = self.v.start + row as f64 * self.v.step;
        let mut clipped = false;
        for (d, plan, extent, length) in [
            (du, &self.u, self.extent[0], self.region.size[0]),
            (dv, &self.v, self.extent[1], self.region.size[1]),
        ] {
            let overhang = d.abs() + extent / 2.0 - length / 2.0;
            if overhang <= FIT_TOL {
                continue;
            }
            match plan.policy {
                AxisFill::Crop | AxisFill::Space => return None,
                AxisFill::None if d.abs() - extent / 2.0 >= length / 2.0 => return None,
                AxisFill::None => clipped = true,
            }
        }
        Some(Placement {
            row,
            col,
            center: [self.region.center[0] + du, self.region.center[1] + dv],
            clipped,
        })
    }
}

impl Iterator for Tiling {
    type Item = Placement;

    fn next(&mut self) -> Option<Placement> {
        if self.u.count == 0 {
            return None;
        }
        while self.row < self.v.count {
            let (row, col) = (self.row, self.col);
            self.col += 1;
            if self.col >= self.u.count {
                self.col = 0;
                self.row += 1;
            }
            if let Some(p) = self.candidate(row, col) {
                return Some(p);
            }
        }
        None
    }
}

/// Cutout outline centred at `center`: a regular polygon `cell` across the
/// flats, or a circle for 64 sides.
pub fn cutout_section(spec: &PatternSpec, center: [f64; 2]) -> Section {
    if spec.sides >= ROUND_SIDES {
        return Section::circle(center, spec.cell / 2.0);
    }
    Section::regular_polygon(
        center,
        spec.cell / 2.0,
        spec.sides,
        spec.corner_radius,
        CORNER_ARC_STEPS,
    )
}

/// Tile `region` with the cutouts of `spec`. Each axis is planned with its
/// own fill policy; the two never influence each other.
pub fn tile(region: PatternRegion, spec: &PatternSpec) -> Tiling {
    let extent = cutout_section(spec, [0.0, 0.0])
        .bounds()
        .map_or([spec.cell, spec.cell], |(lo, hi)| [hi[0] - lo[0], hi[1] - lo[1]]);
    let pitch = spec.pitch();
    let (stagger, row_pitch) = match spec.layout {
        PatternLayout::Grid => (false, pitch),
        PatternLayout::HexGrid => (true, pitch * 3f64.sqrt() / 2.0),
    };
    let (fill_u, fill_v) = spec.fill.axes();
    // Rows two apart share columns and must not overlap.
    let row_pitch = if stagger { row_pitch.max(extent[1] / 2.0) } else { row_pitch };
    Tiling {
        region,
        extent,
        u: AxisPlan::new(region.size[0], extent[0], pitch, fill_u),
        v: AxisPlan::new(region.size[1], extent[1], row_pitch, fill_v),
        stagger,
        row: 0,
        col: 0,
    }
}

/// Area of `region` left after removing the union of `cutouts`.
pub fn residual_area(region: &PatternRegion, cutouts: &[Section]) -> f64 {
    let (lo, hi) = (region.lo(), region.hi());
    let window = IntervalSet::single(lo[0], hi[0]);
    let mut breaks = vec![lo[1], hi[1]];
    for s in cutouts {
        s.v_breakpoints(&mut breaks);
    }
    breaks.retain(|v| *v >= lo[1] && *v <= hi[1]);
    breaks.sort_by(f64::total_cmp);
    breaks.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

    let bounds: Vec<_> = cutouts.iter().map(Section::bounds).collect();
    let covered_at = |v: f64| {
        let spans = cutouts
            .iter()
            .zip(&bounds)
            .filter(|(_, b)| matches!(b, Some((l, h)) if v >= l[1] && v <= h[1]))
            .flat_map(|(s, _)| s.slice(v).spans().to_vec())
            .collect();
        IntervalSet::from_unsorted(spans).intersect(&window).measure()
    };

    let g = 0.5 / 3f64.sqrt();
    let mut covered = 0.0;
    for w in breaks.windows(2) {
        let (a, b) = (w[0], w[1]);
        let pieces = ((b - a) / MAX_DV).ceil().max(1.0) as usize;
        let h = (b - a) / pieces as f64;
        for k in 0..pieces {
            let mid = a + (k as f64 + 0.5) * h;
            covered += 0.5 * h * (covered_at(mid - g * h) + covered_at(mid + g * h));
        }
    }
    (region.area() - covered).max(0.0)
}

/// Cutout sections for `region`, checked: at least one must fit and some
/// material must remain.
pub fn cutouts(region: PatternRegion, spec: &PatternSpec) -> Result<Vec<(Placement, Section)>, PatternError> {
    let placed: Vec<_> = tile(region, spec)
        .map(|p| (p, cutout_section(spec, p.center)))
        .collect();
    if placed.is_empty() {
        return Err(PatternError::NothingFits {
            width: region.size[0],
            height: region.size[1],
            cell: spec.cell,
        });
    }
    let sections: Vec<Section> = placed.iter().map(|(_, s)| s.clone()).collect();
    let residual = residual_area(&region, &sections);
    debug!(cutouts = placed.len(), residual, "pattern tiled");
    if residual <= 1e-6 * region.area() {
        return Err(PatternError::FullCoverage {
            width: region.size[0],
            height: region.size[1],
        });
    }
    Ok(placed)
}

/// The material to remove: one prism per cutout along `axis` over `span`,
/// clipped to the region only when some cutout overhangs it.
pub fn pattern_tool(
    region: PatternRegion,
    spec: &PatternSpec,
    axis: Axis,
    span: [f64; 2],
) -> Result<Shape, PatternError> {
    let placed = cutouts(region, spec)?;
    let any_clipped = placed.iter().any(|(p, _)| p.clipped);
    let prisms: Vec<Shape> = placed
        .into_iter()
        .map(|(_, s)| Shape::prism(axis, s, span))
        .collect();
    let tool = Shape::union(prisms);
    if any_clipped {
        return Ok(Shape::intersection(vec![
            tool,
            Shape::prism(axis, region.section(), span),
        ]));
    }
    Ok(tool)
}
