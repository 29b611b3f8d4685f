//! Grid coordinate mapper.
//!
//! Every planar position a component needs (cell centres, hole centres,
//! corner tabs, bore rows) comes from one [`GridLayout`]. The drawer-fit
//! offset is computed once in [`GridLayout::new`] and every accessor adds
//! it, so two features can never disagree about where the grid sits.

use gf_types::constants::*;
use gf_types::{BaseplateSpec, BinSpec, ConfigError, DrawerFit, GridSize, HoleSpec};
use serde::Serialize;

/// One grid cell: integer index and resolved centre in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPosition {
    pub i: usize,
    pub j: usize,
    pub center: [f64; 2],
}

/// Resolved footprint of a component, centred on the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    /// Outside dimensions, X then Y.
    pub outer_size: [f64; 2],
    /// Cell pitch: 42 mm, or 21 mm in half-grid mode.
    pub unit: f64,
    pub counts: [usize; 2],
    /// Centre of the cell block relative to the footprint centre.
    pub offset: [f64; 2],
    pub half_grid: bool,
    pub cells: Vec<GridPosition>,
}

impl GridLayout {
    fn new(outer_size: [f64; 2], unit: f64, counts: [usize; 2], offset: [f64; 2], half_grid: bool) -> Self {
        let mut layout = Self {
            outer_size,
            unit,
            counts,
            offset,
            half_grid,
            cells: Vec::with_capacity(counts[0] * counts[1]),
        };
        for j in 0..counts[1] {
            for i in 0..counts[0] {
                let center = [layout.column(i), layout.row(j)];
                layout.cells.push(GridPosition { i, j, center });
            }
        }
        layout
    }

    /// X of column `i`.
    pub fn column(&self, i: usize) -> f64 {
        self.offset[0] + (i as f64 - (self.counts[0] as f64 - 1.0) / 2.0) * self.unit
    }

    /// Y of row `j`.
    pub fn row(&self, j: usize) -> f64 {
        self.offset[1] + (j as f64 - (self.counts[1] as f64 - 1.0) / 2.0) * self.unit
    }

    pub fn columns(&self) -> Vec<f64> {
        (0..self.counts[0]).map(|i| self.column(i)).collect()
    }

    pub fn rows(&self) -> Vec<f64> {
        (0..self.counts[1]).map(|j| self.row(j)).collect()
    }

    /// Size of the cell block, without drawer padding or clearance.
    pub fn block_size(&self) -> [f64; 2] {
        [
            self.counts[0] as f64 * self.unit,
            self.counts[1] as f64 * self.unit,
        ]
    }

    pub fn half_extent(&self) -> [f64; 2] {
        [self.outer_size[0] / 2.0, self.outer_size[1] / 2.0]
    }

    /// How far the outer rim drops below the top once full-unit receptacle
    /// mouths are cut into this footprint. With two or more cells along an
    /// axis the ridges between receptacles still reach the top.
    pub fn receptacle_rim_trim(&self) -> f64 {
        if self.counts.iter().any(|&n| n > 1) {
            return 0.0;
        }
        let block = self.block_size();
        let trim = ((block[0] - self.outer_size[0]) / 2.0).min((block[1] - self.outer_size[1]) / 2.0);
        trim.max(0.0)
    }

    /// Centres of the magnet or bolt holes.
    ///
    /// Explicit placements are offsets from every cell centre. Otherwise a
    /// full grid puts four holes around each cell centre and a half grid puts
    /// one hole near each corner of the whole block.
    pub fn hole_centers(&self, holes: Option<&HoleSpec>) -> Vec<[f64; 2]> {
        if let Some(placements) = holes.and_then(|h| h.placements.as_ref()) {
            return self
                .cells
                .iter()
                .flat_map(|c| placements.iter().map(move |p| [c.center[0] + p[0], c.center[1] + p[1]]))
                .collect();
        }
        if self.half_grid {
            let block = self.block_size();
            let dx = block[0] / 2.0 - HALF_GRID_HOLE_EDGE;
            let dy = block[1] / 2.0 - HALF_GRID_HOLE_EDGE;
            return square_corners(self.offset, dx, dy);
        }
        self.cells
            .iter()
            .flat_map(|c| square_corners(c.center, HOLE_DIST, HOLE_DIST))
            .collect()
    }

    /// Centres of `size` x `size` squares tucked into the four outer corners.
    pub fn corner_points(&self, size: f64) -> Vec<[f64; 2]> {
        let [hx, hy] = self.half_extent();
        square_corners([0.0, 0.0], hx - size / 2.0, hy - size / 2.0)
    }

    /// X centres of the footprint counted in whole 42 mm units, regardless
    /// of the cell pitch.
    pub fn full_unit_columns(&self) -> Vec<f64> {
        let n = (self.block_size()[0] / GRID_UNIT).round().max(1.0) as usize;
        (0..n)
            .map(|i| self.offset[0] + (i as f64 - (n as f64 - 1.0) / 2.0) * GRID_UNIT)
            .collect()
    }
}

fn square_corners(center: [f64; 2], dx: f64, dy: f64) -> Vec<[f64; 2]> {
    vec![
        [center[0] - dx, center[1] - dy],
        [center[0] + dx, center[1] - dy],
        [center[0] + dx, center[1] + dy],
        [center[0] - dx, center[1] + dy],
    ]
}

fn unit_for(half_grid: bool) -> f64 {
    if half_grid {
        HALF_GRID_UNIT
    } else {
        GRID_UNIT
    }
}

/// Layout for an integral grid size: outer size `units * 42 - 0.5`.
pub fn resolve(size: GridSize, half_grid: bool) -> GridLayout {
    let unit = unit_for(half_grid);
    let dims = size.as_array();
    let outer = dims.map(|u| u * GRID_UNIT - GRID_CLEARANCE);
    let counts = dims.map(|u| (u * GRID_UNIT / unit).round().max(1.0) as usize);
    GridLayout::new(outer, unit, counts, [0.0, 0.0], half_grid)
}

/// Layout filling a drawer: as many whole cells as fit, the footprint
/// grown to the drawer size, and the slack placed by `alignment`.
pub fn resolve_fit(fit: &DrawerFit, half_grid: bool) -> GridLayout {
    let unit = unit_for(half_grid);
    let mut outer = [0.0; 2];
    let mut counts = [0; 2];
    let mut offset = [0.0; 2];
    for axis in 0..2 {
        let target = fit.target[axis];
        let n = ((target / unit) + 1e-9).floor().max(1.0);
        let block = n * unit;
        outer[axis] = block.max(target);
        counts[axis] = n as usize;
        offset[axis] = (outer[axis] - block) * fit.alignment[axis] / 2.0;
    }
    GridLayout::new(outer, unit, counts, offset, half_grid)
}

pub fn resolve_bin(bin: &BinSpec) -> GridLayout {
    resolve(bin.size, bin.half_grid)
}

pub fn resolve_baseplate(bp: &BaseplateSpec) -> Result<GridLayout, ConfigError> {
    match (&bp.size, &bp.drawer_fit) {
        (Some(size), None) => Ok(resolve(*size, bp.half_grid)),
        (None, Some(fit)) => Ok(resolve_fit(fit, bp.half_grid)),
        _ => Err(ConfigError::Invalid {
            field: "size".to_string(),
            reason: "a baseplate needs exactly one of a grid size and a drawer fit".to_string(),
        }),
    }
}
