//! Boolean cut discipline.
//!
//! Every feature cut goes through [`cut`]: tool faces lying in a bounding
//! face plane of the target are pushed out by [`COPLANAR_EPS`] before the
//! subtraction, and an active feature must measurably change the volume.

use gf_kernel::{Axis, BoundingBox, Kernel, KernelIntrospect, Shape, Side, SolidHandle};
use gf_types::constants::COPLANAR_EPS;
use tracing::debug;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Distance under which a tool face counts as lying in a target face plane.
pub const COPLANAR_TOL: f64 = 1e-7;

/// Relative volume change below which a boolean is considered a no-op.
const VOLUME_EPS: f64 = 1e-9;

/// One group of tool faces moved off a target face plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoplanarAdjustment {
    pub axis: Axis,
    pub side: Side,
    pub plane: f64,
    pub prisms: usize,
}

/// Result of a cut or fuse.
#[derive(Debug)]
pub struct CutOutcome {
    pub solid: SolidHandle,
    pub volume_before: f64,
    pub volume_after: f64,
    pub adjustments: Vec<CoplanarAdjustment>,
}

impl CutOutcome {
    /// Volume taken away (negative for a fuse).
    pub fn removed(&self) -> f64 {
        self.volume_before - self.volume_after
    }
}

/// Push every tool face that lies in one of the six bounding planes of
/// `target` outward by [`COPLANAR_EPS`].
pub fn offset_coplanar(tool: &Shape, target: &BoundingBox) -> (Shape, Vec<CoplanarAdjustment>) {
    let mut shape = tool.clone();
    let mut adjustments = Vec::new();
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let i = axis.index();
        for (side, plane) in [(Side::Min, target.min[i]), (Side::Max, target.max[i])] {
            let (next, prisms) = shape.stretch(axis, side, plane, COPLANAR_EPS, COPLANAR_TOL);
            if prisms > 0 {
                debug!(?axis, ?side, plane, prisms, "coplanar tool faces offset");
                adjustments.push(CoplanarAdjustment {
                    axis,
                    side,
                    plane,
                    prisms,
                });
                shape = next;
            }
        }
    }
    (shape, adjustments)
}

fn is_noop(before: f64, after: f64) -> bool {
    (before - after).abs() <= VOLUME_EPS * before.abs().max(1.0)
}

/// Subtract `tool` from `target`, consuming the target.
///
/// When `active` is set the cut must remove material; a tool that misses
/// the solid, or a kernel that returns the target unchanged, is reported as
/// [`OpError::NoMaterialRemoved`].
pub fn cut(
    kb: &mut dyn KernelBundle,
    target: SolidHandle,
    tool: &Shape,
    feature: &str,
    active: bool,
) -> Result<CutOutcome, OpError> {
    let result = cut_inner(kb, &target, tool, feature, active);
    kb.release(target);
    result
}

fn cut_inner(
    kb: &mut dyn KernelBundle,
    target: &SolidHandle,
    tool: &Shape,
    feature: &str,
    active: bool,
) -> Result<CutOutcome, OpError> {
    let bbox = kb.as_introspect().bounding_box(target)?;
    let (tool, adjustments) = offset_coplanar(tool, &bbox);
    let volume_before = kb.volume_of(target)?;

    let tool_solid = kb.make_solid(&tool)?;
    let overlap = kb.boolean_intersect(target, &tool_solid)?;
    let overlap_volume = kb.volume_of(&overlap);
    kb.release(overlap);
    let overlap_volume = match overlap_volume {
        Ok(v) => v,
        Err(e) => {
            kb.release(tool_solid);
            return Err(e);
        }
    };
    if active && is_noop(overlap_volume, 0.0) {
        kb.release(tool_solid);
        debug!(feature, "cut tool does not overlap the solid");
        return Err(OpError::NoMaterialRemoved {
            feature: feature.to_string(),
        });
    }

    let solid = kb.boolean_subtract(target, &tool_solid);
    kb.release(tool_solid);
    let solid = solid?;
    let volume_after = kb.volume_of(&solid)?;
    if active && (volume_after >= volume_before || is_noop(volume_before, volume_after)) {
        debug!(feature, volume_before, volume_after, "cut left the solid unchanged");
        kb.release(solid);
        return Err(OpError::NoMaterialRemoved {
            feature: feature.to_string(),
        });
    }
    debug!(
        feature,
        removed = volume_before - volume_after,
        overlap = overlap_volume,
        "cut applied"
    );
    Ok(CutOutcome {
        solid,
        volume_before,
        volume_after,
        adjustments,
    })
}

/// Union `tool` into `target`, consuming the target. An active fuse must
/// add material.
pub fn fuse(
    kb: &mut dyn KernelBundle,
    target: SolidHandle,
    tool: &Shape,
    feature: &str,
    active: bool,
) -> Result<CutOutcome, OpError> {
    let result = fuse_inner(kb, &target, tool, feature, active);
    kb.release(target);
    result
}

fn fuse_inner(
    kb: &mut dyn KernelBundle,
    target: &SolidHandle,
    tool: &Shape,
    feature: &str,
    active: bool,
) -> Result<CutOutcome, OpError> {
    let volume_before = kb.volume_of(target)?;
    let tool_solid = kb.make_solid(tool)?;
    let solid = kb.boolean_union(target, &tool_solid);
    kb.release(tool_solid);
    let solid = solid?;
    let volume_after = kb.volume_of(&solid)?;
    if active && (volume_after <= volume_before || is_noop(volume_before, volume_after)) {
        kb.release(solid);
        return Err(OpError::NoMaterialAdded {
            feature: feature.to_string(),
        });
    }
    debug!(feature, added = volume_after - volume_before, "fuse applied");
    Ok(CutOutcome {
        solid,
        volume_before,
        volume_after,
        adjustments: Vec::new(),
    })
}
