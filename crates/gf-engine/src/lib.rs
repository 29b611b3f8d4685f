//! Gridfinity component builder.
//!
//! [`build`] takes a configuration document through the feature gate,
//! derives a per-build plan, drives the composer through its stages and
//! checks the finished solid against the output contract before handing it
//! to the caller.

pub mod composer;
pub mod gate;
pub mod grid;
pub mod heights;
pub mod types;

use gf_kernel::{Kernel, KernelIntrospect, SolidHandle};
use gf_ops::KernelBundle;
use gf_types::constants::DIMENSION_TOLERANCE;
use gf_types::{component_filename, ConfigDocument};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::composer::plan::Plan;
use crate::composer::{Composed, Composer};

pub use composer::{ComposerState, Recipe, StageOp, StageRecord};
pub use gate::{GateRejection, GateReport};
pub use types::{BuildOutput, BuildReport, EngineError};

/// Build one component. On success the caller owns the returned solid; on
/// any failure nothing is left allocated in the kernel.
#[instrument(skip_all, fields(kind = doc.spec.kind_name()))]
pub fn build(doc: &ConfigDocument, kb: &mut dyn KernelBundle) -> Result<BuildOutput, EngineError> {
    let GateReport { plan, warnings } = gate::check(doc)?;
    let composed = match &plan {
        Plan::Bin(p) => Composer::new(&mut *kb).run(p)?,
        Plan::Baseplate(p) => Composer::new(&mut *kb).run(p)?,
        Plan::Lid(p) => Composer::new(&mut *kb).run(p)?,
    };
    let Composed {
        solid,
        stages,
        fillets,
    } = composed;

    let predicted = plan.predicted_bbox();
    let (volume, bbox) = match check_contract(kb, &solid, &predicted) {
        Ok(measured) => measured,
        Err(e) => {
            kb.release(solid);
            return Err(e);
        }
    };

    let report = BuildReport {
        id: Uuid::new_v4(),
        kind: doc.spec.kind_name().to_string(),
        filename: component_filename(&doc.spec),
        stages,
        fillets,
        warnings,
        volume,
        bbox,
        predicted_bbox: predicted,
    };
    if report.is_partial() {
        warn!(filename = %report.filename, "built with skipped fillets");
    }
    info!(filename = %report.filename, volume, "component built");
    Ok(BuildOutput { solid, report })
}

/// Valid, non-empty and the predicted size. Returns the volume and box.
fn check_contract(
    kb: &mut dyn KernelBundle,
    solid: &SolidHandle,
    predicted: &gf_kernel::BoundingBox,
) -> Result<(f64, gf_kernel::BoundingBox), EngineError> {
    let validity = kb.check_validity(solid)?;
    if !validity.is_valid() {
        return Err(EngineError::ContractViolation {
            detail: format!("invalid solid: {}", validity.issues.join("; ")),
        });
    }
    let volume = kb.volume(solid)?;
    if volume <= 0.0 {
        return Err(EngineError::ContractViolation {
            detail: "solid encloses no volume".to_string(),
        });
    }
    let bbox = kb.bounding_box(solid)?;
    if !bbox.approx_eq(predicted, DIMENSION_TOLERANCE) {
        return Err(EngineError::ContractViolation {
            detail: format!(
                "bounding box {:?}..{:?} differs from predicted {:?}..{:?}",
                bbox.min, bbox.max, predicted.min, predicted.max
            ),
        });
    }
    Ok((volume, bbox))
}
