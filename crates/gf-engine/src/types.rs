use gf_kernel::{BoundingBox, KernelError, SolidHandle};
use gf_ops::{FilletOutcome, FilletRecord, OpError};
use gf_types::ConfigWarning;
use serde::Serialize;
use uuid::Uuid;

use crate::composer::{ComposerState, StageRecord};
use crate::gate::GateRejection;

/// Everything known about one finished build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    /// Unique per build, so two reports of the same spec are distinguishable.
    pub id: Uuid,
    pub kind: String,
    pub filename: String,
    pub stages: Vec<StageRecord>,
    pub fillets: Vec<FilletRecord>,
    pub warnings: Vec<ConfigWarning>,
    pub volume: f64,
    pub bbox: BoundingBox,
    pub predicted_bbox: BoundingBox,
}

impl BuildReport {
    /// True when some fillet group was skipped.
    pub fn is_partial(&self) -> bool {
        self.fillets
            .iter()
            .any(|r| matches!(r.outcome, FilletOutcome::Skipped { .. }))
    }

    pub fn stage(&self, feature: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.feature == feature)
    }
}

/// The finished solid and its report. The caller owns the solid.
#[derive(Debug)]
pub struct BuildOutput {
    pub solid: SolidHandle,
    pub report: BuildReport,
}

/// Errors from the build pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("configuration rejected: {0}")]
    Rejected(#[from] GateRejection),

    #[error("feature '{feature}' failed: {source}")]
    Feature { feature: String, source: OpError },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("composer cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: ComposerState,
        to: ComposerState,
    },

    #[error("output contract violated: {detail}")]
    ContractViolation { detail: String },
}

impl EngineError {
    pub(crate) fn feature(feature: &str, source: OpError) -> Self {
        EngineError::Feature {
            feature: feature.to_string(),
            source,
        }
    }

    /// Name of the feature the failure is attributed to, if any.
    pub fn feature_name(&self) -> Option<&str> {
        match self {
            EngineError::Rejected(r) => r.feature(),
            EngineError::Feature { feature, .. } => Some(feature),
            _ => None,
        }
    }
}
