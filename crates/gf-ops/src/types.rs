use gf_kernel::KernelError;

use crate::pattern::PatternError;

/// Errors from geometric operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// An active cut left the solid unchanged.
    #[error("feature '{feature}' removed no material")]
    NoMaterialRemoved { feature: String },

    /// An active fuse added nothing to the solid.
    #[error("feature '{feature}' added no material")]
    NoMaterialAdded { feature: String },

    #[error("pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl OpError {
    /// Name of the feature the error is attributed to, if any.
    pub fn feature(&self) -> Option<&str> {
        match self {
            OpError::NoMaterialRemoved { feature } | OpError::NoMaterialAdded { feature } => {
                Some(feature)
            }
            _ => None,
        }
    }
}
