//! Safe fillet stage.
//!
//! Each selector group is filleted on its own. A group whose fillet the
//! kernel rejects or panics on is skipped and recorded; the solid carries on
//! without it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use gf_kernel::{EdgeSelector, Kernel, KernelError, SolidHandle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Edges to round and the radius to round them with.
#[derive(Debug, Clone, PartialEq)]
pub struct FilletGroup {
    pub name: String,
    pub selector: EdgeSelector,
    pub radius: f64,
}

impl FilletGroup {
    pub fn new(name: impl Into<String>, selector: EdgeSelector, radius: f64) -> Self {
        Self {
            name: name.into(),
            selector,
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FilletOutcome {
    Applied,
    /// The selector matched no edges on this solid.
    NothingSelected,
    /// The kernel could not fillet the group.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilletRecord {
    pub group: String,
    #[serde(flatten)]
    pub outcome: FilletOutcome,
}

#[derive(Debug)]
pub struct FilletResult {
    pub solid: SolidHandle,
    pub records: Vec<FilletRecord>,
}

impl FilletResult {
    /// True when at least one group was skipped.
    pub fn is_partial(&self) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r.outcome, FilletOutcome::Skipped { .. }))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "kernel panicked".to_string()
    }
}

/// Fillet `solid` group by group, consuming it.
///
/// Only a non-positive radius or a kernel error other than a fillet
/// failure aborts; everything else degrades to a recorded outcome.
pub fn apply(
    kb: &mut dyn KernelBundle,
    solid: SolidHandle,
    groups: &[FilletGroup],
) -> Result<FilletResult, OpError> {
    if let Some(g) = groups.iter().find(|g| !(g.radius > 0.0)) {
        kb.release(solid);
        return Err(OpError::InvalidParameter {
            reason: format!("fillet radius for '{}' must be positive", g.name),
        });
    }

    let mut current = solid;
    let mut records = Vec::with_capacity(groups.len());
    for group in groups {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            kb.fillet_edges(&current, &group.selector, group.radius)
        }));
        let outcome = match attempt {
            Ok(Ok(next)) => {
                kb.release(current);
                current = next;
                debug!(group = %group.name, radius = group.radius, "fillet applied");
                FilletOutcome::Applied
            }
            Ok(Err(KernelError::EmptySelection { selector })) => {
                debug!(group = %group.name, %selector, "fillet selected no edges");
                FilletOutcome::NothingSelected
            }
            Ok(Err(KernelError::FilletFailed { reason })) => {
                warn!(group = %group.name, %reason, "fillet skipped");
                FilletOutcome::Skipped { reason }
            }
            Ok(Err(e)) => {
                kb.release(current);
                return Err(e.into());
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(group = %group.name, %reason, "fillet panicked, skipped");
                FilletOutcome::Skipped { reason }
            }
        };
        records.push(FilletRecord {
            group: group.name.clone(),
            outcome,
        });
    }

    let skipped = records
        .iter()
        .filter(|r| matches!(r.outcome, FilletOutcome::Skipped { .. }))
        .count();
    info!(groups = groups.len(), skipped, "fillet stage complete");
    Ok(FilletResult {
        solid: current,
        records,
    })
}
