//! Assertion helpers with diagnostic output.
//!
//! Failures carry the context label plus expected and actual values so a
//! failing scenario can be read without re-running it.

use gf_engine::{BuildOutput, BuildReport, EngineError, StageRecord};

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Every verdict passed; otherwise the first failure becomes the error.
pub fn assert_all_pass(verdicts: &[OracleVerdict], ctx: &str) -> Result<(), HarnessError> {
    match verdicts.iter().find(|v| !v.passed) {
        None => Ok(()),
        Some(v) => Err(HarnessError::OracleFailure {
            oracle: v.oracle_name.clone(),
            detail: format!("[{ctx}] {}", v.detail),
        }),
    }
}

/// The build recorded a `feature` stage.
pub fn assert_stage<'r>(
    report: &'r BuildReport,
    feature: &str,
    ctx: &str,
) -> Result<&'r StageRecord, HarnessError> {
    report.stage(feature).ok_or_else(|| {
        let recorded: Vec<&str> = report.stages.iter().map(|s| s.feature.as_str()).collect();
        HarnessError::AssertionFailed {
            detail: format!(
                "[{ctx}] no '{feature}' stage; recorded: {}",
                recorded.join(", ")
            ),
        }
    })
}

/// The build recorded no `feature` stage.
pub fn assert_no_stage(report: &BuildReport, feature: &str, ctx: &str) -> Result<(), HarnessError> {
    match report.stage(feature) {
        None => Ok(()),
        Some(s) => Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{ctx}] unexpected '{feature}' stage at {:?} ({} items)",
                s.stage, s.items
            ),
        }),
    }
}

/// Every face of the box within `tol` of the expected size along each axis.
pub fn assert_size(report: &BuildReport, expected: [f64; 3], tol: f64, ctx: &str) -> Result<(), HarnessError> {
    let size = report.bbox.size();
    for i in 0..3 {
        if (size[i] - expected[i]).abs() > tol {
            return Err(HarnessError::AssertionFailed {
                detail: format!(
                    "[{ctx}] size[{i}]: expected {:.4}, got {:.4} (tol={tol})",
                    expected[i], size[i]
                ),
            });
        }
    }
    Ok(())
}

/// The build was refused, naming `feature` as the cause.
pub fn assert_rejected_for(
    result: &Result<BuildOutput, EngineError>,
    feature: &str,
    ctx: &str,
) -> Result<(), HarnessError> {
    match result {
        Ok(out) => Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] expected a rejection for '{feature}', built {}", out.report.filename),
        }),
        Err(e) if e.feature_name() == Some(feature) => Ok(()),
        Err(e) => Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] expected a rejection for '{feature}', got: {e}"),
        }),
    }
}
