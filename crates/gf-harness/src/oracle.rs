//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an [`OracleVerdict`] with diagnostic detail instead of
//! panicking, so a caller can collect every failure of a build in one pass.

use gf_engine::{BuildOutput, BuildReport, ComposerState};
use gf_kernel::{BoundingBox, KernelIntrospect, SolidHandle};
use gf_ops::FilletOutcome;
use gf_types::constants::DIMENSION_TOLERANCE;
use serde::Serialize;

/// The result of a single oracle check.
#[derive(Debug, Clone, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Solid Oracles ───────────────────────────────────────────────────────────

/// The kernel reports the solid closed, finite and non-empty.
pub fn check_validity(introspect: &dyn KernelIntrospect, solid: &SolidHandle) -> OracleVerdict {
    match introspect.check_validity(solid) {
        Ok(report) if report.is_valid() => {
            OracleVerdict::pass("validity", "solid is closed and non-empty".to_string())
        }
        Ok(report) => OracleVerdict::fail("validity", report.issues.join("; ")),
        Err(e) => OracleVerdict::fail("validity", format!("kernel error: {e}")),
    }
}

/// Measured box equals `expected` on every face within `tol` mm.
pub fn check_bounding_box(
    introspect: &dyn KernelIntrospect,
    solid: &SolidHandle,
    expected: &BoundingBox,
    tol: f64,
) -> OracleVerdict {
    let bbox = match introspect.bounding_box(solid) {
        Ok(b) => b,
        Err(e) => return OracleVerdict::fail("bounding_box", format!("kernel error: {e}")),
    };
    let worst = (0..3)
        .flat_map(|i| {
            [
                (bbox.min[i] - expected.min[i]).abs(),
                (bbox.max[i] - expected.max[i]).abs(),
            ]
        })
        .fold(0.0_f64, f64::max);
    let size = bbox.size();
    let detail = format!(
        "{:.3} x {:.3} x {:.3} mm, worst face offset {:.2e}",
        size[0], size[1], size[2], worst
    );
    if worst <= tol {
        OracleVerdict::pass_val("bounding_box", detail, worst)
    } else {
        OracleVerdict::fail_val("bounding_box", detail, worst)
    }
}

/// Volume within `rel_tol` of `expected`.
pub fn check_volume(
    introspect: &dyn KernelIntrospect,
    solid: &SolidHandle,
    expected: f64,
    rel_tol: f64,
) -> OracleVerdict {
    let volume = match introspect.volume(solid) {
        Ok(v) => v,
        Err(e) => return OracleVerdict::fail("volume", format!("kernel error: {e}")),
    };
    let err = relative_error(volume, expected);
    let detail = format!("volume {volume:.3} mm^3, expected {expected:.3} (rel err {err:.2e})");
    if err <= rel_tol {
        OracleVerdict::pass_val("volume", detail, volume)
    } else {
        OracleVerdict::fail_val("volume", detail, volume)
    }
}

/// Exactly `expected` solids alive in the kernel session.
pub fn check_no_leaks(introspect: &dyn KernelIntrospect, expected: usize) -> OracleVerdict {
    let alive = introspect.solid_count();
    let detail = format!("{alive} solids alive, expected {expected}");
    if alive == expected {
        OracleVerdict::pass_val("no_leaks", detail, alive as f64)
    } else {
        OracleVerdict::fail_val("no_leaks", detail, alive as f64)
    }
}

// ── Report Oracles ──────────────────────────────────────────────────────────

/// Every cut and hole stage left strictly less material behind.
pub fn check_cuts_remove_material(report: &BuildReport) -> OracleVerdict {
    let offenders: Vec<&str> = report
        .stages
        .iter()
        .filter(|s| s.op.removes_material() && s.volume_after >= s.volume_before)
        .map(|s| s.feature.as_str())
        .collect();
    if offenders.is_empty() {
        OracleVerdict::pass(
            "cuts_remove_material",
            format!("{} stages checked", report.stages.len()),
        )
    } else {
        OracleVerdict::fail(
            "cuts_remove_material",
            format!("no material removed by: {}", offenders.join(", ")),
        )
    }
}

/// Records appear in composer order, starting from the shell.
pub fn check_stage_order(report: &BuildReport) -> OracleVerdict {
    let Some(first) = report.stages.first() else {
        return OracleVerdict::fail("stage_order", "no stages recorded".to_string());
    };
    if first.stage != ComposerState::ShellBuilt {
        return OracleVerdict::fail(
            "stage_order",
            format!("first record is {:?}, not the shell", first.stage),
        );
    }
    for pair in report.stages.windows(2) {
        if pair[1].stage < pair[0].stage {
            return OracleVerdict::fail(
                "stage_order",
                format!(
                    "'{}' ({:?}) recorded after '{}' ({:?})",
                    pair[1].feature, pair[1].stage, pair[0].feature, pair[0].stage
                ),
            );
        }
    }
    OracleVerdict::pass(
        "stage_order",
        format!("{} records in order", report.stages.len()),
    )
}

/// The `feature` stage removed `expected` mm^3 within `rel_tol`.
pub fn check_removed_volume(
    report: &BuildReport,
    feature: &str,
    expected: f64,
    rel_tol: f64,
) -> OracleVerdict {
    let Some(stage) = report.stage(feature) else {
        return OracleVerdict::fail("removed_volume", format!("no '{feature}' stage"));
    };
    let removed = stage.removed();
    let err = relative_error(removed, expected);
    let detail = format!("'{feature}' removed {removed:.3} mm^3, expected {expected:.3} (rel err {err:.2e})");
    if err <= rel_tol {
        OracleVerdict::pass_val("removed_volume", detail, removed)
    } else {
        OracleVerdict::fail_val("removed_volume", detail, removed)
    }
}

/// The `feature` stage placed exactly `expected` tool bodies.
pub fn check_item_count(report: &BuildReport, feature: &str, expected: usize) -> OracleVerdict {
    match report.stage(feature) {
        Some(s) if s.items == expected => OracleVerdict::pass_val(
            "item_count",
            format!("'{feature}' placed {expected}"),
            expected as f64,
        ),
        Some(s) => OracleVerdict::fail_val(
            "item_count",
            format!("'{feature}' placed {}, expected {expected}", s.items),
            s.items as f64,
        ),
        None => OracleVerdict::fail("item_count", format!("no '{feature}' stage")),
    }
}

/// The `feature` cut needed its tools pushed off a coplanar face.
pub fn check_coplanar_offset(report: &BuildReport, feature: &str) -> OracleVerdict {
    match report.stage(feature) {
        Some(s) if s.coplanar_offsets > 0 => OracleVerdict::pass_val(
            "coplanar_offset",
            format!("'{feature}' offset {} tool prisms", s.coplanar_offsets),
            s.coplanar_offsets as f64,
        ),
        Some(_) => OracleVerdict::fail(
            "coplanar_offset",
            format!("'{feature}' cut without any coplanar offset"),
        ),
        None => OracleVerdict::fail("coplanar_offset", format!("no '{feature}' stage")),
    }
}

/// No fillet group was skipped.
pub fn check_fillets(report: &BuildReport) -> OracleVerdict {
    let skipped: Vec<String> = report
        .fillets
        .iter()
        .filter_map(|r| match &r.outcome {
            FilletOutcome::Skipped { reason } => Some(format!("{} ({reason})", r.group)),
            _ => None,
        })
        .collect();
    if skipped.is_empty() {
        OracleVerdict::pass(
            "fillets",
            format!("{} groups, none skipped", report.fillets.len()),
        )
    } else {
        OracleVerdict::fail_val(
            "fillets",
            format!("skipped: {}", skipped.join(", ")),
            skipped.len() as f64,
        )
    }
}

// ── Comparison Oracles ──────────────────────────────────────────────────────

/// Two builds of the same configuration agree on volume and box.
pub fn check_idempotent(a: &BuildReport, b: &BuildReport, rel_tol: f64) -> OracleVerdict {
    let err = relative_error(a.volume, b.volume);
    let same_box = a.bbox.approx_eq(&b.bbox, DIMENSION_TOLERANCE);
    let same_stages = a.stages.len() == b.stages.len();
    let detail = format!(
        "volume rel err {err:.2e}, boxes {}, stages {} vs {}",
        if same_box { "match" } else { "differ" },
        a.stages.len(),
        b.stages.len()
    );
    if err <= rel_tol && same_box && same_stages {
        OracleVerdict::pass_val("idempotent", detail, err)
    } else {
        OracleVerdict::fail_val("idempotent", detail, err)
    }
}

// ── Composite Oracle ────────────────────────────────────────────────────────

/// The checks every successful build must pass.
pub fn run_build_checks(introspect: &dyn KernelIntrospect, output: &BuildOutput) -> Vec<OracleVerdict> {
    vec![
        check_validity(introspect, &output.solid),
        check_bounding_box(
            introspect,
            &output.solid,
            &output.report.predicted_bbox,
            DIMENSION_TOLERANCE,
        ),
        check_stage_order(&output.report),
        check_cuts_remove_material(&output.report),
        check_fillets(&output.report),
    ]
}

fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    }
}
