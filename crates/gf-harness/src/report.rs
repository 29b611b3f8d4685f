//! Structured text reports of finished builds.
//!
//! Reports are plain text meant to be read next to a slicer preview: stage
//! by stage what was cut, how much material it took, and which checks held.

use std::fmt;

use gf_engine::{BuildReport, StageOp};
use gf_kernel::BoundingBox;
use gf_ops::FilletOutcome;
use serde_json::{json, Value};

use crate::oracle::OracleVerdict;

/// A complete component report with all sections.
pub struct ComponentReport {
    pub title: String,
    pub stage_entries: Vec<StageEntry>,
    pub fillet_entries: Vec<(String, String)>,
    pub bounding_box: BoundingBox,
    pub volume: f64,
    pub warnings: Vec<String>,
    pub oracle_results: Vec<OracleVerdict>,
}

/// A single stage's report entry.
pub struct StageEntry {
    pub index: usize,
    pub feature: String,
    pub op: StageOp,
    pub items: usize,
    /// Signed material change in mm^3.
    pub delta: f64,
    pub coplanar_offsets: usize,
}

impl ComponentReport {
    pub fn from_build(name: &str, report: &BuildReport, oracle_results: Vec<OracleVerdict>) -> Self {
        let stage_entries = report
            .stages
            .iter()
            .enumerate()
            .map(|(index, s)| StageEntry {
                index,
                feature: s.feature.clone(),
                op: s.op,
                items: s.items,
                delta: s.volume_after - s.volume_before,
                coplanar_offsets: s.coplanar_offsets,
            })
            .collect();
        let fillet_entries = report
            .fillets
            .iter()
            .map(|r| {
                let outcome = match &r.outcome {
                    FilletOutcome::Applied => "applied".to_string(),
                    FilletOutcome::NothingSelected => "no edges selected".to_string(),
                    FilletOutcome::Skipped { reason } => format!("SKIPPED ({reason})"),
                };
                (r.group.clone(), outcome)
            })
            .collect();
        Self {
            title: format!("{} \"{}\" ({})", report.kind, name, report.filename),
            stage_entries,
            fillet_entries,
            bounding_box: report.bbox,
            volume: report.volume,
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
            oracle_results,
        }
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Gridfinity Component Report ===\n\n");
        out.push_str(&format!("Component: {}\n", self.title));

        out.push_str(&format!("\nStages ({}):\n", self.stage_entries.len()));
        for e in &self.stage_entries {
            out.push_str(&format!(
                "  [{}] {:?} \"{}\" x{}: {:+.3} mm^3\n",
                e.index, e.op, e.feature, e.items, e.delta,
            ));
            if e.coplanar_offsets > 0 {
                out.push_str(&format!(
                    "      {} tool prisms offset off a coplanar face\n",
                    e.coplanar_offsets
                ));
            }
        }

        if !self.fillet_entries.is_empty() {
            out.push_str("\nFillets:\n");
            for (group, outcome) in &self.fillet_entries {
                out.push_str(&format!("  {group}: {outcome}\n"));
            }
        }

        let (min, max) = (self.bounding_box.min, self.bounding_box.max);
        let size = self.bounding_box.size();
        out.push_str(&format!(
            "\nBounding Box: ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2}), {:.2} x {:.2} x {:.2} mm\n",
            min[0], min[1], min[2], max[0], max[1], max[2], size[0], size[1], size[2],
        ));
        out.push_str(&format!("Volume: {:.3} mm^3\n", self.volume));

        if !self.oracle_results.is_empty() {
            let passed = self.oracle_results.iter().filter(|v| v.passed).count();
            out.push_str(&format!(
                "\nOracle Results ({}/{} passed):\n",
                passed,
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        if self.warnings.is_empty() {
            out.push_str("\nWarnings: none\n");
        } else {
            out.push_str(&format!("\nWarnings ({}):\n", self.warnings.len()));
            for w in &self.warnings {
                out.push_str(&format!("  {w}\n"));
            }
        }

        out
    }
}

impl fmt::Display for ComponentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Machine-readable form of a build report and its checks.
pub fn to_json(report: &BuildReport, oracle_results: &[OracleVerdict]) -> Value {
    let passed = oracle_results.iter().all(|v| v.passed);
    json!({
        "report": report,
        "checks": oracle_results,
        "passed": passed,
    })
}
