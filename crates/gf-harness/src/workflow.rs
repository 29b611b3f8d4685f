//! ComponentBench: a fluent API for scripting component builds in tests.
//!
//! Goes through `gf_engine::build`, the same entry point every caller uses.
//! Builds are stored under readable names instead of report ids.

use std::collections::HashMap;

use gf_engine::{BuildOutput, BuildReport, EngineError};
use gf_kernel::{Kernel, MockKernel, SectionKernel, SolidHandle};
use gf_ops::KernelBundle;
use gf_types::{ComponentSpec, ConfigDocument};
use tracing::debug;

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};
use crate::report::ComponentReport;

/// Named component builds sharing one kernel session.
pub struct ComponentBench {
    pub(crate) kernel: Box<dyn KernelBundle>,
    outputs: HashMap<String, BuildOutput>,
    history: Vec<(String, String)>,
    auto_check: bool,
}

impl ComponentBench {
    /// Bench over the analytic section kernel.
    pub fn section() -> Self {
        Self::with_kernel(Box::new(SectionKernel::new()))
    }

    /// Bench over a mock kernel, usually with faults configured.
    pub fn mock(kernel: MockKernel) -> Self {
        Self::with_kernel(Box::new(kernel))
    }

    fn with_kernel(kernel: Box<dyn KernelBundle>) -> Self {
        Self {
            kernel,
            outputs: HashMap::new(),
            history: Vec::new(),
            auto_check: false,
        }
    }

    /// Run the standard build checks after every successful build and turn
    /// the first failing one into an error.
    pub fn with_auto_check(mut self) -> Self {
        self.auto_check = true;
        self
    }

    pub fn kernel(&self) -> &dyn KernelBundle {
        &*self.kernel
    }

    // ── Builds ──────────────────────────────────────────────────────────

    pub fn build(&mut self, name: &str, spec: ComponentSpec) -> Result<&BuildReport, HarnessError> {
        let doc = ConfigDocument::from_spec(spec)?;
        self.build_document(name, &doc)
    }

    /// Build from a saved component file.
    pub fn build_file(&mut self, name: &str, json: &str) -> Result<&BuildReport, HarnessError> {
        let loaded = gf_format::load_component(json)?;
        self.build_document(name, &loaded.document)
    }

    pub fn build_document(&mut self, name: &str, doc: &ConfigDocument) -> Result<&BuildReport, HarnessError> {
        self.check_name_available(name)?;
        let output = match gf_engine::build(doc, &mut *self.kernel) {
            Ok(out) => out,
            Err(e) => {
                self.history.push((name.to_string(), format!("failed: {e}")));
                return Err(e.into());
            }
        };
        debug!(name, filename = %output.report.filename, "bench build");

        if self.auto_check {
            let verdicts = oracle::run_build_checks(self.kernel.as_introspect(), &output);
            if let Some(v) = verdicts.into_iter().find(|v| !v.passed) {
                self.kernel.release(output.solid);
                self.history.push((name.to_string(), format!("check failed: {}", v.oracle_name)));
                return Err(HarnessError::OracleFailure {
                    oracle: v.oracle_name,
                    detail: format!("[{name}] {}", v.detail),
                });
            }
        }

        self.history.push((name.to_string(), output.report.filename.clone()));
        let output = self.outputs.entry(name.to_string()).or_insert(output);
        Ok(&output.report)
    }

    /// Build without storing anything; for configurations expected to fail.
    pub fn try_build(&mut self, spec: ComponentSpec) -> Result<BuildOutput, EngineError> {
        let doc = ConfigDocument::from_spec(spec).map_err(|e| EngineError::Rejected(e.into()))?;
        gf_engine::build(&doc, &mut *self.kernel)
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn report(&self, name: &str) -> Result<&BuildReport, HarnessError> {
        Ok(&self.output(name)?.report)
    }

    pub fn solid(&self, name: &str) -> Result<&SolidHandle, HarnessError> {
        Ok(&self.output(name)?.solid)
    }

    /// Standard build checks for a stored build.
    pub fn checks(&self, name: &str) -> Result<Vec<OracleVerdict>, HarnessError> {
        let output = self.output(name)?;
        Ok(oracle::run_build_checks(self.kernel.as_introspect(), output))
    }

    pub fn text_report(&self, name: &str) -> Result<String, HarnessError> {
        let verdicts = self.checks(name)?;
        let report = ComponentReport::from_build(name, self.report(name)?, verdicts);
        Ok(report.to_text())
    }

    pub fn json_report(&self, name: &str) -> Result<serde_json::Value, HarnessError> {
        let verdicts = self.checks(name)?;
        Ok(crate::report::to_json(self.report(name)?, &verdicts))
    }

    /// Release a stored build's solid and forget it.
    pub fn release(&mut self, name: &str) -> Result<(), HarnessError> {
        let output = self
            .outputs
            .remove(name)
            .ok_or_else(|| HarnessError::ComponentNotFound {
                name: name.to_string(),
            })?;
        self.kernel.release(output.solid);
        Ok(())
    }

    /// Release every stored build.
    pub fn release_all(&mut self) {
        for (_, output) in self.outputs.drain() {
            self.kernel.release(output.solid);
        }
    }

    pub fn live_solids(&self) -> usize {
        self.kernel.as_introspect().solid_count()
    }

    /// (name, outcome) for every build attempted through the bench.
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    fn output(&self, name: &str) -> Result<&BuildOutput, HarnessError> {
        self.outputs
            .get(name)
            .ok_or_else(|| HarnessError::ComponentNotFound {
                name: name.to_string(),
            })
    }

    fn check_name_available(&self, name: &str) -> Result<(), HarnessError> {
        if self.outputs.contains_key(name) {
            return Err(HarnessError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
