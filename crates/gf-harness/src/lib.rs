//! Verification harness for the component pipeline.
//!
//! Provides programmatic tools for building components by name, checking
//! every build against the output contract, and producing readable reports.
//!
//! # Key Components
//!
//! - [`ComponentBench`]: named builds over one kernel session
//! - [`oracle`]: checks returning pass/fail verdicts
//! - [`report`]: structured text build reports
//! - [`helpers`]: error type, spec shortcuts, reference volumes
//! - [`assertions`]: assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::ComponentReport;
pub use workflow::ComponentBench;
