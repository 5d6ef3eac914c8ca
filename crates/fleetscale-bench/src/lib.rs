//! FleetScale benchmark harness
//!
//! Runs a fixed registry of configuration-management operations against the
//! provisioned fleet twice: once through `ansible-playbook` (the baseline)
//! and once through the FleetScale engine (the candidate), and reports the
//! wall-clock time of each and the resulting speedup.

pub mod baseline;
pub mod error;
pub mod harness;
pub mod operations;
pub mod report;
pub mod result;

#[cfg(test)]
mod testing;

pub use baseline::{AnsiblePlaybook, Baseline};
pub use error::{BenchError, Result};
pub use harness::{Harness, HarnessOptions, Preflight};
pub use operations::{BenchOperation, registry};
pub use report::{render_summary, write_json};
pub use result::{BackendOutcome, BenchmarkResult};
