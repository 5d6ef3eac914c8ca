//! Benchmark run loop

use crate::baseline::Baseline;
use crate::error::{BenchError, Result};
use crate::operations::{BenchOperation, registry};
use crate::result::{BackendOutcome, BenchmarkResult};
use fleetscale_cloud::StateStore;
use fleetscale_engine::Automation;
use tokio::time::Instant;

/// Which backends run and which hosts count
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    /// Resource name prefix used to count active hosts
    pub prefix: String,
    pub skip_baseline: bool,
    pub skip_candidate: bool,
}

impl HarnessOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            skip_baseline: false,
            skip_candidate: false,
        }
    }
}

/// Preconditions checked before any backend runs
pub struct Preflight<'a> {
    pub hosts: usize,
    pub operations: Vec<&'a dyn BenchOperation>,
}

pub struct Harness {
    operations: Vec<Box<dyn BenchOperation>>,
    options: HarnessOptions,
}

impl Harness {
    pub fn new(options: HarnessOptions) -> Self {
        Self {
            operations: registry(),
            options,
        }
    }

    /// Replace the built-in registry
    pub fn with_operations(mut self, operations: Vec<Box<dyn BenchOperation>>) -> Self {
        self.operations = operations;
        self
    }

    pub fn options(&self) -> &HarnessOptions {
        &self.options
    }

    /// Operations to run: all of them, or the single one named by `selection`
    pub fn select(&self, selection: Option<&str>) -> Result<Vec<&dyn BenchOperation>> {
        let all = self.operations.iter().map(|op| op.as_ref());
        let Some(name) = selection else {
            return Ok(all.collect());
        };

        let selected: Vec<&dyn BenchOperation> = all.filter(|op| op.name() == name).collect();
        if selected.is_empty() {
            return Err(BenchError::UnknownOperation {
                name: name.to_string(),
                available: self
                    .operations
                    .iter()
                    .map(|op| op.name().to_string())
                    .collect(),
            });
        }
        Ok(selected)
    }

    /// Validate the selection and count the active hosts
    pub fn preflight(&self, store: &StateStore, selection: Option<&str>) -> Result<Preflight<'_>> {
        let operations = self.select(selection)?;
        let hosts = store.matching(&self.options.prefix).len();
        if hosts == 0 {
            return Err(BenchError::NoHosts {
                prefix: self.options.prefix.clone(),
            });
        }
        Ok(Preflight { hosts, operations })
    }

    /// Run every selected operation through both backends, in registry order
    ///
    /// Backend failures are recorded in the results and never abort the run.
    pub async fn run(
        &self,
        store: &StateStore,
        engine: &dyn Automation,
        baseline: &dyn Baseline,
        selection: Option<&str>,
    ) -> Result<Vec<BenchmarkResult>> {
        let preflight = self.preflight(store, selection)?;
        tracing::info!(
            "Scale test: {} hosts, {} test(s)",
            preflight.hosts,
            preflight.operations.len()
        );

        let mut results = Vec::with_capacity(preflight.operations.len());
        for op in preflight.operations {
            results.push(self.run_one(op, preflight.hosts, engine, baseline).await);
        }
        Ok(results)
    }

    async fn run_one(
        &self,
        op: &dyn BenchOperation,
        hosts: usize,
        engine: &dyn Automation,
        baseline: &dyn Baseline,
    ) -> BenchmarkResult {
        tracing::info!("{}: {}", op.name(), op.description());
        let mut result = BenchmarkResult::new(op.name(), op.description(), hosts);

        if !self.options.skip_baseline {
            let outcome = baseline.run(&op.playbook()).await;
            tracing::info!(
                "  {}: {:.3}s [{}]",
                baseline.name(),
                outcome.time,
                outcome.status()
            );
            result.baseline = Some(outcome);
        }

        if !self.options.skip_candidate {
            let start = Instant::now();
            let outcome = match op.run_candidate(engine).await {
                Ok(()) => BackendOutcome::ok(start.elapsed()),
                Err(e) => {
                    tracing::warn!("  {}: {}", op.name(), e);
                    BackendOutcome::failed(start.elapsed())
                }
            };
            tracing::info!("  engine: {:.3}s [{}]", outcome.time, outcome.status());
            result.candidate = Some(outcome);
        }

        result.compute_speedup();
        if let Some(speedup) = result.speedup {
            tracing::info!("  speedup: {:.1}x", speedup);
        }
        result
    }
}
