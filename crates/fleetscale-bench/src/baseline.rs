//! Reference backend executed as an external process

use crate::result::BackendOutcome;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::Instant;

/// Bytes of stderr kept when a baseline run fails
const STDERR_TAIL: usize = 200;

/// Baseline backend contract
///
/// Failures are reported in the outcome; a baseline never errors.
#[async_trait]
pub trait Baseline: Send + Sync {
    fn name(&self) -> &str;

    /// Run the playbook called `playbook` (a file name such as `gather_facts.yml`)
    async fn run(&self, playbook: &str) -> BackendOutcome;
}

/// `ansible-playbook <playbook_dir>/<playbook> -i <inventory>`
#[derive(Debug, Clone)]
pub struct AnsiblePlaybook {
    program: PathBuf,
    playbook_dir: PathBuf,
    inventory: PathBuf,
}

impl AnsiblePlaybook {
    pub fn new(playbook_dir: impl Into<PathBuf>, inventory: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("ansible-playbook"),
            playbook_dir: playbook_dir.into(),
            inventory: inventory.into(),
        }
    }

    /// Use a different executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn playbook_path(&self, playbook: &str) -> PathBuf {
        self.playbook_dir.join(playbook)
    }

    pub fn inventory(&self) -> &Path {
        &self.inventory
    }
}

/// Last `max` bytes of `stderr`, lossily decoded
pub fn stderr_tail(stderr: &[u8], max: usize) -> String {
    let start = stderr.len().saturating_sub(max);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[async_trait]
impl Baseline for AnsiblePlaybook {
    fn name(&self) -> &str {
        "ansible"
    }

    async fn run(&self, playbook: &str) -> BackendOutcome {
        let path = self.playbook_path(playbook);
        if !path.exists() {
            tracing::warn!("Playbook {} not found, baseline skipped", path.display());
            return BackendOutcome::not_run();
        }

        tracing::debug!(
            "Running: {} {} -i {}",
            self.program.display(),
            path.display(),
            self.inventory.display()
        );

        let start = Instant::now();
        let output = Command::new(&self.program)
            .arg(&path)
            .arg("-i")
            .arg(&self.inventory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;
        let elapsed = start.elapsed();

        match output {
            Ok(output) if output.status.success() => BackendOutcome::ok(elapsed),
            Ok(output) => {
                let tail = stderr_tail(&output.stderr, STDERR_TAIL);
                if tail.is_empty() {
                    tracing::warn!("{} exited with {}", playbook, output.status);
                } else {
                    tracing::warn!("{} exited with {}: {}", playbook, output.status, tail);
                }
                BackendOutcome::failed(elapsed)
            }
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.program.display(), e);
                BackendOutcome::failed(elapsed)
            }
        }
    }
}
