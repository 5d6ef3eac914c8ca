//! Test doubles for the engine and baseline seams

use crate::baseline::Baseline;
use crate::result::BackendOutcome;
use async_trait::async_trait;
use fleetscale_engine::{
    Automation, EngineError, Facts, FileStat, FileState, HostFailure, HostOutput, HostTarget,
    PackageState, Result,
};
use std::sync::Mutex;
use std::time::Duration;

/// Engine that records each call as a line of text and can fail one of them
#[derive(Default)]
pub struct ScriptedEngine {
    pub hosts: Vec<HostTarget>,
    pub fail_on: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        let failed = self.fail_on.as_deref() == Some(call.as_str());
        self.calls.lock().unwrap().push(call);
        if failed {
            return Err(EngineError::Hosts(vec![HostFailure {
                host: "ftl2-scale-0".to_string(),
                message: "exit status 1".to_string(),
            }]));
        }
        Ok(())
    }
}

fn file_state(state: FileState) -> &'static str {
    match state {
        FileState::Touch => "touch",
        FileState::Absent => "absent",
        FileState::Directory => "directory",
    }
}

fn package_state(state: PackageState) -> &'static str {
    match state {
        PackageState::Present => "present",
        PackageState::Absent => "absent",
    }
}

#[async_trait]
impl Automation for ScriptedEngine {
    fn add_host(&mut self, host: HostTarget) {
        self.hosts.push(host);
    }

    fn hosts(&self) -> &[HostTarget] {
        &self.hosts
    }

    async fn wait_for_reachable(&self, _timeout: Duration) -> Result<()> {
        self.record("wait".to_string())
    }

    async fn ping(&self) -> Result<Vec<HostOutput>> {
        self.record("ping".to_string())?;
        Ok(Vec::new())
    }

    async fn file(&self, path: &str, state: FileState) -> Result<()> {
        self.record(format!("file {} {}", path, file_state(state)))
    }

    async fn stat(&self, path: &str) -> Result<Vec<(String, FileStat)>> {
        self.record(format!("stat {}", path))?;
        Ok(Vec::new())
    }

    async fn copy(&self, dest: &str, _content: &str, mode: &str) -> Result<()> {
        self.record(format!("copy {} {}", dest, mode))
    }

    async fn command(&self, cmd: &str) -> Result<Vec<HostOutput>> {
        self.record(format!("command {}", cmd))?;
        Ok(Vec::new())
    }

    async fn package(&self, name: &str, state: PackageState) -> Result<()> {
        self.record(format!("package {} {}", name, package_state(state)))
    }

    async fn gather_facts(&self) -> Result<Vec<(String, Facts)>> {
        self.record("gather_facts".to_string())?;
        Ok(Vec::new())
    }
}

/// Baseline that sleeps for `time` and reports `success`
pub struct FixedBaseline {
    pub time: Duration,
    pub success: bool,
    pub runs: Mutex<Vec<String>>,
}

impl FixedBaseline {
    pub fn new(time: Duration, success: bool) -> Self {
        Self {
            time,
            success,
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Baseline for FixedBaseline {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn run(&self, playbook: &str) -> BackendOutcome {
        self.runs.lock().unwrap().push(playbook.to_string());
        tokio::time::sleep(self.time).await;
        if self.success {
            BackendOutcome::ok(self.time)
        } else {
            BackendOutcome::failed(self.time)
        }
    }
}
