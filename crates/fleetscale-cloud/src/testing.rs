//! Test doubles for the provider and engine seams

use crate::error::{CloudError, Result};
use crate::provider::{AuthStatus, CloudProvider, CreateOutcome, CreatedInstance, InstanceRequest};
use async_trait::async_trait;
use fleetscale_engine::{
    Automation, EngineError, Facts, FileStat, FileState, HostOutput, HostTarget, PackageState,
};
use std::sync::Mutex;
use std::time::Duration;

/// Provider that hands out sequential addresses and can be told to fail
#[derive(Default)]
pub struct FakeProvider {
    pub check_mode: bool,
    pub fail_create: Option<String>,
    pub fail_destroy: Option<String>,
    pub created: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn create_calls(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn destroy_calls(&self) -> Vec<(String, String)> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn display_name(&self) -> &str {
        "Fake Cloud"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok("tester"))
    }

    async fn create_instance(&self, request: &InstanceRequest) -> Result<CreateOutcome> {
        if self.check_mode {
            return Ok(CreateOutcome::Skipped);
        }
        if self.fail_create.as_deref() == Some(request.label.as_str()) {
            return Ok(CreateOutcome::Failed {
                reason: "region capacity exhausted".to_string(),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(request.label.clone());
        let n = created.len();
        Ok(CreateOutcome::Created(CreatedInstance {
            id: format!("{}", 1000 + n),
            addresses: vec![format!("10.0.0.{}", n)],
        }))
    }

    async fn destroy_instance(&self, label: &str, provider_id: &str) -> Result<()> {
        if self.fail_destroy.as_deref() == Some(label) {
            return Err(CloudError::provider(label, "API unavailable"));
        }
        self.destroyed
            .lock()
            .unwrap()
            .push((label.to_string(), provider_id.to_string()));
        Ok(())
    }
}

/// Engine that records registrations and reachability waits
#[derive(Default)]
pub struct RecordingEngine {
    pub hosts: Vec<HostTarget>,
    pub waits: Mutex<Vec<Duration>>,
    pub never_reachable: bool,
}

#[async_trait]
impl Automation for RecordingEngine {
    fn add_host(&mut self, host: HostTarget) {
        self.hosts.push(host);
    }

    fn hosts(&self) -> &[HostTarget] {
        &self.hosts
    }

    async fn wait_for_reachable(&self, timeout: Duration) -> fleetscale_engine::Result<()> {
        self.waits.lock().unwrap().push(timeout);
        if self.never_reachable {
            return Err(EngineError::ReachabilityTimeout {
                pending: self.hosts.iter().map(|h| h.name.clone()).collect(),
                timeout_secs: timeout.as_secs(),
            });
        }
        Ok(())
    }

    async fn ping(&self) -> fleetscale_engine::Result<Vec<HostOutput>> {
        Ok(Vec::new())
    }

    async fn file(&self, _path: &str, _state: FileState) -> fleetscale_engine::Result<()> {
        Ok(())
    }

    async fn stat(&self, _path: &str) -> fleetscale_engine::Result<Vec<(String, FileStat)>> {
        Ok(Vec::new())
    }

    async fn copy(&self, _dest: &str, _content: &str, _mode: &str) -> fleetscale_engine::Result<()> {
        Ok(())
    }

    async fn command(&self, _cmd: &str) -> fleetscale_engine::Result<Vec<HostOutput>> {
        Ok(Vec::new())
    }

    async fn package(&self, _name: &str, _state: PackageState) -> fleetscale_engine::Result<()> {
        Ok(())
    }

    async fn gather_facts(&self) -> fleetscale_engine::Result<Vec<(String, Facts)>> {
        Ok(Vec::new())
    }
}
