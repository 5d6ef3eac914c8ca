//! Engine session: registered hosts plus the operations run against them

use crate::error::{EngineError, HostFailure, Result};
use crate::host::{HostOutput, HostTarget};
use crate::ops::{self, Facts, FileStat, FileState, PackageState};
use crate::transport::Transport;
use crate::waiter::WaitConfig;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};

/// Capability surface of the automation engine
///
/// Every operation is addressed to all currently registered hosts and fails
/// if any host fails.
#[async_trait]
pub trait Automation: Send + Sync {
    /// Register a connectable host for subsequent operations
    fn add_host(&mut self, host: HostTarget);

    /// Currently registered hosts
    fn hosts(&self) -> &[HostTarget];

    /// Block until every host accepts a management connection
    async fn wait_for_reachable(&self, timeout: Duration) -> Result<()>;

    async fn ping(&self) -> Result<Vec<HostOutput>>;

    async fn file(&self, path: &str, state: FileState) -> Result<()>;

    async fn stat(&self, path: &str) -> Result<Vec<(String, FileStat)>>;

    /// Write `content` to `dest` with the octal `mode`
    async fn copy(&self, dest: &str, content: &str, mode: &str) -> Result<()>;

    async fn command(&self, cmd: &str) -> Result<Vec<HostOutput>>;

    async fn package(&self, name: &str, state: PackageState) -> Result<()>;

    async fn gather_facts(&self) -> Result<Vec<(String, Facts)>>;
}

/// Engine session over a [`Transport`]
pub struct Engine<T: Transport> {
    transport: T,
    hosts: Vec<HostTarget>,
    check_mode: bool,
    wait: WaitConfig,
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            hosts: Vec::new(),
            check_mode: false,
            wait: WaitConfig::default(),
        }
    }

    /// In check mode mutating operations are logged and skipped
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_hosts(mut self, hosts: impl IntoIterator<Item = HostTarget>) -> Self {
        for host in hosts {
            self.add_host(host);
        }
        self
    }

    pub fn is_check_mode(&self) -> bool {
        self.check_mode
    }

    /// End the session, releasing transport state for every host
    pub async fn close(self) -> Result<()> {
        tracing::debug!("Closing engine session ({} hosts)", self.hosts.len());
        self.transport.close(&self.hosts).await
    }

    async fn run_all(&self, script: &str, stdin: Option<&[u8]>) -> Result<Vec<HostOutput>> {
        if self.hosts.is_empty() {
            return Err(EngineError::NoHosts);
        }

        let results = join_all(self.hosts.iter().map(|host| async move {
            (host, self.transport.exec(host, script, stdin).await)
        }))
        .await;

        let mut outputs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (host, result) in results {
            match result {
                Ok(out) if out.success() => outputs.push(HostOutput {
                    host: host.name.clone(),
                    stdout: out.stdout,
                }),
                Ok(out) => failures.push(HostFailure {
                    host: host.name.clone(),
                    message: out.failure_message(),
                }),
                Err(e) => failures.push(HostFailure {
                    host: host.name.clone(),
                    message: e.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            for failure in &failures {
                tracing::warn!("{}", failure);
            }
            return Err(EngineError::Hosts(failures));
        }
        Ok(outputs)
    }

    /// Run a mutating script unless in check mode
    async fn apply(&self, description: &str, script: &str, stdin: Option<&[u8]>) -> Result<()> {
        if self.check_mode {
            tracing::info!("check mode: would run {} on {} host(s)", description, self.hosts.len());
            return Ok(());
        }
        tracing::debug!("{} on {} host(s)", description, self.hosts.len());
        self.run_all(script, stdin).await.map(|_| ())
    }

    async fn is_reachable(&self, host: &HostTarget) -> bool {
        match self
            .transport
            .exec(host, ops::REACHABILITY_SCRIPT, None)
            .await
        {
            Ok(out) => out.success(),
            Err(e) => {
                tracing::debug!("Reachability check of {} failed: {}", host.name, e);
                false
            }
        }
    }
}

#[async_trait]
impl<T: Transport> Automation for Engine<T> {
    fn add_host(&mut self, host: HostTarget) {
        if let Some(existing) = self.hosts.iter_mut().find(|h| h.name == host.name) {
            *existing = host;
        } else {
            tracing::debug!("Registered host {} ({})", host.name, host.address);
            self.hosts.push(host);
        }
    }

    fn hosts(&self) -> &[HostTarget] {
        &self.hosts
    }

    async fn wait_for_reachable(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut pending: Vec<&HostTarget> = self.hosts.iter().collect();
        let mut attempt = 0;

        let timed_out = |pending: &[&HostTarget]| EngineError::ReachabilityTimeout {
            pending: pending.iter().map(|h| h.name.clone()).collect(),
            timeout_secs: timeout.as_secs(),
        };

        while !pending.is_empty() {
            let checks = join_all(pending.iter().map(|host| self.is_reachable(host)));
            let reachable = match timeout_at(deadline, checks).await {
                Ok(reachable) => reachable,
                Err(_) => return Err(timed_out(&pending)),
            };

            pending = pending
                .into_iter()
                .zip(reachable)
                .filter(|(_, ok)| !ok)
                .map(|(host, _)| host)
                .collect();
            if pending.is_empty() {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out(&pending));
            }
            tracing::debug!("{} host(s) not reachable yet", pending.len());
            sleep(self.wait.delay_for_attempt(attempt).min(deadline - now)).await;
            attempt += 1;
        }

        Ok(())
    }

    async fn ping(&self) -> Result<Vec<HostOutput>> {
        let outputs = self.run_all(ops::PING_SCRIPT, None).await?;
        let failures: Vec<HostFailure> = outputs
            .iter()
            .filter(|o| o.stdout.trim() != "pong")
            .map(|o| HostFailure {
                host: o.host.clone(),
                message: format!("unexpected ping reply '{}'", o.stdout.trim()),
            })
            .collect();
        if !failures.is_empty() {
            return Err(EngineError::Hosts(failures));
        }
        Ok(outputs)
    }

    async fn file(&self, path: &str, state: FileState) -> Result<()> {
        let script = ops::file_script(path, state)?;
        self.apply(&format!("file {} ({:?})", path, state), &script, None)
            .await
    }

    async fn stat(&self, path: &str) -> Result<Vec<(String, FileStat)>> {
        let script = ops::stat_script(path)?;
        self.run_all(&script, None)
            .await?
            .into_iter()
            .map(|o| ops::parse_stat(&o.host, &o.stdout).map(|stat| (o.host, stat)))
            .collect()
    }

    async fn copy(&self, dest: &str, content: &str, mode: &str) -> Result<()> {
        let script = ops::copy_script(dest, mode)?;
        self.apply(
            &format!("copy to {} (mode {})", dest, mode),
            &script,
            Some(content.as_bytes()),
        )
        .await
    }

    async fn command(&self, cmd: &str) -> Result<Vec<HostOutput>> {
        if self.check_mode {
            tracing::info!("check mode: would run '{}' on {} host(s)", cmd, self.hosts.len());
            return Ok(Vec::new());
        }
        self.run_all(cmd, None).await
    }

    async fn package(&self, name: &str, state: PackageState) -> Result<()> {
        let script = ops::package_script(name, state)?;
        self.apply(&format!("package {} ({:?})", name, state), &script, None)
            .await
    }

    async fn gather_facts(&self) -> Result<Vec<(String, Facts)>> {
        self.run_all(ops::FACTS_SCRIPT, None)
            .await?
            .into_iter()
            .map(|o| ops::parse_facts(&o.host, &o.stdout).map(|facts| (o.host, facts)))
            .collect()
    }
}
