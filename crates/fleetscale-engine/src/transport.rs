//! Remote command transport
//!
//! The engine talks to hosts through [`Transport`]. [`SshTransport`] wraps the
//! OpenSSH client and multiplexes connections through control sockets kept in
//! a private temporary directory.

use crate::error::Result;
use crate::host::HostTarget;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Raw result of running a script on one host
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// Exit status, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Human readable failure description
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.status, stderr.is_empty()) {
            (Some(code), true) => format!("exit status {}", code),
            (Some(code), false) => format!("exit status {}: {}", code, stderr),
            (None, true) => "terminated by signal".to_string(),
            (None, false) => format!("terminated by signal: {}", stderr),
        }
    }
}

/// Runs shell scripts on remote hosts
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run `script` on `host`, feeding `stdin` if given.
    ///
    /// A non-zero exit is reported through [`ExecOutput::status`]; `Err` is
    /// reserved for failures to run the client at all.
    async fn exec(&self, host: &HostTarget, script: &str, stdin: Option<&[u8]>)
    -> Result<ExecOutput>;

    /// Release any per-host connection state
    async fn close(&self, _hosts: &[HostTarget]) -> Result<()> {
        Ok(())
    }
}

/// Transport backed by the `ssh` client
pub struct SshTransport {
    control_dir: TempDir,
    connect_timeout_secs: u64,
}

impl SshTransport {
    pub fn new() -> Result<Self> {
        let control_dir = tempfile::Builder::new()
            .prefix("fleetscale-ssh-")
            .tempdir()?;
        tracing::debug!("SSH control directory: {}", control_dir.path().display());
        Ok(Self {
            control_dir,
            connect_timeout_secs: 10,
        })
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn control_dir(&self) -> &Path {
        self.control_dir.path()
    }

    fn control_path(&self) -> String {
        format!("ControlPath={}/%C", self.control_dir.path().display())
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("UserKnownHostsFile=/dev/null")
            .arg("-o")
            .arg("LogLevel=ERROR")
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs))
            .arg("-o")
            .arg("ControlMaster=auto")
            .arg("-o")
            .arg(self.control_path())
            .arg("-o")
            .arg("ControlPersist=60");
        cmd
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn exec(
        &self,
        host: &HostTarget,
        script: &str,
        stdin: Option<&[u8]>,
    ) -> Result<ExecOutput> {
        let mut cmd = self.base_command();
        cmd.arg(host.destination()).arg(script);
        tracing::debug!("Running on {}: {}", host.name, script);
        run_command(cmd, stdin).await
    }

    async fn close(&self, hosts: &[HostTarget]) -> Result<()> {
        for host in hosts {
            let status = self
                .base_command()
                .arg("-O")
                .arg("exit")
                .arg(host.destination())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if let Err(e) = status {
                tracing::debug!("Failed to stop SSH master for {}: {}", host.name, e);
            }
        }
        Ok(())
    }
}

/// Run `cmd` to completion, feeding it `stdin` if given
///
/// The child is killed when the returned future is dropped, so a caller-side
/// timeout never leaves `ssh` processes behind.
async fn run_command(mut cmd: Command, stdin: Option<&[u8]>) -> Result<ExecOutput> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn()?;
    if let Some(input) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        pipe.write_all(input).await?;
        // Closing the pipe signals EOF to the remote side
        drop(pipe);
    }

    let output = child.wait_with_output().await?;
    Ok(ExecOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Quote a string for a POSIX shell
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
