//! Automation engine error types

use thiserror::Error;

/// Failure of a single host during a fanned-out operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub host: String,
    pub message: String,
}

impl std::fmt::Display for HostFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.host, self.message)
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No hosts registered")]
    NoHosts,

    #[error("{} host(s) failed: {}", .0.len(), join_failures(.0))]
    Hosts(Vec<HostFailure>),

    #[error("Hosts not reachable after {timeout_secs}s: {}", .pending.join(", "))]
    ReachabilityTimeout {
        pending: Vec<String>,
        timeout_secs: u64,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unexpected output from {host}: {message}")]
    Parse { host: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_failures(failures: &[HostFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, EngineError>;
