//! Cloud fleet error types

use std::fmt;
use thiserror::Error;

/// Cloud fleet errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Provider error for {name}: {reason}")]
    Provider { name: String, reason: String },

    #[error("Malformed provider response for {name}: {reason}")]
    MalformedResponse { name: String, reason: String },

    #[error("Nodes not reachable within {timeout_secs}s: {}", .pending.join(", "))]
    ReachabilityTimeout {
        pending: Vec<String>,
        timeout_secs: u64,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Engine error: {0}")]
    Engine(#[from] fleetscale_engine::EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn provider(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        CloudError::Provider {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// A reconciler run stopped by `error` after doing the work in `report`
#[derive(Debug)]
pub struct PartialRun<R> {
    pub error: CloudError,
    pub report: R,
}

impl<R> fmt::Display for PartialRun<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<R: fmt::Debug> std::error::Error for PartialRun<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// Result of a reconciler run; the error side keeps the partial report
pub type RunResult<R> = std::result::Result<R, PartialRun<R>>;
