//! Benchmark harness error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("No hosts matching '{prefix}' in state. Run: fleetscale provision <count>")]
    NoHosts { prefix: String },

    #[error("Unknown test '{name}' (available: {})", .available.join(", "))]
    UnknownOperation {
        name: String,
        available: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
