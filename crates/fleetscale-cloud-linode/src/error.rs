//! Linode provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinodeError {
    #[error("Linode API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LinodeError>;
