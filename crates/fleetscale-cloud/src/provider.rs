//! Cloud provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cloud provider abstraction trait
///
/// Providers only need to create and destroy single instances; everything
/// else (idempotency, bookkeeping) is handled by the reconcilers.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name stored in resource records (e.g. "linode")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Create one instance
    ///
    /// API-level rejections are reported as [`CreateOutcome::Failed`]; `Err`
    /// covers transport failures and unusable responses.
    async fn create_instance(&self, request: &InstanceRequest) -> Result<CreateOutcome>;

    /// Destroy the instance with the given label / provider id
    async fn destroy_instance(&self, label: &str, provider_id: &str) -> Result<()>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Parameters for creating one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRequest {
    pub label: String,
    pub instance_type: String,
    pub region: String,
    pub image: String,
    pub authorized_keys: Vec<String>,
}

/// Instance returned by a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInstance {
    pub id: String,
    pub addresses: Vec<String>,
}

/// Result of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The instance now exists
    Created(CreatedInstance),
    /// Nothing was done (check mode)
    Skipped,
    /// The provider refused the request
    Failed { reason: String },
}
