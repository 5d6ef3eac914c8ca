//! Linode provider implementation

use crate::api::{CreateInstanceBody, LinodeApi, LinodeInstance};
use crate::error::LinodeError;
use async_trait::async_trait;
use fleetscale_cloud::{
    AuthStatus, CloudError, CloudProvider, CreateOutcome, CreatedInstance, InstanceRequest,
};
use std::net::Ipv4Addr;

/// Linode provider
pub struct LinodeProvider {
    api: LinodeApi,
    root_pass: Option<String>,
    check_mode: bool,
}

impl LinodeProvider {
    pub fn new(api: LinodeApi) -> Self {
        Self {
            api,
            root_pass: None,
            check_mode: false,
        }
    }

    /// Root password for new instances
    pub fn with_root_pass(mut self, root_pass: Option<String>) -> Self {
        self.root_pass = root_pass;
        self
    }

    /// In check mode no request ever reaches the API
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    fn create_body(&self, request: &InstanceRequest) -> CreateInstanceBody {
        CreateInstanceBody {
            label: request.label.clone(),
            instance_type: request.instance_type.clone(),
            region: request.region.clone(),
            image: request.image.clone(),
            authorized_keys: request.authorized_keys.clone(),
            root_pass: self.root_pass.clone(),
            booted: true,
        }
    }
}

/// Turn a create response into a usable instance
///
/// Only IPv4 entries are kept, in the order the API returned them.
pub fn created_instance(
    label: &str,
    instance: LinodeInstance,
) -> fleetscale_cloud::Result<CreatedInstance> {
    let id = instance.id.ok_or_else(|| CloudError::MalformedResponse {
        name: label.to_string(),
        reason: "response has no instance id".to_string(),
    })?;

    let addresses: Vec<String> = instance
        .ipv4
        .into_iter()
        .filter(|a| a.parse::<Ipv4Addr>().is_ok())
        .collect();
    if addresses.is_empty() {
        // The instance exists but cannot be tracked without an address
        return Err(CloudError::MalformedResponse {
            name: label.to_string(),
            reason: format!(
                "instance {} was created without an IPv4 address and is not tracked; delete it manually",
                id
            ),
        });
    }

    Ok(CreatedInstance {
        id: id.to_string(),
        addresses,
    })
}

#[async_trait]
impl CloudProvider for LinodeProvider {
    fn name(&self) -> &str {
        "linode"
    }

    fn display_name(&self) -> &str {
        "Linode"
    }

    async fn check_auth(&self) -> fleetscale_cloud::Result<AuthStatus> {
        match self.api.profile().await {
            Ok(profile) => {
                let account = match profile.email {
                    Some(email) => format!("{} ({})", profile.username, email),
                    None => profile.username,
                };
                Ok(AuthStatus::ok(account))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn create_instance(
        &self,
        request: &InstanceRequest,
    ) -> fleetscale_cloud::Result<CreateOutcome> {
        if self.check_mode {
            tracing::debug!("Check mode: not creating {}", request.label);
            return Ok(CreateOutcome::Skipped);
        }

        match self.api.create_instance(&self.create_body(request)).await {
            Ok(instance) => {
                created_instance(&request.label, instance).map(CreateOutcome::Created)
            }
            Err(LinodeError::Api { status, message }) => {
                tracing::debug!("Linode rejected {} ({}): {}", request.label, status, message);
                Ok(CreateOutcome::Failed { reason: message })
            }
            Err(LinodeError::Json(e)) => Err(CloudError::MalformedResponse {
                name: request.label.clone(),
                reason: e.to_string(),
            }),
            Err(e) => Err(CloudError::provider(&request.label, e)),
        }
    }

    async fn destroy_instance(&self, label: &str, provider_id: &str) -> fleetscale_cloud::Result<()> {
        let id = if provider_id.is_empty() {
            let found = self
                .api
                .find_instance_by_label(label)
                .await
                .map_err(|e| CloudError::provider(label, e))?;
            match found.and_then(|i| i.id) {
                Some(id) => id.to_string(),
                None => {
                    tracing::warn!("{}: no instance with this label, nothing to destroy", label);
                    return Ok(());
                }
            }
        } else {
            provider_id.to_string()
        };

        let deleted = self
            .api
            .delete_instance(&id)
            .await
            .map_err(|e| CloudError::provider(label, e))?;
        if !deleted {
            tracing::info!("{}: instance {} already absent", label, id);
        }
        Ok(())
    }
}
