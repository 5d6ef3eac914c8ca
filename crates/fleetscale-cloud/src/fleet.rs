//! Fleet definition shared by the reconcilers

use crate::provider::InstanceRequest;
use std::time::Duration;

/// Everything the reconcilers need to know about the fleet
#[derive(Debug, Clone)]
pub struct FleetSpec {
    /// Name prefix; resources are named `<prefix>-<index>`
    pub prefix: String,
    pub instance_type: String,
    pub region: String,
    pub image: String,
    /// Public keys authorized for the login user
    pub authorized_keys: Vec<String>,
    /// Login user for management connections
    pub login_user: String,
    /// Engine/inventory group new hosts are placed in
    pub group: String,
    /// Bound on waiting for new nodes to become reachable
    pub reach_timeout: Duration,
    /// Dry run: no provider mutation, no state change
    pub check_mode: bool,
}

impl FleetSpec {
    pub fn resource_name(&self, index: usize) -> String {
        format!("{}-{}", self.prefix, index)
    }

    pub fn instance_request(&self, name: &str) -> InstanceRequest {
        InstanceRequest {
            label: name.to_string(),
            instance_type: self.instance_type.clone(),
            region: self.region.clone(),
            image: self.image.clone(),
            authorized_keys: self.authorized_keys.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_fleet() -> FleetSpec {
    FleetSpec {
        prefix: "ftl2-scale".to_string(),
        instance_type: "g6-nanode-1".to_string(),
        region: "us-east".to_string(),
        image: "linode/fedora43".to_string(),
        authorized_keys: vec!["ssh-ed25519 AAAA test".to_string()],
        login_user: "root".to_string(),
        group: "scale".to_string(),
        reach_timeout: Duration::from_secs(120),
        check_mode: false,
    }
}
