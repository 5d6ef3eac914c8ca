//! Host targets addressed by the engine

use serde::{Deserialize, Serialize};

/// A connectable host registered with the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTarget {
    /// Inventory name (e.g. "ftl2-scale-0")
    pub name: String,

    /// Address used for the management connection
    pub address: String,

    /// Login user
    pub user: String,

    /// Groups the host belongs to
    #[serde(default)]
    pub groups: Vec<String>,
}

impl HostTarget {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            user: user.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// `user@address` destination for the SSH client
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.address)
    }
}

/// Output of a successful command on one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOutput {
    pub host: String,
    pub stdout: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination() {
        let host = HostTarget::new("ftl2-scale-0", "203.0.113.10", "root").with_group("scale");
        assert_eq!(host.destination(), "root@203.0.113.10");
        assert_eq!(host.groups, vec!["scale".to_string()]);
    }
}
