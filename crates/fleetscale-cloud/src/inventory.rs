//! Static host inventory projected from the state store
//!
//! The projection is a disposable artifact for the baseline tool: it is
//! regenerated from the full store after provisioning and deleted on teardown.

use crate::error::Result;
use crate::state::{StateStore, write_atomic};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes and removes the inventory file
#[derive(Debug, Clone)]
pub struct InventoryProjector {
    path: PathBuf,
    group: String,
}

impl InventoryProjector {
    pub fn new(path: impl Into<PathBuf>, group: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            group: group.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the inventory for every record whose name starts with `prefix`
    pub fn render(&self, store: &StateStore, prefix: &str, login_user: &str) -> Result<String> {
        let mut lines = vec![format!("[{}]", self.group)];
        for name in store.matching(prefix) {
            let record = store.get(&name)?;
            lines.push(format!(
                "{} ansible_host={} ansible_user={}",
                name,
                record.primary_address(),
                login_user
            ));
        }
        lines.push(String::new());
        Ok(lines.join("\n"))
    }

    /// Write the projection, returning the number of hosts in it
    pub async fn write(&self, store: &StateStore, prefix: &str, login_user: &str) -> Result<usize> {
        let content = self.render(store, prefix, login_user)?;
        write_atomic(&self.path, content.as_bytes(), false).await?;
        let hosts = store.matching(prefix).len();
        tracing::info!(
            "Inventory written to {} ({} hosts)",
            self.path.display(),
            hosts
        );
        Ok(hosts)
    }

    /// Delete the projection; returns whether a file was removed
    pub async fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).await?;
        tracing::info!("Inventory {} removed", self.path.display());
        Ok(true)
    }
}
