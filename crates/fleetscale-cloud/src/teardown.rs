//! Teardown reconciler
//!
//! Destroys every tracked resource matching the fleet prefix. A failed destroy
//! stops the run; entries already destroyed stay removed, so running teardown
//! again resumes with what is left.

use crate::action::{Action, ActionType, Plan};
use crate::error::{CloudError, PartialRun, Result, RunResult};
use crate::fleet::FleetSpec;
use crate::inventory::InventoryProjector;
use crate::provider::CloudProvider;
use crate::state::StateStore;

/// Outcome of a teardown run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Names destroyed in this run
    pub destroyed: Vec<String>,
    /// Names that would be destroyed (check mode)
    pub planned: Vec<String>,
    /// Whether the inventory projection was deleted
    pub inventory_removed: bool,
    /// Names still tracked when the run stopped on a failure
    pub remaining: Vec<String>,
}

pub struct Teardown<'a> {
    fleet: &'a FleetSpec,
    provider: &'a dyn CloudProvider,
    inventory: &'a InventoryProjector,
}

impl<'a> Teardown<'a> {
    pub fn new(
        fleet: &'a FleetSpec,
        provider: &'a dyn CloudProvider,
        inventory: &'a InventoryProjector,
    ) -> Self {
        Self {
            fleet,
            provider,
            inventory,
        }
    }

    pub fn plan(&self, store: &StateStore) -> Plan {
        Plan::new(
            store
                .matching(&self.fleet.prefix)
                .into_iter()
                .map(|name| Action::new(name, ActionType::Delete, "destroy instance"))
                .collect(),
        )
    }

    /// Destroy every matching resource, then delete the inventory projection
    ///
    /// On failure the returned [`PartialRun`] reports what was destroyed and
    /// what is still tracked.
    pub async fn run(&self, store: &mut StateStore) -> RunResult<TeardownReport> {
        let mut report = TeardownReport::default();
        match self.destroy_all(store, &mut report).await {
            Ok(()) => Ok(report),
            Err(error) => {
                report.remaining = store.matching(&self.fleet.prefix);
                Err(PartialRun { error, report })
            }
        }
    }

    async fn destroy_all(&self, store: &mut StateStore, report: &mut TeardownReport) -> Result<()> {
        let names = store.matching(&self.fleet.prefix);

        if names.is_empty() {
            tracing::info!("No nodes matching '{}' found in state", self.fleet.prefix);
        }

        for name in names {
            let record = store.get(&name)?;
            let (label, provider_id) = (record.label.clone(), record.provider_id.clone());

            if self.fleet.check_mode {
                tracing::info!(
                    "{} ({}): would be destroyed (check mode)",
                    name,
                    record.primary_address()
                );
                report.planned.push(name);
                continue;
            }

            tracing::info!("{} ({}): destroying...", name, record.primary_address());
            self.provider
                .destroy_instance(&label, &provider_id)
                .await
                .map_err(|e| match e {
                    e @ CloudError::Provider { .. } => e,
                    other => CloudError::provider(&name, other),
                })?;

            store.remove(&name).await?;
            tracing::info!("{}: destroyed", name);
            report.destroyed.push(name);
        }

        if !self.fleet.check_mode {
            report.inventory_removed = self.inventory.remove().await?;
        }

        Ok(())
    }
}
