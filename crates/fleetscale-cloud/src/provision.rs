//! Provisioning reconciler
//!
//! Drives the fleet toward `count` resources named `<prefix>-0 .. <prefix>-(count-1)`,
//! creating only names the state store does not track yet.

use crate::action::{Action, ActionType, Plan};
use crate::error::{CloudError, PartialRun, Result, RunResult};
use crate::fleet::FleetSpec;
use crate::inventory::InventoryProjector;
use crate::provider::{CloudProvider, CreateOutcome};
use crate::state::{ResourceRecord, StateStore};
use fleetscale_engine::{Automation, EngineError, HostTarget};

/// Outcome of a provisioning run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Names that were already tracked
    pub existing: Vec<String>,
    /// Names created in this run
    pub created: Vec<String>,
    /// Names that would have been created (check mode)
    pub skipped: Vec<String>,
    /// Tracked resources matching the prefix after the run
    pub total: usize,
    /// Hosts in the inventory projection
    pub inventory_hosts: usize,
}

pub struct Provisioner<'a> {
    fleet: &'a FleetSpec,
    provider: &'a dyn CloudProvider,
    inventory: &'a InventoryProjector,
}

impl<'a> Provisioner<'a> {
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

    /// What a run with `count` would do against the current state
    pub fn plan(&self, store: &StateStore, count: usize) -> Plan {
        let actions = (0..count)
            .map(|i| {
                let name = self.fleet.resource_name(i);
                if store.has(&name) {
                    Action::new(name, ActionType::NoOp, "already tracked")
                } else {
                    let description = format!(
                        "create {} in {} from {}",
                        self.fleet.instance_type, self.fleet.region, self.fleet.image
                    );
                    Action::new(name, ActionType::Create, description)
                }
            })
            .collect();
        Plan::new(actions)
    }

    /// Create every missing resource, then wait for the new nodes and
    /// regenerate the inventory.
    ///
    /// Stops at the first failed create; resources created before it stay
    /// tracked, are listed in the [`PartialRun`] report and still land in the
    /// inventory. New hosts are registered with `engine`, and the
    /// reachability wait covers every host registered on it.
    pub async fn run(
        &self,
        store: &mut StateStore,
        engine: &mut dyn Automation,
        count: usize,
    ) -> RunResult<ProvisionReport> {
        let mut report = ProvisionReport::default();
        let outcome = self.create_all(store, engine, count, &mut report).await;

        report.total = store.matching(&self.fleet.prefix).len();
        let projected = if self.fleet.check_mode {
            Ok(report.total)
        } else {
            self.inventory
                .write(store, &self.fleet.prefix, &self.fleet.login_user)
                .await
        };

        match (outcome, projected) {
            (Ok(()), Ok(hosts)) => {
                report.inventory_hosts = hosts;
                Ok(report)
            }
            (Ok(()), Err(error)) => Err(PartialRun { error, report }),
            (Err(error), projected) => {
                match projected {
                    Ok(hosts) => report.inventory_hosts = hosts,
                    Err(e) => tracing::warn!("Failed to write inventory: {}", e),
                }
                Err(PartialRun { error, report })
            }
        }
    }

    async fn create_all(
        &self,
        store: &mut StateStore,
        engine: &mut dyn Automation,
        count: usize,
        report: &mut ProvisionReport,
    ) -> Result<()> {
        for i in 0..count {
            let name = self.fleet.resource_name(i);

            if store.has(&name) {
                let record = store.get(&name)?;
                tracing::info!("{}: exists ({})", name, record.primary_address());
                report.existing.push(name);
                continue;
            }

            tracing::info!("{}: provisioning...", name);
            let request = self.fleet.instance_request(&name);
            let outcome = self
                .provider
                .create_instance(&request)
                .await
                .map_err(|e| match e {
                    e @ (CloudError::Provider { .. } | CloudError::MalformedResponse { .. }) => e,
                    other => CloudError::provider(&name, other),
                })?;

            match outcome {
                CreateOutcome::Skipped => {
                    tracing::info!("{}: would be created (check mode)", name);
                    report.skipped.push(name);
                }
                CreateOutcome::Failed { reason } => {
                    tracing::error!("{}: creation failed: {}", name, reason);
                    return Err(CloudError::provider(name, reason));
                }
                CreateOutcome::Created(instance) => {
                    let record = ResourceRecord::new(
                        &name,
                        self.provider.name(),
                        instance.id,
                        instance.addresses,
                    )?;
                    let address = record.primary_address().to_string();
                    store.add(record).await?;

                    engine.add_host(
                        HostTarget::new(&name, &address, &self.fleet.login_user)
                            .with_group(&self.fleet.group),
                    );
                    tracing::info!("{}: created ({})", name, address);
                    report.created.push(name);
                }
            }
        }

        if !report.created.is_empty() && !self.fleet.check_mode {
            tracing::info!(
                "Waiting for {} new node(s) to become reachable...",
                report.created.len()
            );
            engine
                .wait_for_reachable(self.fleet.reach_timeout)
                .await
                .map_err(|e| match e {
                    EngineError::ReachabilityTimeout {
                        pending,
                        timeout_secs,
                    } => CloudError::ReachabilityTimeout {
                        pending,
                        timeout_secs,
                    },
                    other => other.into(),
                })?;
            tracing::info!("All nodes reachable");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::test_fleet;
    use crate::testing::{FakeProvider, RecordingEngine};
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        dir: TempDir,
        fleet: FleetSpec,
        inventory: InventoryProjector,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let inventory = InventoryProjector::new(dir.path().join("ansible-inventory"), "scale");
            Self {
                dir,
                fleet: test_fleet(),
                inventory,
            }
        }

        async fn store(&self) -> StateStore {
            StateStore::open(self.dir.path().join("state.json"))
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_provision_creates_all_and_writes_inventory() {
        let fx = Fixture::new();
        let provider = FakeProvider::default();
        let mut engine = RecordingEngine::default();
        let mut store = fx.store().await;

        let report = Provisioner::new(&fx.fleet, &provider, &fx.inventory)
            .run(&mut store, &mut engine, 3)
            .await
            .unwrap();

        assert_eq!(
            report.created,
            vec!["ftl2-scale-0", "ftl2-scale-1", "ftl2-scale-2"]
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.inventory_hosts, 3);
        assert_eq!(engine.hosts.len(), 3);
        assert_eq!(engine.hosts[0].groups, vec!["scale".to_string()]);
        assert_eq!(engine.waits.lock().unwrap().len(), 1);

        let record = store.get("ftl2-scale-1").unwrap();
        assert_eq!(record.provider, "fake");
        assert_eq!(record.label, "ftl2-scale-1");

        let inventory = std::fs::read_to_string(fx.inventory.path()).unwrap();
        assert!(inventory.starts_with("[scale]\n"));
        assert!(inventory.contains("ftl2-scale-2 ansible_host=10.0.0.3 ansible_user=root"));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let fx = Fixture::new();
        let provider = FakeProvider::default();
        let mut store = fx.store().await;
        let provisioner = Provisioner::new(&fx.fleet, &provider, &fx.inventory);

        provisioner
            .run(&mut store, &mut RecordingEngine::default(), 3)
            .await
            .unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let mut engine = RecordingEngine::default();
        let mut reopened = fx.store().await;
        let report = provisioner.run(&mut reopened, &mut engine, 3).await.unwrap();

        assert_eq!(provider.create_calls().len(), 3);
        assert!(report.created.is_empty());
        assert_eq!(report.existing.len(), 3);
        assert!(engine.waits.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(reopened.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_growth_creates_only_new_indices() {
        let fx = Fixture::new();
        let provider = FakeProvider::default();
        let mut store = fx.store().await;
        let provisioner = Provisioner::new(&fx.fleet, &provider, &fx.inventory);

        provisioner
            .run(&mut store, &mut RecordingEngine::default(), 2)
            .await
            .unwrap();
        let report = provisioner
            .run(&mut store, &mut RecordingEngine::default(), 5)
            .await
            .unwrap();

        assert_eq!(
            report.created,
            vec!["ftl2-scale-2", "ftl2-scale-3", "ftl2-scale-4"]
        );
        assert_eq!(report.total, 5);
        assert_eq!(provider.create_calls().len(), 5);
    }

    #[tokio::test]
    async fn test_create_failure_aborts_batch() {
        let fx = Fixture::new();
        let provider = FakeProvider {
            fail_create: Some("ftl2-scale-2".to_string()),
            ..Default::default()
        };
        let mut engine = RecordingEngine::default();
        let mut store = fx.store().await;

        let failure = Provisioner::new(&fx.fleet, &provider, &fx.inventory)
            .run(&mut store, &mut engine, 5)
            .await
            .unwrap_err();

        assert!(
            matches!(failure.error, CloudError::Provider { ref name, .. } if name == "ftl2-scale-2")
        );
        assert_eq!(failure.report.created, vec!["ftl2-scale-0", "ftl2-scale-1"]);
        assert_eq!(failure.report.total, 2);
        assert_eq!(failure.report.inventory_hosts, 2);
        let inventory = std::fs::read_to_string(fx.inventory.path()).unwrap();
        assert!(inventory.contains("ftl2-scale-1 ansible_host=10.0.0.2"));
        assert_eq!(store.matching("ftl2-scale"), vec!["ftl2-scale-0", "ftl2-scale-1"]);
        assert_eq!(provider.create_calls(), vec!["ftl2-scale-0", "ftl2-scale-1"]);
        assert!(engine.waits.lock().unwrap().is_empty());

        let reloaded = fx.store().await;
        assert_eq!(reloaded.len(), 2);
        assert!(!reloaded.has("ftl2-scale-3"));
    }

    #[tokio::test]
    async fn test_check_mode_touches_nothing() {
        let mut fx = Fixture::new();
        fx.fleet.check_mode = true;
        let provider = FakeProvider {
            check_mode: true,
            ..Default::default()
        };
        let mut engine = RecordingEngine::default();
        let mut store = fx.store().await;

        let report = Provisioner::new(&fx.fleet, &provider, &fx.inventory)
            .run(&mut store, &mut engine, 2)
            .await
            .unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert!(store.is_empty());
        assert!(!store.path().exists());
        assert!(!fx.inventory.path().exists());
        assert!(engine.hosts.is_empty());
        assert!(engine.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reachability_timeout_keeps_records() {
        let fx = Fixture::new();
        let provider = FakeProvider::default();
        let mut engine = RecordingEngine {
            never_reachable: true,
            ..Default::default()
        };
        let mut store = fx.store().await;

        let failure = Provisioner::new(&fx.fleet, &provider, &fx.inventory)
            .run(&mut store, &mut engine, 2)
            .await
            .unwrap_err();

        assert!(matches!(
            failure.error,
            CloudError::ReachabilityTimeout { timeout_secs: 120, .. }
        ));
        assert_eq!(failure.report.created, vec!["ftl2-scale-0", "ftl2-scale-1"]);
        assert_eq!(fx.store().await.len(), 2);
    }

    #[tokio::test]
    async fn test_plan() {
        let fx = Fixture::new();
        let provider = FakeProvider::default();
        let mut store = fx.store().await;
        let provisioner = Provisioner::new(&fx.fleet, &provider, &fx.inventory);
        provisioner
            .run(&mut store, &mut RecordingEngine::default(), 1)
            .await
            .unwrap();

        let plan = provisioner.plan(&store, 3);
        let summary = plan.summary();
        assert_eq!(summary.create, 2);
        assert_eq!(summary.no_change, 1);
        assert_eq!(plan.actions[1].name, "ftl2-scale-1");
    }
}
