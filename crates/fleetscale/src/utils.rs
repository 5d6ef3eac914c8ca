use anyhow::Context;
use colored::Colorize;
use fleetscale_cloud::{FleetSpec, InventoryProjector, StateStore};
use fleetscale_cloud_linode::{LinodeApi, LinodeProvider};
use fleetscale_config::{ScaleConfig, Secrets, expand_home};
use fleetscale_engine::{Engine, HostTarget, SshTransport};
use std::path::Path;

/// Print the dry-run banner
pub fn print_mode(check: bool) {
    if check {
        println!("  Mode: {}", "CHECK (dry run)".yellow());
    }
    println!();
}

/// Read the public key installed on new nodes
pub fn read_public_key(path: &Path) -> anyhow::Result<String> {
    let path = expand_home(path);
    let key = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read SSH public key {}", path.display()))?;
    Ok(key.trim().to_string())
}

pub fn fleet_spec(config: &ScaleConfig, authorized_keys: Vec<String>, check: bool) -> FleetSpec {
    let fleet = &config.fleet;
    FleetSpec {
        prefix: fleet.prefix.clone(),
        instance_type: fleet.instance_type.clone(),
        region: fleet.region.clone(),
        image: fleet.image.clone(),
        authorized_keys,
        login_user: fleet.login_user.clone(),
        group: fleet.group.clone(),
        reach_timeout: fleet.reach_timeout(),
        check_mode: check,
    }
}

pub fn inventory(config: &ScaleConfig) -> InventoryProjector {
    InventoryProjector::new(&config.paths.inventory, &config.fleet.group)
}

/// Linode provider from the resolved secrets
///
/// The token is only required outside check mode; a dry run never reaches
/// the API.
pub fn linode_provider(secrets: &Secrets, check: bool) -> anyhow::Result<LinodeProvider> {
    let token = match secrets.require("access_token") {
        Ok(token) => token.to_string(),
        Err(_) if check => String::new(),
        Err(e) => return Err(e.into()),
    };

    Ok(LinodeProvider::new(LinodeApi::new(token))
        .with_root_pass(secrets.get("root_pass").map(str::to_string))
        .with_check_mode(check))
}

/// Engine targets for every tracked node matching the fleet prefix
pub fn host_targets(store: &StateStore, config: &ScaleConfig) -> anyhow::Result<Vec<HostTarget>> {
    let fleet = &config.fleet;
    store
        .matching(&fleet.prefix)
        .into_iter()
        .map(|name| -> anyhow::Result<HostTarget> {
            let record = store.get(&name)?;
            Ok(
                HostTarget::new(&name, record.primary_address(), &fleet.login_user)
                    .with_group(&fleet.group),
            )
        })
        .collect()
}

/// Open an SSH engine session
pub fn open_engine(check: bool) -> anyhow::Result<Engine<SshTransport>> {
    let transport = SshTransport::new().context("Failed to start SSH session")?;
    Ok(Engine::new(transport).with_check_mode(check))
}

/// Close the session, logging rather than failing on teardown errors
pub async fn close_engine(engine: Engine<SshTransport>) {
    if let Err(e) = engine.close().await {
        tracing::warn!("Failed to close SSH sessions: {}", e);
    }
}
