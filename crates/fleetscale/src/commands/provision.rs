use crate::utils;
use colored::Colorize;
use fleetscale_cloud::{CloudProvider, ProvisionReport, Provisioner, StateStore};
use fleetscale_config::ScaleConfig;

pub async fn handle(config: &ScaleConfig, count: usize, check: bool) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Provisioning {} nodes for scale testing", count).bold()
    );
    utils::print_mode(check);

    let public_key = utils::read_public_key(&config.fleet.ssh_public_key)?;
    let provider = utils::linode_provider(&config.resolve_secrets(), check)?;
    let fleet = utils::fleet_spec(config, vec![public_key], check);
    let inventory = utils::inventory(config);
    let mut store = StateStore::open(&config.paths.state_file).await?;

    let provisioner = Provisioner::new(&fleet, &provider, &inventory);
    let plan = provisioner.plan(&store, count);
    println!("  Plan: {}", plan.summary().to_string().cyan());
    println!();

    if !check && plan.summary().create > 0 {
        let auth = provider.check_auth().await?;
        if !auth.authenticated {
            anyhow::bail!(
                "Linode authentication failed: {}",
                auth.error.unwrap_or_default()
            );
        }
        if let Some(account) = &auth.account_info {
            tracing::info!("Authenticated as {}", account);
        }
    }

    let mut engine = utils::open_engine(check)?;
    let outcome = provisioner.run(&mut store, &mut engine, count).await;
    utils::close_engine(engine).await;

    let report = match outcome {
        Ok(report) => report,
        Err(failure) => {
            print_nodes(&store, &failure.report)?;
            println!();
            println!(
                "{}",
                format!(
                    "✗ Provisioning stopped: {} node(s) created in this run, {} tracked in total",
                    failure.report.created.len(),
                    failure.report.total
                )
                .red()
                .bold()
            );
            if !check && inventory.path().exists() {
                println!(
                    "Ansible inventory written to {} ({} hosts)",
                    inventory.path().display().to_string().cyan(),
                    failure.report.inventory_hosts
                );
            }
            println!("Re-run provision to continue, or teardown to destroy the tracked nodes");
            return Err(failure.error.into());
        }
    };

    print_nodes(&store, &report)?;

    println!();
    println!(
        "{}",
        format!("✓ {} node(s) ready", report.total).green().bold()
    );
    if !check {
        println!(
            "Ansible inventory written to {} ({} hosts)",
            inventory.path().display().to_string().cyan(),
            report.inventory_hosts
        );
    }

    Ok(())
}

fn print_nodes(store: &StateStore, report: &ProvisionReport) -> anyhow::Result<()> {
    for name in &report.existing {
        let record = store.get(name)?;
        println!("  {}: exists ({})", name.cyan(), record.primary_address());
    }
    for name in &report.created {
        let record = store.get(name)?;
        println!(
            "  {}: {} ({})",
            name.cyan(),
            "created".green(),
            record.primary_address()
        );
    }
    for name in &report.skipped {
        println!(
            "  {}: {}",
            name.cyan(),
            "would be created (check mode)".yellow()
        );
    }
    Ok(())
}
