use crate::utils;
use colored::Colorize;
use fleetscale_cloud::{StateStore, Teardown, TeardownReport};
use fleetscale_config::ScaleConfig;

pub async fn handle(config: &ScaleConfig, check: bool) -> anyhow::Result<()> {
    println!("{}", "Tearing down scale test nodes".bold());
    utils::print_mode(check);

    let provider = utils::linode_provider(&config.resolve_secrets(), check)?;
    // Destroy needs no key material
    let fleet = utils::fleet_spec(config, Vec::new(), check);
    let inventory = utils::inventory(config);
    let mut store = StateStore::open(&config.paths.state_file).await?;

    let teardown = Teardown::new(&fleet, &provider, &inventory);
    let planned = teardown.plan(&store).summary().delete;
    if planned == 0 {
        println!("  No scale test nodes found in state");
    } else {
        println!("  Destroying {} node(s)...", planned);
    }

    let report = match teardown.run(&mut store).await {
        Ok(report) => report,
        Err(failure) => {
            print_nodes(&failure.report);
            for name in &failure.report.remaining {
                println!("  {}: {}", name.cyan(), "still tracked".yellow());
            }
            println!();
            println!(
                "{}",
                format!(
                    "✗ Teardown stopped: {} node(s) destroyed, {} remaining",
                    failure.report.destroyed.len(),
                    failure.report.remaining.len()
                )
                .red()
                .bold()
            );
            println!("Re-run teardown to destroy the remaining nodes");
            return Err(failure.error.into());
        }
    };

    print_nodes(&report);

    if !report.destroyed.is_empty() {
        println!();
        println!(
            "{}",
            format!("✓ {} node(s) destroyed", report.destroyed.len())
                .green()
                .bold()
        );
    }
    if report.inventory_removed {
        println!("Ansible inventory removed");
    }

    Ok(())
}

fn print_nodes(report: &TeardownReport) {
    for name in &report.planned {
        println!(
            "  {}: {}",
            name.cyan(),
            "would be destroyed (check mode)".yellow()
        );
    }
    for name in &report.destroyed {
        println!("  {}: {}", name.cyan(), "destroyed".green());
    }
}
