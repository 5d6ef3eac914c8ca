use crate::utils;
use colored::Colorize;
use fleetscale_cloud::StateStore;
use fleetscale_config::ScaleConfig;
use fleetscale_engine::Automation;

pub async fn handle(config: &ScaleConfig) -> anyhow::Result<()> {
    let store = StateStore::open(&config.paths.state_file).await?;
    let targets = utils::host_targets(&store, config)?;
    if targets.is_empty() {
        println!("No nodes in state");
        return Ok(());
    }

    println!("Pinging {} node(s)...", targets.len());
    let mut engine = utils::open_engine(false)?;
    for target in targets {
        engine.add_host(target);
    }

    let outcome = engine.ping().await;
    utils::close_engine(engine).await;

    for output in outcome? {
        println!("  {}: {}", output.host.cyan(), output.stdout.trim().green());
    }
    Ok(())
}
