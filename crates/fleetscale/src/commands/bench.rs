use crate::utils;
use colored::Colorize;
use fleetscale_bench::{
    AnsiblePlaybook, BackendOutcome, Harness, HarnessOptions, render_summary, write_json,
};
use fleetscale_cloud::StateStore;
use fleetscale_config::ScaleConfig;
use fleetscale_engine::Automation;
use std::path::PathBuf;

pub struct BenchArgs {
    pub test: Option<String>,
    pub json: Option<PathBuf>,
    pub skip_baseline: bool,
    pub skip_candidate: bool,
    pub check: bool,
}

fn outcome_line(label: &str, outcome: &BackendOutcome) -> String {
    let status = if outcome.success {
        "ok".green()
    } else {
        "FAIL".red()
    };
    format!("    {:<8} {:.3}s [{}]", format!("{}:", label), outcome.time, status)
}

pub async fn handle(config: &ScaleConfig, args: BenchArgs) -> anyhow::Result<()> {
    let store = StateStore::open(&config.paths.state_file).await?;

    let mut options = HarnessOptions::new(&config.fleet.prefix);
    options.skip_baseline = args.skip_baseline;
    options.skip_candidate = args.skip_candidate;
    let harness = Harness::new(options);

    // Unknown test names and an empty fleet fail here, before any work
    let preflight = harness.preflight(&store, args.test.as_deref())?;
    let hosts = preflight.hosts;
    println!(
        "{}",
        format!(
            "Scale test: {} hosts, {} test(s)",
            hosts,
            preflight.operations.len()
        )
        .bold()
    );
    println!("{}", "=".repeat(60));

    if args.check {
        for op in &preflight.operations {
            println!("  {}: {} {}", op.name().cyan(), op.description(), "(would run)".yellow());
        }
        return Ok(());
    }

    let mut engine = utils::open_engine(false)?;
    for host in utils::host_targets(&store, config)? {
        engine.add_host(host);
    }
    let baseline = AnsiblePlaybook::new(&config.paths.playbook_dir, &config.paths.inventory);

    let outcome = harness
        .run(&store, &engine, &baseline, args.test.as_deref())
        .await;
    utils::close_engine(engine).await;
    let results = outcome?;

    for result in &results {
        println!();
        println!("  {}: {}", result.name.cyan(), result.description);
        if let Some(outcome) = &result.baseline {
            println!("{}", outcome_line("Ansible", outcome));
        }
        if let Some(outcome) = &result.candidate {
            println!("{}", outcome_line("FTL2", outcome));
        }
        if let Some(speedup) = result.speedup {
            println!("    Speedup: {}", format!("{:.1}x", speedup).green().bold());
        }
    }

    println!();
    println!("{}", render_summary(&results, hosts));

    if let Some(path) = &args.json {
        write_json(path, &results).await?;
        println!();
        println!("Results written to {}", path.display().to_string().cyan());
    }

    Ok(())
}
