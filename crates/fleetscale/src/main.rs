mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetscale")]
#[command(
    about = "Provision a disposable Linode fleet and benchmark ansible-playbook against the FleetScale engine",
    long_about = None
)]
struct Cli {
    /// Path to fleetscale.yml (default: $FLEETSCALE_CONFIG, then the working directory, then ~/.config/fleetscale)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision nodes until COUNT of them exist
    Provision {
        /// Number of nodes the fleet should have
        count: usize,
        /// Dry run: show what would be created
        #[arg(long)]
        check: bool,
    },
    /// Destroy every tracked node
    Teardown {
        /// Dry run: show what would be destroyed
        #[arg(long)]
        check: bool,
    },
    /// Run the benchmark suite against the provisioned nodes
    Bench {
        /// Run a single test
        #[arg(long, value_name = "NAME")]
        test: Option<String>,
        /// Write results to a JSON file
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
        /// Skip the ansible-playbook baseline
        #[arg(long, conflicts_with = "ansible_only")]
        ftl2_only: bool,
        /// Skip the FleetScale engine
        #[arg(long)]
        ansible_only: bool,
        /// List the tests that would run
        #[arg(long)]
        check: bool,
    },
    /// Check connectivity to every tracked node
    Ping,
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Version needs no configuration
    if matches!(cli.command, Commands::Version) {
        println!("fleetscale {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config, config_path) = fleetscale_config::load_config(cli.config.as_deref())?;
    match &config_path {
        Some(path) => tracing::debug!("Using config {}", path.display()),
        None => tracing::debug!("Using built-in defaults"),
    }

    match cli.command {
        Commands::Provision { count, check } => {
            commands::provision::handle(&config, count, check).await?;
        }
        Commands::Teardown { check } => {
            commands::teardown::handle(&config, check).await?;
        }
        Commands::Bench {
            test,
            json,
            ftl2_only,
            ansible_only,
            check,
        } => {
            let args = commands::bench::BenchArgs {
                test,
                json,
                skip_baseline: ftl2_only,
                skip_candidate: ansible_only,
                check,
            };
            commands::bench::handle(&config, args).await?;
        }
        Commands::Ping => {
            commands::ping::handle(&config).await?;
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
