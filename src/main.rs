use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use market_filter::app::{FilterUseCase, RunOutcome};
use market_filter::config::Config;
use market_filter::infra::{FileArtifactOutputAdapter, LocationFetcher, ReqwestHttp};
use market_filter::observability::{self, metrics};

#[derive(Parser)]
#[command(name = "market_filter")]
#[command(about = "Cross-market price and stock filter")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the three sources, filter, and write the result and diagnostic log
    Run {
        /// Config file (defaults to ./market_filter.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the output artifact path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the diagnostic log path
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    ShowConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(path.map(PathBuf::as_path))?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn run(config: Config) -> anyhow::Result<RunOutcome> {
    let prometheus = match metrics::init() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    let http = ReqwestHttp::new(config.fetch.timeout_seconds.map(Duration::from_secs))?;
    let sink = FileArtifactOutputAdapter::new(&config.output.output_file, &config.output.log_file);
    let pushgateway = config.metrics.pushgateway_url.clone();
    let job = config.metrics.job.clone();

    let use_case = FilterUseCase::new(config, Box::new(LocationFetcher::new(http)), Box::new(sink));
    let outcome = use_case.run().await?;

    if let (Some(handle), Some(url)) = (prometheus.as_ref(), pushgateway.as_deref()) {
        metrics::push(handle, url, &job).await;
    }
    Ok(outcome)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = observability::init_logging("logs");

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output, log } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(output) = output {
                config.output.output_file = output;
            }
            if let Some(log) = log {
                config.output.log_file = log;
            }
            info!("Starting run");

            match run(config).await {
                Ok(RunOutcome::Completed { stats }) => {
                    println!("Done! Found {} items matching the filters.", stats.passed);
                }
                Ok(RunOutcome::Aborted { failures }) => {
                    for (source, e) in &failures {
                        eprintln!("Failed to fetch {}: {}", source, e);
                    }
                    println!("Run aborted: could not fetch data from one of the sources.");
                }
                Err(e) => {
                    error!("Run failed: {:#}", e);
                    return Err(e);
                }
            }
        }
        Commands::ShowConfig { config } => {
            let config = load_config(config.as_ref())?;
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}
