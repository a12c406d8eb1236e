use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use prizeflow::config::Config;
use prizeflow::report::{print_summary, ProtocolReport};
use prizeflow::tasks::{TaskError, TaskRunner};
use prizeflow::{AnalysisOptions, ChainDataset, ChainReport, DatasetBundle, MovingUsers};

#[derive(Debug, Parser)]
#[command(name = "prizeflow", about = "Prize protocol analytics across chains")]
struct Args {
    /// JSON file with the per-chain datasets
    #[arg(short, long)]
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "PRIZEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured bucket count
    #[arg(short, long)]
    buckets: Option<usize>,
}

fn load_datasets(path: &Path) -> Result<Vec<Arc<ChainDataset>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read datasets from {}", path.display()))?;
    let bundle = DatasetBundle::from_json(&content)
        .with_context(|| format!("Failed to parse datasets in {}", path.display()))?;
    Ok(bundle.chains.into_iter().map(Arc::new).collect())
}

#[instrument(skip_all, fields(chains = datasets.len()))]
async fn analyze_chains(
    runner: &TaskRunner,
    datasets: &[Arc<ChainDataset>],
    options: &AnalysisOptions,
) -> Vec<ChainReport> {
    let tasks: Vec<JoinHandle<Result<ChainReport, TaskError>>> = datasets
        .iter()
        .map(|dataset| {
            let runner = runner.clone();
            let dataset = Arc::clone(dataset);
            let options = options.clone();
            tokio::spawn(async move { runner.chain_analysis(dataset, options, None).await })
        })
        .collect();

    let mut reports = Vec::with_capacity(tasks.len());
    for (dataset, task) in datasets.iter().zip(tasks) {
        match task.await {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => warn!(chain = %dataset.chain, error = %e, "Skipping chain"),
            Err(e) => error!(chain = %dataset.chain, error = %e, "Chain analysis task failed"),
        }
    }
    reports
}

async fn run(config: &Config, args: &Args) -> Result<ProtocolReport> {
    let mut options = config.analysis_options()?;
    if let Some(buckets) = args.buckets {
        options.bucket_count = buckets;
    }

    let datasets = load_datasets(&args.input)?;
    info!(chains = datasets.len(), mode = ?options.mode, "Loaded datasets");

    let runner = TaskRunner::default();
    let chains = analyze_chains(&runner, &datasets, &options).await;

    let (crosschain, distribution) = tokio::try_join!(
        runner.cross_chain_merge(datasets.clone()),
        runner.multichain_distribution(datasets.clone()),
    )?;

    let mut moving_users: Vec<MovingUsers> = Vec::with_capacity(datasets.len());
    for origin in datasets.iter().map(|d| d.chain) {
        moving_users.push(
            runner
                .moving_users(origin, datasets.clone(), config.moving_users.until)
                .await?,
        );
    }

    Ok(ProtocolReport {
        generated_at: Utc::now(),
        chains,
        crosschain,
        distribution,
        moving_users,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let _guard = prizeflow::telemetry::init_tracing(&config.logging)?;
    info!("🏆 Prizeflow - prize protocol analytics");

    let report = tokio::select! {
        result = run(&config, &args) => result?,
        _ = signal::ctrl_c() => {
            warn!("🛑 Interrupted before the analysis finished");
            return Ok(());
        }
    };

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }

    print_summary(&report);
    Ok(())
}
