//! satfetch: fetch EUMETSAT satellite imagery.
//!
//! Resolves a region to a pixel grid, searches the Data Store for products
//! in a time window (or the latest one), and writes one JPEG or `.npy` file
//! per product. Products already on disk and products sensed in darkness
//! are skipped before download.

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use archive::{Credentials, DataStoreClient, DataStoreConfig};
use clap::Parser;
use decoder::CommandDecoder;
use pipeline::{plan_routed, ConfigError, DownloadConfig, FamilyRegistry, ProductPipeline, SatelliteFamily, ScratchSpace};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let family: SatelliteFamily = args.family.parse()?;
    let registry = FamilyRegistry::load(&args.config_dir)?;
    let config = registry.get(family);

    if args.list_channels {
        print!("{}", config.describe_channels());
        return Ok(());
    }

    info!(family = %family, "Starting satfetch");

    let credentials =
        Credentials::new(args.consumer_key.clone(), args.consumer_secret.clone()).map_err(ConfigError::Credentials)?;
    let request = args.run_request()?;
    let run_plan = plan_routed(&registry, family, &request)?;
    let output = args.output_mode(&run_plan.channel);

    let client = DataStoreClient::new(DataStoreConfig::new(run_plan.family.collection_id.clone()), credentials)
        .context("Failed to create Data Store client")?;
    let decoder = CommandDecoder::new(args.decoder_program.clone());
    let scratch = ScratchSpace::new(&args.scratch_dir)
        .with_context(|| format!("Failed to create scratch directory {}", args.scratch_dir.display()))?;
    let download = DownloadConfig {
        max_retries: args.max_retries,
        ..DownloadConfig::default()
    };

    let pipeline = ProductPipeline::new(
        run_plan,
        Arc::new(client),
        Arc::new(decoder),
        output,
        &args.output_dir,
        scratch,
        download,
    )?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after cleanup");
                cancel.cancel();
            }
        });
    }

    let summary = pipeline.run(cancel).await?;
    if summary.cancelled {
        warn!("Run interrupted");
    }
    Ok(())
}
