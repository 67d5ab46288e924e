use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use batchwatch::data::COMPLIANCE_SCORE;
use batchwatch::{Dashboard, RefreshOutcome, Refresher, Settings};
use batchwatch_sources::sheets::{Credentials, SheetsClient};
use batchwatch_sources::{FileSource, SourceClient};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "batchwatch")]
#[command(about = "Keeps 503B dashboard metrics fresh from the master sheet")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the row from a local JSON or TSV file instead of the Sheets API
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Refresh once, print the KPI board and exit
    #[arg(long)]
    once: bool,

    /// Refresh once and write the dashboard as JSON to this path
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Refresh interval in seconds (overrides the settings file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Seed for synthesized chart series
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(file) = &args.file {
        settings.source.file = Some(file.clone());
    }
    if let Some(secs) = args.interval {
        settings.refresh.interval_secs = secs;
    }

    let pipeline = settings.pipeline()?;
    let source = settings.source_ref()?;
    let client = build_client(&settings)?;
    info!(
        client = client.description(),
        range = %source,
        fields = pipeline.schema().len(),
        schema_version = %pipeline.schema().version(),
        "Starting batchwatch"
    );

    let refresher = Arc::new(Refresher::new(client, source, pipeline, settings.policy()));
    let rt = tokio::runtime::Runtime::new()?;

    if args.once || args.export.is_some() {
        return rt.block_on(run_once(&refresher, args.export.as_deref(), args.seed));
    }

    rt.block_on(run_watch(&refresher))
}

/// Pick the client for the configured source.
fn build_client(settings: &Settings) -> Result<Arc<dyn SourceClient>> {
    let source = &settings.source;
    if let Some(path) = &source.file {
        return Ok(Arc::new(FileSource::new(path)));
    }

    let credentials = Credentials::from_env(&source.api_key_env, &source.token_env);
    if credentials.is_none() {
        warn!(
            api_key_env = %source.api_key_env,
            token_env = %source.token_env,
            "No Google credentials found. Using fallback data."
        );
    }

    let mut builder = SheetsClient::builder()
        .maybe_credentials(credentials)
        .timeout(Duration::from_secs(source.timeout_secs.max(1)));
    if let Some(endpoint) = &source.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    let client = builder.build().context("Failed to build Sheets client")?;
    Ok(Arc::new(client))
}

/// Single refresh, then print or export.
async fn run_once(refresher: &Refresher, export: Option<&Path>, seed: Option<u64>) -> Result<()> {
    if let RefreshOutcome::Stale(err) = refresher.refresh_now().await {
        warn!(error = %err, "Refresh failed");
    }

    let cache = refresher.cache();
    let dashboard = Dashboard::compose(cache.as_ref(), seed);

    match export {
        Some(path) => export_to_file(&dashboard, path),
        None => {
            print_board(&dashboard);
            Ok(())
        }
    }
}

/// Refresh on the interval until interrupted.
async fn run_watch(refresher: &Arc<Refresher>) -> Result<()> {
    let interval = refresher.policy().interval;
    info!(interval_secs = interval.as_secs(), "Refreshing in the background; Ctrl-C to stop");

    let handle = refresher.start();
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    handle.stop();

    let entry = refresher.cache().get();
    info!(
        source_kind = %entry.source_kind,
        fetched_at = %entry.fetched_at,
        "Stopped"
    );
    Ok(())
}

fn print_board(dashboard: &Dashboard) {
    println!(
        "Source: {} (fetched {})",
        dashboard.source_kind,
        dashboard.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(err) = &dashboard.last_error {
        println!("Last error: {}", err);
    }
    println!();

    for (name, kpi) in &dashboard.kpis {
        let unit = if name == COMPLIANCE_SCORE || name.ends_with("rate") {
            "%"
        } else {
            ""
        };
        println!(
            "{} {:<20} {:>10.1}{:<1} {:>+7.1}%",
            kpi.status.symbol(),
            name,
            kpi.value,
            unit,
            kpi.change_percent
        );
    }

    if !dashboard.zones.is_empty() {
        println!();
        for zone in &dashboard.zones {
            println!(
                "{} {:<8} {:>10.0} / {:<10.0} {:>5.1}%",
                zone.status.symbol(),
                zone.zone_name,
                zone.particle_count,
                zone.particle_limit,
                zone.compliance_percent
            );
        }
    }
}

fn export_to_file(dashboard: &Dashboard, export_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(dashboard)?;
    let mut file = std::fs::File::create(export_path)
        .with_context(|| format!("Failed to create {}", export_path.display()))?;
    file.write_all(json.as_bytes())?;

    println!("Exported dashboard to: {}", export_path.display());
    Ok(())
}
