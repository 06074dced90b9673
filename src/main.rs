use anyhow::{Context, Result};
use chrono::FixedOffset;
use clap::{arg, command, Parser};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use wallet_history::application::app::{App, Application, ChartConfig, IngestMode};
use wallet_history::domain::session::{SessionContext, TwoFactor};
use wallet_history::infrastructure::backend_records::HistoryPayload;
use wallet_history::infrastructure::shutdown::ShutdownChannel;
use wallet_history::service;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Wallet transaction history chart service with REST API"
)]
struct WalletHistoryProgram {
    /// Listen port REST API
    #[arg(short, long, default_value_t = 3000)]
    listen_port: u16,

    /// Offset of the display time zone from UTC, in minutes
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    utc_offset_minutes: i32,

    /// JSON history (transfers, withdrawals, deposits) to load at start-up
    #[arg(short, long, requires = "seed_account")]
    seed_file: Option<PathBuf>,

    /// Account the seed history belongs to
    #[arg(short = 'a', long)]
    seed_account: Option<String>,
}

async fn seed(app: &impl Application, path: &Path, account: &str) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let payload: HistoryPayload =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let report = app
        .ingest_history(
            SessionContext::new(account, TwoFactor::Verified),
            payload,
            IngestMode::Replace,
        )
        .await?;
    tracing::info!(
        "Seeded account {}: {} stored, {} duplicates, {} rejected",
        account,
        report.stored,
        report.duplicates,
        report.rejected.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = WalletHistoryProgram::parse();

    let display_zone = FixedOffset::east_opt(args.utc_offset_minutes * 60)
        .with_context(|| format!("invalid UTC offset {} minutes", args.utc_offset_minutes))?;
    let config = ChartConfig::builder().display_zone(display_zone).build();
    let app = Arc::new(App::new(config));

    if let (Some(path), Some(account)) = (&args.seed_file, &args.seed_account) {
        seed(app.as_ref(), path, account).await?;
    }

    let shutdown = ShutdownChannel::new();

    // Start the API server
    let server_handle = tokio::spawn(service::api::start_server(
        shutdown.clone(),
        app.clone(),
        args.listen_port,
    ));

    // Wait for shutdown signal
    signal::ctrl_c().await?;
    tracing::warn!("Received Ctrl+C, shutting down...");
    shutdown.trigger();

    // Wait for the server to stop
    server_handle.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
