// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lastyear_application::{ReleaseYearResolver, ResolveRequest};
use lastyear_config::load as load_config;
use lastyear_domain::ResolutionReport;
use lastyear_infrastructure::{init_database, SqliteScrobbleRepository};
use lastyear_musicbrainz::PgCatalogStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolve the original release year of a listener's scrobbles.
#[derive(Parser, Debug)]
#[command(name = "lastyear")]
#[command(about = "Resolve original release years for scrobbles against a MusicBrainz mirror")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "LASTYEAR_CONFIG")]
    config: Option<PathBuf>,

    /// Listener whose scrobbles are resolved (defaults to resolution.default_username)
    #[arg(short, long)]
    username: Option<String>,

    /// Listening year (defaults to resolution.default_year, then the current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Catalog lookups in flight per pass (overrides resolution.max_concurrent_lookups)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the full per-scrobble report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    let target = ResolveRequest::new(args.username, args.year).validate_now(&config.resolution)?;

    let pool = init_database(&config).await?;
    let scrobbles = Arc::new(SqliteScrobbleRepository::new(pool));

    let catalog = Arc::new(
        PgCatalogStore::connect(&config.catalog)
            .await
            .context("failed to connect to the MusicBrainz catalog")?,
    );

    let concurrency = args
        .concurrency
        .unwrap_or(config.resolution.max_concurrent_lookups);
    let resolver =
        ReleaseYearResolver::new(catalog.clone(), scrobbles).with_max_concurrent_lookups(concurrency);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let result = resolver.resolve_for_listener(&target, &cancel).await;
    catalog.close().await;
    let report = result?;

    if cancel.is_cancelled() {
        warn!(target: "cli", "resolution interrupted; skipped scrobbles stay pending");
    }

    println!("{}", render_report(&report, args.json)?);
    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_thread_names(true).with_level(true);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn render_report(report: &ResolutionReport, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(report.outcome.to_string())
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let mut interrupt = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("install SIGINT handler");

    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("install SIGTERM handler");

    #[cfg(not(unix))]
    let interrupt = tokio::signal::ctrl_c();

    #[cfg(unix)]
    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
    }

    #[cfg(not(unix))]
    {
        interrupt.await.expect("ctrl_c handler");
    }

    info!(target: "cli", "shutdown signal received, cancelling resolution");
}
