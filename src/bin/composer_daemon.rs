// src/bin/composer_daemon.rs
use anyhow::Context;
use clap::Parser;
use index_composer::{
    composer::Composer,
    config::AppConfig,
    http::{self, AdminAuth, AppState},
    providers::polynance::PolynanceClient,
    publishing::LogPublisher,
    scheduler::{Cadence, Scheduler},
    service::ComposeService,
    store::InMemoryStore,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(
    name = "composer_daemon",
    about = "Composes prediction-market index products on a schedule"
)]
struct Args {
    /// Compose without triggering execution.
    #[arg(long)]
    dry_run: bool,
    /// Optional TOML file; environment variables override it.
    #[arg(long, env = "COMPOSER_CONFIG")]
    config: Option<PathBuf>,
    /// Also serve the admin/read API.
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::default(),
    };
    cfg.apply_env(|k| std::env::var(k).ok())?;
    cfg.composer.dry_run = args.dry_run;
    cfg.validate().context("invalid configuration")?;
    cfg.logging.init();

    tracing::info!(
        min_tvl = cfg.composer.min_tvl,
        max_days_to_expiry = cfg.composer.max_days_to_expiry,
        max_components = cfg.composer.max_components,
        dry_run = cfg.composer.dry_run,
        "index composer starting"
    );

    let provider = Arc::new(PolynanceClient::from_config(&cfg.provider)?);
    let composer = Composer::new(cfg.composer.clone(), provider, Arc::new(LogPublisher));
    let service = Arc::new(ComposeService::new(composer, Arc::new(InMemoryStore::new())));

    let (stop_tx, stop_rx) = watch::channel(false);
    let server = if args.serve {
        let addr: SocketAddr = cfg.admin.bind.parse().context("COMPOSER_BIND")?;
        let state = AppState { service: service.clone(), auth: AdminAuth::from_config(&cfg.admin) };
        let mut rx = stop_rx.clone();
        Some(tokio::spawn(http::serve(addr, state, async move {
            let _ = rx.wait_for(|stop| *stop).await;
        })))
    } else {
        None
    };

    let cadence = Cadence::from_interval_hours(cfg.composer.interval_hours);
    let scheduler = Scheduler::new(service, cadence);
    let mut rx = stop_rx;
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("shutdown signal received"),
            _ = rx.wait_for(|stop| *stop) => {}
        }
    };

    let runs = scheduler.run(shutdown).await;
    tracing::info!(runs, "scheduler finished");

    // one-shot mode keeps serving until ctrl-c
    if let Some(server) = server {
        if scheduler.cadence() == Cadence::Once {
            let _ = tokio::signal::ctrl_c().await;
        }
        let _ = stop_tx.send(true);
        server.await??;
    }
    Ok(())
}
