mod config_commands;
mod db_commands;
mod services;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    operator_scheduler::Scheduler,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::services::Services;

#[derive(Parser)]
#[command(name = "operator", about = "Operator: plugin pull request validator and digest mailer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "OPERATOR_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the digest and intake jobs until interrupted (default).
    Run {
        /// Apply the bundled migrations before starting.
        #[arg(long, default_value_t = false)]
        migrate: bool,
    },
    /// Apply the bundled database migrations and exit.
    Migrate,
    /// Run a single digest tick.
    Digest,
    /// Run a single intake tick.
    Intake,
    /// Validate every open submission and print the HTML report.
    Preview,
    /// Load the configuration and report problems.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "operator starting");

    match cli.command {
        None => run(&cli, false).await,
        Some(Commands::Run { migrate }) => run(&cli, migrate).await,
        Some(Commands::Migrate) => db_commands::migrate(&cli).await,
        Some(Commands::Digest) => {
            let services = Services::connect(config_commands::load(&cli)?, false).await?;
            let summary = services.digest_job().run_once().await?;
            info!(
                due = summary.due,
                sent = summary.sent,
                skipped = summary.skipped,
                failed = summary.failed,
                "digest finished"
            );
            Ok(())
        },
        Some(Commands::Intake) => {
            let services = Services::connect(config_commands::load(&cli)?, false).await?;
            let summary = services.intake_job().run_once().await;
            info!(
                received = summary.received,
                applied = summary.applied,
                failed = summary.failed,
                "intake finished"
            );
            Ok(())
        },
        Some(Commands::Preview) => preview(&cli).await,
        Some(Commands::CheckConfig) => config_commands::check(&cli),
    }
}

async fn run(cli: &Cli, migrate: bool) -> anyhow::Result<()> {
    let config = config_commands::load(cli)?;
    let digest_period = Duration::from_secs(config.schedule.digest_interval_secs);
    let intake_period = Duration::from_secs(config.schedule.intake_interval_secs);
    let services = Services::connect(config, migrate).await?;

    let scheduler = Scheduler::new();
    scheduler
        .schedule(Arc::new(services.digest_job()), digest_period)
        .await?;
    scheduler
        .schedule(Arc::new(services.intake_job()), intake_period)
        .await?;
    scheduler.start().await?;

    shutdown_signal().await?;
    scheduler.stop().await;
    Ok(())
}

async fn preview(cli: &Cli) -> anyhow::Result<()> {
    let config = config_commands::load(cli)?;
    let catalog = services::build_catalog(&config)?;
    let entries = catalog
        .build()
        .await
        .context("failed to list open submissions")?;
    let html = operator_digest::render_report(&entries, chrono::Utc::now())?;
    println!("{html}");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).context("failed to register SIGTERM")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            info!("received SIGINT, shutting down");
        },
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        },
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("received ctrl-c, shutting down");
    Ok(())
}
