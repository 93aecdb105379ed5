//! Main entry point for the Elo ladder service
//!
//! Starts the HTTP API with logging and graceful shutdown, or prints a single
//! category ranking and exits.

use anyhow::Result;
use clap::Parser;
use elo_ladder::api::{ApiServer, ApiServerConfig};
use elo_ladder::config::{validate_config, AppConfig};
use elo_ladder::service::{AppState, HealthCheck, HealthStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Elo Ladder - rankings for a competitive gaming ladder
#[derive(Parser)]
#[command(
    name = "elo-ladder",
    version,
    about = "Elo rankings for a competitive gaming ladder",
    long_about = "Elo Ladder keeps competitors, game categories and match results, replays \
                 each category's match history with the Elo rating system and serves the \
                 resulting rankings, player pages and head-to-head records over a JSON API."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Data file override
    #[arg(long, value_name = "FILE", help = "Override the JSON snapshot data file")]
    data_file: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,

    /// Print one ranking and exit
    #[arg(
        long,
        value_name = "CATEGORY",
        help = "Print the ranking of the category with this URL path and exit"
    )]
    print_rankings: Option<String>,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = Arc::new(AppState::new(config).await?);
    app_state.start().await?;

    match HealthCheck::check(app_state.clone()).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Categories: {}", health.stats.categories);
            println!("  Competitors: {}", health.stats.competitors);
            println!("  Matches: {}", health.stats.matches);

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a category ranking as a table on stdout
async fn print_rankings(config: AppConfig, category: &str) -> Result<()> {
    let app_state = AppState::new(config).await?;
    let ranking = app_state.rankings().rankings_by_path(category)?;

    println!("{} ({} ranked)", ranking.category.name, ranking.entries.len());
    println!(
        "{:>4}  {:<24} {:>6} {:>5} {:>5} {:>7}",
        "#", "Player", "Rating", "W", "L", "Games"
    );
    for entry in &ranking.entries {
        println!(
            "{:>4}  {:<24} {:>6} {:>5} {:>5} {:>3}-{:<3}",
            entry.position,
            entry.display_name,
            entry.rating,
            entry.match_wins,
            entry.match_losses,
            entry.games_won,
            entry.games_lost
        );
    }
    if !ranking.skipped.is_empty() {
        println!("{} matches skipped", ranking.skipped.len());
    }

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Elo Ladder");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   HTTP port: {}", config.service.http_port);
    info!(
        "   Elo: K={} initial={}",
        config.rating.k_factor, config.rating.initial_rating
    );
    match &config.storage.data_file {
        Some(path) => info!(
            "   Data file: {} (persist on shutdown: {})",
            path.display(),
            config.storage.persist_on_shutdown
        ),
        None => info!("   Data file: none (in-memory only)"),
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(data_file) = &args.data_file {
        config.storage.data_file = Some(data_file.clone());
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Handle special modes
    if args.health_check {
        return perform_health_check(config).await;
    }

    if let Some(category) = &args.print_rankings {
        return print_rankings(config, category).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let app_state = match AppState::new(config.clone()).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let server = Arc::new(ApiServer::new(
        ApiServerConfig {
            port: config.service.http_port,
            ..Default::default()
        },
        app_state.clone(),
    ));
    let server_task = {
        let server = server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!("API server failed: {}", e);
            }
        })
    };

    info!("✅ Elo Ladder is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    server.stop().await?;

    match tokio::time::timeout(config.shutdown_timeout(), server_task).await {
        Ok(_) => info!("✅ API server drained"),
        Err(_) => warn!("⚠️  Shutdown timeout exceeded, dropping open connections"),
    }

    if let Err(e) = app_state.shutdown().await {
        error!("Shutdown failed: {}", e);
        std::process::exit(1);
    }

    info!("🛑 Elo Ladder stopped");
    Ok(())
}
