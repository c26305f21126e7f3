mod cli;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use packlink_core::{
    load_config, validate_config, ClientConnector, ConfigWatcher, EpisodeCounter,
    QBittorrentConnector, SeasonPackService, TvMazeClient,
};
use packlink_server::{api::create_router, state::AppState};

use cli::{Cli, Command};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often the config file is checked for changes
const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timeout of a single request to a download client
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Start) {
        Command::Start => start().await,
        Command::GenToken => {
            println!("API Token: {}", cli::generate_token());
            println!("Just copy and paste it into your config file!");
            Ok(())
        }
        Command::Test { request } => cli::run_test(request).await,
        Command::Version => {
            println!("packlink {}", VERSION);
            Ok(())
        }
    }
}

async fn start() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("PACKLINK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Initialize logging
    let default_filter = format!("{},tower_http=debug", config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting packlink {}", VERSION);
    info!("Loaded configuration from {:?}", config_path);

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let addr = SocketAddr::new(config.server.host, config.server.port);

    // Episode counts for smart mode
    let episodes: Arc<dyn EpisodeCounter> = Arc::new(
        TvMazeClient::new(&config.tvmaze).context("Failed to create TVMaze client")?,
    );

    // Watch the config file for changes
    let (watcher, config_rx) = ConfigWatcher::new(&config_path, config, CONFIG_POLL_INTERVAL);
    let watcher_handle = watcher.spawn();

    let connector: Arc<dyn ClientConnector> = Arc::new(QBittorrentConnector::new(CLIENT_TIMEOUT));
    let service = Arc::new(SeasonPackService::new(
        config_rx.clone(),
        connector,
        episodes,
    ));

    // Create app state
    let state = Arc::new(AppState::new(config_rx, service));

    let sanitized = serde_json::to_string(&state.sanitized_config()).unwrap_or_default();
    info!(config = %sanitized, "Configuration loaded successfully");
    if state.config().auth.api_token.is_empty() {
        info!("No API token configured, authentication is disabled");
    }
    for (name, client) in &state.config().clients {
        info!(
            "Client {} at {}:{} linking into {:?}",
            name, client.host, client.port, client.pre_import_path
        );
    }

    // Create router
    let app = create_router(state.clone());

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    watcher_handle.abort();

    Ok(())
}

async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
