use clap::Parser;
use reddit_tracker::config::server::ServerConfig;
use reddit_tracker::core::{CommentSource, TrackingStore};
use reddit_tracker::server::{self, AppState};
use reddit_tracker::utils::{logger, validation::Validate};
use reddit_tracker::{
    CommentProcessor, InputLoader, RedditClient, SqliteStore, TrackerError, TrackerSettings,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "server")]
#[command(about = "Multi-user web service for the Reddit comment tracker")]
struct ServerArgs {
    /// Listen address, e.g. 0.0.0.0:8080 (default: 0.0.0.0:$PORT)
    #[arg(long)]
    bind: Option<String>,

    /// Runtime worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Optional TOML settings file
    #[arg(short, long)]
    config: Option<String>,
}

fn load_config(args: &ServerArgs) -> Result<(ServerConfig, TrackerSettings), TrackerError> {
    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = &args.bind {
        config.apply_bind(bind)?;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    config.validate()?;

    let settings = TrackerSettings::load(args.config.as_deref())?;
    settings.validate()?;
    Ok((config, settings))
}

async fn run(config: ServerConfig, settings: TrackerSettings) -> Result<(), TrackerError> {
    let source: Arc<dyn CommentSource> = Arc::new(RedditClient::new(settings.reddit.clone())?);
    let store: Arc<dyn TrackingStore> = Arc::new(SqliteStore::open(&settings.tracking.db_path)?);
    let processor = Arc::new(CommentProcessor::new(source, store, &settings.tracking));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
    let state = AppState::new(config, InputLoader::new()?, processor);

    server::serve(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
    })
    .await
}

fn main() {
    let args = ServerArgs::parse();

    let (config, settings) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    logger::init_server_logger(config.is_production());
    tracing::info!(
        "Reddit Comment Tracker startup ({}, {} workers, {}s timeout)",
        config.app_env,
        config.workers,
        config.request_timeout.as_secs()
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {}", e);
            std::process::exit(3);
        }
    };

    if let Err(e) = runtime.block_on(run(config, settings)) {
        tracing::error!(
            "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }
}
