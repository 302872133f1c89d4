use clap::Parser;
use reddit_tracker::adapters::output::RunSummary;
use reddit_tracker::core::etl::RunReport;
use reddit_tracker::utils::error::TrackerError;
use reddit_tracker::utils::{logger, validation::Validate};
use reddit_tracker::{
    CliConfig, CommentProcessor, EtlEngine, InputLoader, LocalStorage, RedditClient, SqliteStore,
    TrackerPipeline, TrackerSettings,
};
use std::sync::Arc;

async fn run(config: CliConfig) -> Result<RunReport, TrackerError> {
    let mut settings = TrackerSettings::load(config.config.as_deref())?;
    if let Some(db_path) = &config.db_path {
        settings.tracking.db_path = db_path.clone();
    }
    settings.validate()?;

    if settings.reddit.has_credentials() {
        tracing::info!("🔑 Using Reddit OAuth credentials");
    } else {
        tracing::warn!("⚠️ No Reddit credentials configured, using public endpoints");
    }
    tracing::info!("Database: {}", settings.tracking.db_path);

    let source = Arc::new(RedditClient::new(settings.reddit.clone())?);
    let store = Arc::new(SqliteStore::open(&settings.tracking.db_path)?);
    let processor = CommentProcessor::new(source, store, &settings.tracking);

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 輸出路徑相對於目前目錄
    let storage = LocalStorage::new(".");
    let pipeline = TrackerPipeline::new(storage, config, InputLoader::new()?, processor);

    EtlEngine::new_with_monitoring(pipeline, monitor_enabled)
        .run()
        .await
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting reddit-tracker CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(config).await {
        Ok(report) => {
            RunSummary::from_results(&report.results).print();
            println!("\n✅ Tracking completed successfully!");
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Tracking failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
