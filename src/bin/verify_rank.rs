use clap::Parser;
use reddit_tracker::app::verify::verify_comment;
use reddit_tracker::core::rank_detector::RankDetector;
use reddit_tracker::core::reply_detector::ReplyDetector;
use reddit_tracker::utils::{logger, validation::Validate};
use reddit_tracker::{RedditClient, TrackerSettings};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "verify_rank")]
#[command(about = "Check the API ranking and recent replies of one comment against the Reddit UI")]
struct VerifyArgs {
    /// Full Reddit comment URL
    comment_url: String,

    /// Rank you see in the Reddit UI
    expected_rank: Option<usize>,

    /// Optional TOML settings file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = VerifyArgs::parse();
    logger::init_cli_logger(args.verbose);

    let settings = TrackerSettings::load(args.config.as_deref())?;
    settings.validate()?;

    let client = Arc::new(RedditClient::new(settings.reddit)?);
    let ranks = RankDetector::new(Arc::clone(&client));
    let replies = ReplyDetector::with_window_hours(client, settings.tracking.reply_window_hours);

    match verify_comment(&ranks, &replies, &args.comment_url, args.expected_rank).await {
        Ok(report) => {
            print!("{}", report);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code().max(1));
        }
    }
}
