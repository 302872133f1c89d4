pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod deploy;
pub mod domain;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::input::InputLoader;
pub use adapters::reddit::RedditClient;
pub use adapters::sqlite::SqliteStore;
pub use config::cli::LocalStorage;
pub use config::settings::TrackerSettings;
pub use core::{etl::EtlEngine, pipeline::TrackerPipeline, processor::CommentProcessor};
pub use utils::error::{Result, TrackerError};
