pub mod cli;
pub mod server;
pub mod settings;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "reddit-tracker")]
#[command(about = "Track Reddit comment rankings and reply activity")]
pub struct CliConfig {
    /// Input spreadsheet (Google Sheets URL, download URL, or local file path)
    pub input_source: String,

    /// Output file path (default: auto-generated with timestamp)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output as CSV instead of XLSX
    #[arg(long)]
    pub csv: bool,

    /// Enable parallel processing for reply detection
    #[arg(long)]
    pub parallel: bool,

    /// Number of parallel workers
    #[arg(long, default_value = "5")]
    pub workers: usize,

    /// Tracking database path (overrides settings)
    #[arg(long)]
    pub db_path: Option<String>,

    /// Optional TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn is_remote_source(&self) -> bool {
        self.input_source.starts_with("http")
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("input_source", &self.input_source)?;
        if self.is_remote_source() {
            validation::validate_url("input_source", &self.input_source)?;
        } else {
            validation::validate_path("input_source", &self.input_source)?;
            validation::validate_file_extension(
                "input_source",
                &self.input_source,
                &SUPPORTED_INPUT_EXTENSIONS,
            )?;
        }
        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
        }
        validation::validate_range("workers", self.workers, 1, 64)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_source(&self) -> &str {
        &self.input_source
    }

    fn output_path(&self) -> Option<&str> {
        self.output.as_deref()
    }

    fn csv_output(&self) -> bool {
        self.csv
    }

    fn parallel(&self) -> bool {
        self.parallel
    }

    fn workers(&self) -> usize {
        self.workers
    }
}
