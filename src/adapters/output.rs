use crate::adapters::xlsx;
use crate::core::Storage;
use crate::domain::model::{Rank, TrackingResult, OUTPUT_COLUMNS};
use crate::utils::error::Result;
use chrono::Local;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

pub fn generate_output_filename(format: OutputFormat) -> String {
    format!(
        "reddit_tracker_output_{}.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub fn csv_bytes(results: &[TrackingResult]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(OUTPUT_COLUMNS)?;
    for result in results {
        writer.write_record(result.as_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::utils::error::TrackerError::IoError(e.into_error()))
}

pub fn xlsx_bytes(results: &[TrackingResult]) -> Result<Vec<u8>> {
    let rows: Vec<Vec<&str>> = results.iter().map(|r| r.as_row().to_vec()).collect();
    xlsx::write_xlsx(&OUTPUT_COLUMNS, &rows)
}

/// Writes result sheets through a [`Storage`] backend.
pub struct OutputWriter<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> OutputWriter<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub async fn write(
        &self,
        results: &[TrackingResult],
        format: OutputFormat,
        output_path: Option<&str>,
    ) -> Result<String> {
        let path = output_path
            .map(str::to_string)
            .unwrap_or_else(|| generate_output_filename(format));

        let data = match format {
            OutputFormat::Xlsx => xlsx_bytes(results)?,
            OutputFormat::Csv => csv_bytes(results)?,
        };

        tracing::debug!("Writing {} bytes to {}", data.len(), path);
        self.storage.write_file(&path, &data).await?;
        Ok(path)
    }

    pub async fn create_output_spreadsheet(
        &self,
        results: &[TrackingResult],
        output_path: Option<&str>,
    ) -> Result<String> {
        self.write(results, OutputFormat::Xlsx, output_path).await
    }

    pub async fn create_csv_output(
        &self,
        results: &[TrackingResult],
        output_path: Option<&str>,
    ) -> Result<String> {
        self.write(results, OutputFormat::Csv, output_path).await
    }
}

/// Status and rank distribution of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub status_counts: BTreeMap<String, usize>,
    pub rank_counts: Vec<(String, usize)>,
}

impl RunSummary {
    pub fn from_results(results: &[TrackingResult]) -> Self {
        let mut status_counts = BTreeMap::new();
        let mut by_rank: BTreeMap<Rank, usize> = BTreeMap::new();

        for result in results {
            *status_counts.entry(result.status.clone()).or_insert(0) += 1;
            match result.present_rank.parse::<Rank>() {
                Ok(rank) => *by_rank.entry(rank).or_insert(0) += 1,
                Err(e) => tracing::warn!("Skipping {} in rank distribution: {}", result.url, e),
            }
        }

        // Top(1..) 排在 Out of Top 5 之前
        let rank_counts = by_rank
            .into_iter()
            .map(|(rank, count)| (rank.to_string(), count))
            .collect();

        Self {
            status_counts,
            rank_counts,
        }
    }

    pub fn print(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SUMMARY");
        println!("{}", "=".repeat(60));

        println!("\nStatus Distribution:");
        for (status, count) in &self.status_counts {
            println!("  {}: {}", status, count);
        }

        println!("\nRank Distribution:");
        for (rank, count) in &self.rank_counts {
            println!("  Rank {}: {}", rank, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::domain::model::Status;
    use tempfile::TempDir;

    fn results() -> Vec<TrackingResult> {
        vec![
            TrackingResult::new(
                "https://www.reddit.com/r/a/comments/p1/t/c1/",
                Status::RankingChanged,
                Rank::Top(2),
                Some("4".to_string()),
            ),
            TrackingResult::new(
                "https://www.reddit.com/r/a/comments/p2/t/c2/",
                Status::NoChange,
                Rank::OutOfTop,
                None,
            ),
        ]
    }

    #[test]
    fn test_filename_pattern() {
        let name = generate_output_filename(OutputFormat::Csv);
        assert!(name.starts_with("reddit_tracker_output_"));
        assert!(name.ends_with(".csv"));
        // reddit_tracker_output_ + YYYYmmdd_HHMMSS + .csv
        assert_eq!(name.len(), "reddit_tracker_output_".len() + 15 + 4);
    }

    #[test]
    fn test_csv_has_exact_columns() {
        let data = String::from_utf8(csv_bytes(&results()).unwrap()).unwrap();
        let mut lines = data.lines();
        assert_eq!(lines.next(), Some("URL,Status,Present Rank,Previous Rank"));
        assert_eq!(
            lines.next(),
            Some("https://www.reddit.com/r/a/comments/p1/t/c1/,Ranking Changed,2,4")
        );
        assert_eq!(
            lines.next(),
            Some("https://www.reddit.com/r/a/comments/p2/t/c2/,No Change,Out of Top 5,N/A")
        );
    }

    #[tokio::test]
    async fn test_spreadsheet_written_through_storage() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let writer = OutputWriter::new(&storage);

        let path = writer
            .create_output_spreadsheet(&results(), Some("out/results.xlsx"))
            .await
            .unwrap();
        assert_eq!(path, "out/results.xlsx");

        let table = xlsx::read_xlsx_file(temp_dir.path().join("out/results.xlsx")).unwrap();
        assert_eq!(table.headers, OUTPUT_COLUMNS.to_vec());
        assert_eq!(table.rows[1][2], "Out of Top 5");
    }

    #[test]
    fn test_summary_orders_ranks() {
        let summary = RunSummary::from_results(&results());
        assert_eq!(summary.status_counts.get("No Change"), Some(&1));
        assert_eq!(
            summary.rank_counts,
            vec![("2".to_string(), 1), ("Out of Top 5".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_counts_every_parsed_rank() {
        let mut rows = results();
        let mut stored = rows[0].clone();
        stored.present_rank = "7".to_string();
        rows.push(stored);
        let mut broken = rows[1].clone();
        broken.present_rank = "unknown".to_string();
        rows.push(broken);

        let summary = RunSummary::from_results(&rows);
        assert_eq!(
            summary.rank_counts,
            vec![
                ("2".to_string(), 1),
                ("7".to_string(), 1),
                ("Out of Top 5".to_string(), 1)
            ]
        );
        assert_eq!(summary.status_counts.values().sum::<usize>(), 4);
    }
}
