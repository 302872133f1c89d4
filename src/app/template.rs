use crate::adapters::input::URL_COLUMN;
use crate::adapters::xlsx;
use crate::core::Storage;
use crate::utils::error::{Result, TrackerError};

pub const TEMPLATE_XLSX: &str = "reddit_tracker_template.xlsx";
pub const TEMPLATE_CSV: &str = "reddit_tracker_template.csv";

pub const EXAMPLE_URLS: [&str; 2] = [
    "https://www.reddit.com/r/AskReddit/comments/18q7xe4/what_is_something/keslmx5/",
    "https://www.reddit.com/r/funny/comments/18pz3k1/my_dog_loves_the_snow/ket5r8q/",
];

pub const INSTRUCTIONS: [&str; 4] = [
    "1. Open the file in Excel or Google Sheets",
    "2. Delete the example URLs",
    "3. Add your Reddit comment URLs (one per row)",
    "4. Upload to the web interface or use the URL",
];

fn xlsx_rows() -> Vec<&'static str> {
    let mut rows = EXAMPLE_URLS.to_vec();
    rows.push("");
    rows.push("# Add your comment URLs below (delete these examples)");
    rows.extend([""; 4]);
    rows
}

fn csv_rows() -> Vec<&'static str> {
    let mut rows = EXAMPLE_URLS.to_vec();
    rows.push("");
    rows.push("# Add your comment URLs below");
    rows
}

pub fn template_xlsx_bytes() -> Result<Vec<u8>> {
    let rows: Vec<Vec<&str>> = xlsx_rows().into_iter().map(|cell| vec![cell]).collect();
    xlsx::write_xlsx(&[URL_COLUMN], &rows)
}

pub fn template_csv_bytes() -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([URL_COLUMN])?;
    for cell in csv_rows() {
        writer.write_record([cell])?;
    }
    writer
        .into_inner()
        .map_err(|e| TrackerError::IoError(e.into_error()))
}

/// Writes the starter spreadsheets users fill with their comment URLs.
pub struct TemplateWriter<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> TemplateWriter<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub async fn create_template(&self) -> Result<String> {
        self.storage
            .write_file(TEMPLATE_XLSX, &template_xlsx_bytes()?)
            .await?;
        tracing::info!("✅ Template created: {}", TEMPLATE_XLSX);
        Ok(TEMPLATE_XLSX.to_string())
    }

    pub async fn create_csv_template(&self) -> Result<String> {
        self.storage
            .write_file(TEMPLATE_CSV, &template_csv_bytes()?)
            .await?;
        tracing::info!("✅ CSV template created: {}", TEMPLATE_CSV);
        Ok(TEMPLATE_CSV.to_string())
    }

    pub async fn create_all(&self) -> Result<Vec<String>> {
        Ok(vec![
            self.create_template().await?,
            self.create_csv_template().await?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::input::{extract_comment_urls, InputLoader};
    use crate::config::cli::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_templates_load_back_as_input() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let written = TemplateWriter::new(&storage).create_all().await.unwrap();
        assert_eq!(written, vec![TEMPLATE_XLSX, TEMPLATE_CSV]);

        let loader = InputLoader::new().unwrap();
        for name in written {
            let path = storage.resolve(&name);
            let table = loader.load_from_file(path.to_str().unwrap()).unwrap();
            assert_eq!(table.headers, vec![URL_COLUMN]);

            let urls = extract_comment_urls(&table).unwrap();
            assert_eq!(urls.valid, EXAMPLE_URLS.to_vec());
            // 說明列不是合法網址
            assert_eq!(urls.invalid.len(), 1);
            assert!(urls.invalid[0].starts_with('#'));
        }
    }
}
