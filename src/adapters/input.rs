use crate::adapters::xlsx::{self, SheetTable};
use crate::utils::error::{Result, TrackerError};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const URL_COLUMN: &str = "comment_url";

const SHARE_HINT: &str = "Please share the sheet: File → Share → Anyone with the link can view";

pub fn is_google_sheets_url(url: &str) -> bool {
    url.contains("docs.google.com/spreadsheets")
}

pub fn extract_sheet_id(url: &str) -> Result<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9-_]+)").expect("static regex"));
    re.captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| TrackerError::input(format!("Invalid Google Sheets URL: {}", url)))
}

/// Public CSV export URL for a sharing link; keeps the `gid` of the selected tab.
pub fn convert_to_export_url(sheets_url: &str) -> Result<String> {
    static GID: OnceLock<Regex> = OnceLock::new();
    let sheet_id = extract_sheet_id(sheets_url)?;
    let gid_re = GID.get_or_init(|| Regex::new(r"[?&#]gid=(\d+)").expect("static regex"));
    let gid = gid_re
        .captures(sheets_url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "0".to_string());

    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
        sheet_id, gid
    ))
}

/// Latin-1 maps each byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn parse_csv(bytes: &[u8]) -> Result<SheetTable> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            tracing::debug!("CSV is not valid UTF-8, decoding as latin-1");
            decode_latin1(bytes)
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(SheetTable { headers, rows })
}

/// Comment URLs found in a sheet, split into valid Reddit comment links and rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedUrls {
    pub total: usize,
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

pub fn is_comment_url(url: &str) -> bool {
    url.contains("reddit.com") && url.contains("/comments/")
}

pub fn extract_comment_urls(table: &SheetTable) -> Result<ExtractedUrls> {
    let index = table.column_index(URL_COLUMN).ok_or_else(|| {
        TrackerError::input(format!(
            "Spreadsheet must contain '{}' column.\nFound columns: {}\n\
             Please rename your column to exactly '{}' (all lowercase, with underscore)",
            URL_COLUMN,
            table.headers.join(", "),
            URL_COLUMN
        ))
    })?;

    let mut extracted = ExtractedUrls::default();
    for value in table.column(index) {
        let url = value.trim();
        if url.is_empty() || url.eq_ignore_ascii_case("nan") {
            continue;
        }
        extracted.total += 1;
        if is_comment_url(url) {
            extracted.valid.push(url.to_string());
        } else {
            extracted.invalid.push(url.to_string());
        }
    }

    Ok(extracted)
}

/// Loads comment URLs from a Google Sheets link, a download URL or a local file.
#[derive(Debug, Clone)]
pub struct InputLoader {
    client: Client,
}

impl InputLoader {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client })
    }

    pub async fn load_from_google_sheets_export(&self, url: &str) -> Result<SheetTable> {
        let export_url = convert_to_export_url(url)?;
        self.load_csv_export(&export_url).await
    }

    async fn load_csv_export(&self, export_url: &str) -> Result<SheetTable> {
        tracing::debug!("Downloading sheet export: {}", export_url);
        let response = self
            .client
            .get(export_url)
            .send()
            .await?
            .error_for_status()?;

        // 未公開的試算表會被導向 HTML 登入頁
        let content_type = header_value(&response, CONTENT_TYPE);
        if content_type.contains("text/html") {
            return Err(TrackerError::input(format!(
                "Sheet is not publicly accessible. {}",
                SHARE_HINT
            )));
        }

        let bytes = response.bytes().await?;
        parse_csv(&bytes)
    }

    pub async fn load_from_url(&self, url: &str) -> Result<SheetTable> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = header_value(&response, CONTENT_TYPE).to_lowercase();
        let bytes = response.bytes().await?.to_vec();

        let looks_like_xlsx = url.to_lowercase().contains(".xlsx")
            || content_type.contains("excel")
            || content_type.contains("spreadsheet");

        if looks_like_xlsx {
            match xlsx::read_xlsx_bytes(bytes.clone()) {
                Ok(table) => return Ok(table),
                Err(e) => tracing::debug!("XLSX parse failed, trying CSV: {}", e),
            }
        }

        parse_csv(&bytes)
    }

    pub fn load_from_file(&self, path: &str) -> Result<SheetTable> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xlsx") | Some("xls") => xlsx::read_xlsx_file(path),
            Some("csv") => parse_csv(&std::fs::read(path)?),
            _ => Err(TrackerError::input(format!(
                "Unsupported file format: {}",
                path
            ))),
        }
    }

    pub async fn load_table(&self, input_source: &str) -> Result<SheetTable> {
        if is_google_sheets_url(input_source) {
            tracing::info!("📊 Detected Google Sheets URL");
            self.load_from_google_sheets_export(input_source)
                .await
                .map_err(|e| {
                    TrackerError::input(format!(
                        "Failed to load Google Sheets via public export: {}\n\n{}",
                        e, SHARE_HINT
                    ))
                })
        } else if input_source.starts_with("http") {
            tracing::info!("🔗 Detected download URL");
            self.load_from_url(input_source).await
        } else {
            tracing::info!("📁 Loading from local file");
            self.load_from_file(input_source)
        }
    }

    /// Loads the sheet and returns the valid comment URLs in sheet order.
    pub async fn load(&self, input_source: &str) -> Result<Vec<String>> {
        let table = self.load_table(input_source).await?;
        tracing::info!("Loaded spreadsheet with {} rows", table.rows.len());
        tracing::debug!("Columns found: {:?}", table.headers);

        let extracted = extract_comment_urls(&table)?;
        tracing::info!(
            "Found {} non-empty values in {} column",
            extracted.total,
            URL_COLUMN
        );

        if !extracted.invalid.is_empty() {
            tracing::warn!("⚠️ Skipped {} invalid URLs:", extracted.invalid.len());
            for url in extracted.invalid.iter().take(5) {
                tracing::warn!("  - {}", url);
            }
        }

        if extracted.valid.is_empty() {
            return Err(TrackerError::input(format!(
                "No valid Reddit comment URLs found.\nTotal rows: {}\nInvalid URLs: {}\n\
                 URLs must contain 'reddit.com' and '/comments/'",
                extracted.total,
                extracted.invalid.len()
            )));
        }

        tracing::info!("✓ Found {} valid comment URLs", extracted.valid.len());
        Ok(extracted.valid)
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    const SHEET: &str = "https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=42";

    #[test]
    fn test_google_sheets_detection_and_export_url() {
        assert!(is_google_sheets_url(SHEET));
        assert!(!is_google_sheets_url("https://example.com/file.csv"));
        assert_eq!(extract_sheet_id(SHEET).unwrap(), "1AbC-d_9");
        assert_eq!(
            convert_to_export_url(SHEET).unwrap(),
            "https://docs.google.com/spreadsheets/d/1AbC-d_9/export?format=csv&gid=42"
        );
        assert_eq!(
            convert_to_export_url("https://docs.google.com/spreadsheets/d/xyz/edit").unwrap(),
            "https://docs.google.com/spreadsheets/d/xyz/export?format=csv&gid=0"
        );
        assert!(extract_sheet_id("https://docs.google.com/spreadsheets/").is_err());
    }

    #[test]
    fn test_extract_filters_and_keeps_order() {
        let csv = "name,comment_url\n\
                   a, https://www.reddit.com/r/x/comments/p1/t/c1/ \n\
                   b,\n\
                   c,nan\n\
                   d,https://example.com/not-reddit\n\
                   e,https://old.reddit.com/r/y/comments/p2/t/c2/\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        let extracted = extract_comment_urls(&table).unwrap();

        assert_eq!(extracted.total, 3);
        assert_eq!(
            extracted.valid,
            vec![
                "https://www.reddit.com/r/x/comments/p1/t/c1/",
                "https://old.reddit.com/r/y/comments/p2/t/c2/"
            ]
        );
        assert_eq!(extracted.invalid, vec!["https://example.com/not-reddit"]);
    }

    #[test]
    fn test_missing_column_lists_found_columns() {
        let table = parse_csv(b"url,notes\nhttps://reddit.com/comments/a,\n").unwrap();
        let err = extract_comment_urls(&table).unwrap_err().to_string();
        assert!(err.contains("comment_url"));
        assert!(err.contains("url, notes"));
    }

    #[test]
    fn test_parse_csv_latin1_fallback() {
        let mut bytes = b"comment_url,note\nhttps://www.reddit.com/r/x/comments/p/t/c/,caf".to_vec();
        bytes.push(0xE9);
        let table = parse_csv(&bytes).unwrap();
        assert_eq!(table.rows[0][1], "café");
    }

    #[tokio::test]
    async fn test_load_local_files() {
        let temp_dir = TempDir::new().unwrap();
        let csv_path = temp_dir.path().join("input.csv");
        std::fs::write(
            &csv_path,
            "comment_url\nhttps://www.reddit.com/r/x/comments/p1/t/c1/\n",
        )
        .unwrap();

        let loader = InputLoader::new().unwrap();
        let urls = loader.load(csv_path.to_str().unwrap()).await.unwrap();
        assert_eq!(urls.len(), 1);

        let txt_path = temp_dir.path().join("input.txt");
        std::fs::write(&txt_path, "comment_url\n").unwrap();
        assert!(loader.load(txt_path.to_str().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_no_valid_urls_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("input.csv");
        std::fs::write(&path, "comment_url\nhttps://example.com/a\n\n").unwrap();

        let loader = InputLoader::new().unwrap();
        let err = loader.load(path.to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("No valid Reddit comment URLs found"));
    }

    #[tokio::test]
    async fn test_load_from_url_csv_and_html_export() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/sheet.csv");
            then.status(200)
                .header("Content-Type", "text/csv")
                .body("comment_url\nhttps://www.reddit.com/r/x/comments/p1/t/c1/\n");
        });
        server.mock(|when, then| {
            when.method(GET).path("/private");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body("<html>sign in</html>");
        });

        let loader = InputLoader::new().unwrap();
        let urls = loader.load(&server.url("/sheet.csv")).await.unwrap();
        assert_eq!(urls, vec!["https://www.reddit.com/r/x/comments/p1/t/c1/"]);

        let err = loader
            .load_csv_export(&server.url("/private"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not publicly accessible"));
    }

    #[tokio::test]
    async fn test_load_from_url_xlsx() {
        let bytes = xlsx::write_xlsx(
            &["comment_url"],
            &[vec!["https://www.reddit.com/r/x/comments/p9/t/c9/"]],
        )
        .unwrap();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/download.xlsx");
            then.status(200)
                .header(
                    "Content-Type",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                )
                .body(bytes);
        });

        let loader = InputLoader::new().unwrap();
        let urls = loader.load(&server.url("/download.xlsx")).await.unwrap();
        assert_eq!(urls, vec!["https://www.reddit.com/r/x/comments/p9/t/c9/"]);
    }

    #[tokio::test]
    async fn test_xlsx_looking_download_falls_back_to_csv() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/x.xlsx");
            then.status(200)
                .header("Content-Type", "application/vnd.ms-excel")
                .body("comment_url\nhttps://www.reddit.com/r/x/comments/p3/t/c3/\n");
        });

        let loader = InputLoader::new().unwrap();
        let urls = loader.load(&server.url("/x.xlsx")).await.unwrap();
        assert_eq!(urls, vec!["https://www.reddit.com/r/x/comments/p3/t/c3/"]);
    }
}
