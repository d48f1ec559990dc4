//! Data provider for the unit and notes tabs.
//!
//! Reads either the Google Sheets values API or a JSON snapshot file.

use std::path::PathBuf;
use std::time::Duration;

use battle_tracker_shared::models::SheetSnapshot;
use serde::Deserialize;

use crate::config::{Config, SourceConfig};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";

#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    Request(String),
    /// The API answered with an error body.
    Api { status: u16, message: String },
    Parse(String),
    File(String),
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::Request(msg) => write!(f, "Request failed: {}", msg),
            SheetError::Api { status, message } => write!(f, "{} (HTTP {})", message, status),
            SheetError::Parse(msg) => write!(f, "Unexpected response: {}", msg),
            SheetError::File(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SheetError {}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Render a cell as text. Formatted values arrive as strings; anything else is stringified.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_value_range(body: &str) -> Result<Vec<Vec<String>>, SheetError> {
    let range: ValueRange =
        serde_json::from_str(body).map_err(|e| SheetError::Parse(e.to_string()))?;
    Ok(range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

fn parse_api_error(status: u16, body: &str) -> SheetError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| "Sheets API request failed".to_string());
    SheetError::Api { status, message }
}

pub struct SheetsClient {
    http: reqwest::Client,
    base: reqwest::Url,
    sheet_id: String,
    api_key: String,
}

impl SheetsClient {
    pub fn new(sheet_id: &str, api_key: &str, timeout: Duration) -> Result<Self, SheetError> {
        Self::with_base(SHEETS_API_BASE, sheet_id, api_key, timeout)
    }

    pub fn with_base(
        base: &str,
        sheet_id: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, SheetError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SheetError::Request(e.to_string()))?;
        let base = reqwest::Url::parse(base).map_err(|e| SheetError::Request(e.to_string()))?;
        Ok(SheetsClient {
            http,
            base,
            sheet_id: sheet_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `{base}/spreadsheets/{id}/values/{range}?key=..`, with the range percent-encoded.
    pub fn values_url(&self, range: &str) -> Result<reqwest::Url, SheetError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetError::Request(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(["spreadsheets", self.sheet_id.as_str(), "values", range]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    pub async fn values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let url = self.values_url(range)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SheetError::Request(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SheetError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &body));
        }
        parse_value_range(&body)
    }
}

pub enum DataSource {
    Google(SheetsClient),
    File(PathBuf),
}

#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    units: Vec<Vec<String>>,
    #[serde(default)]
    notes: Vec<Vec<String>>,
}

/// Polls the configured data source for both tabs.
pub struct SheetService {
    source: DataSource,
    unit_range: String,
    notes_range: String,
}

impl SheetService {
    pub fn new(source: DataSource, unit_range: &str, notes_range: &str) -> Self {
        SheetService {
            source,
            unit_range: unit_range.to_string(),
            notes_range: notes_range.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SheetError> {
        let source = match &config.source {
            SourceConfig::Google { sheet_id, api_key } => {
                DataSource::Google(SheetsClient::new(sheet_id, api_key, config.request_timeout)?)
            }
            SourceConfig::File(path) => DataSource::File(path.clone()),
        };
        Ok(Self::new(source, &config.unit_range, &config.notes_range))
    }

    pub async fn poll(&self) -> Result<SheetSnapshot, SheetError> {
        let (units, notes) = match &self.source {
            DataSource::Google(client) => {
                tokio::try_join!(
                    client.values(&self.unit_range),
                    client.values(&self.notes_range)
                )?
            }
            DataSource::File(path) => {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| SheetError::File(format!("Failed to read {}: {}", path.display(), e)))?;
                let file: SnapshotFile = serde_json::from_str(&data)
                    .map_err(|e| SheetError::File(format!("Failed to parse {}: {}", path.display(), e)))?;
                (file.units, file.notes)
            }
        };
        tracing::debug!(units = units.len(), notes = notes.len(), "Polled sheet");
        Ok(SheetSnapshot {
            units,
            notes,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new("sheet-123", "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = client().values_url("Data!A:D").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Data!A:D?key=secret"
        );
        let url = client().values_url("Range 3/5!A:A").unwrap();
        assert!(url.path().ends_with("/values/Range%203%2F5!A:A"));
    }

    #[test]
    fn test_parse_value_range() {
        let body = r##"{"range":"Data!A1:D3","majorDimension":"ROWS","values":[["Unit","# PAX","Location","Time"],["BN","30","USMA","12:00"],["Medic",1,"USMA",null]]}"##;
        let rows = parse_value_range(body).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["BN", "30", "USMA", "12:00"]);
        assert_eq!(rows[2], vec!["Medic", "1", "USMA", ""]);
    }

    #[test]
    fn test_parse_empty_value_range() {
        let rows = parse_value_range(r#"{"range":"Notes!A1:A1000","majorDimension":"ROWS"}"#).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_api_error_message() {
        let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            parse_api_error(403, body),
            SheetError::Api {
                status: 403,
                message: "The caller does not have permission".to_string()
            }
        );
    }

    #[test]
    fn test_parse_api_error_without_body() {
        let err = parse_api_error(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Sheets API request failed (HTTP 502)");
    }

    #[tokio::test]
    async fn test_poll_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercise.json");
        std::fs::write(
            &path,
            r#"{"units":[["BN","30","USMA","12:00"]],"notes":[["Phase I"],["Stand by"]]}"#,
        )
        .unwrap();
        let service = SheetService::new(DataSource::File(path), "Data!A:D", "Notes!A:A");
        let snap = service.poll().await.unwrap();
        assert_eq!(snap.units, vec![vec!["BN", "30", "USMA", "12:00"]]);
        assert_eq!(snap.notes.len(), 2);
        assert!(!snap.fetched_at.is_empty());
    }

    #[tokio::test]
    async fn test_poll_missing_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = SheetService::new(
            DataSource::File(dir.path().join("missing.json")),
            "Data!A:D",
            "Notes!A:A",
        );
        let err = service.poll().await.unwrap_err();
        assert!(matches!(err, SheetError::File(_)));
    }
}
