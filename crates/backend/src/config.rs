use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_UNIT_RANGE: &str = "Data!A:D";
pub const DEFAULT_NOTES_RANGE: &str = "Notes!A:A";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    /// Google Sheets values API.
    Google { sheet_id: String, api_key: String },
    /// JSON snapshot on disk, for offline exercises.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub assets_dir: PathBuf,
    pub source: SourceConfig,
    pub unit_range: String,
    pub notes_range: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. `SHEET_FILE` wins over the Google settings.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match var("PORT") {
            Some(p) => p.parse().with_context(|| format!("PORT={p} is not a port number"))?,
            None => 3000,
        };

        let source = match (var("SHEET_FILE"), var("SHEET_ID"), var("SHEETS_API_KEY")) {
            (Some(file), _, _) => SourceConfig::File(PathBuf::from(file)),
            (None, Some(sheet_id), Some(api_key)) => SourceConfig::Google { sheet_id, api_key },
            (None, Some(_), None) => return Err(anyhow!("SHEET_ID is set but SHEETS_API_KEY is missing")),
            (None, None, _) => {
                return Err(anyhow!(
                    "no data source configured: set SHEET_FILE, or SHEET_ID and SHEETS_API_KEY"
                ))
            }
        };

        let secs = |key: &str, default: u64| -> Result<Duration> {
            let value = match var(key) {
                Some(v) => v
                    .parse::<u64>()
                    .with_context(|| format!("{key}={v} is not a number of seconds"))?,
                None => default,
            };
            if value == 0 {
                return Err(anyhow!("{key} must be greater than zero"));
            }
            Ok(Duration::from_secs(value))
        };

        Ok(Config {
            port,
            assets_dir: PathBuf::from(var("ASSETS_DIR").unwrap_or_else(|| "assets".to_string())),
            source,
            unit_range: var("UNIT_RANGE").unwrap_or_else(|| DEFAULT_UNIT_RANGE.to_string()),
            notes_range: var("NOTES_RANGE").unwrap_or_else(|| DEFAULT_NOTES_RANGE.to_string()),
            poll_interval: secs("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
        })
    }
}
