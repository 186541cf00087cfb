//! Configuration loading for `hotel-dash`.
//!
//! Settings come from a TOML file; a missing file at the default location
//! falls back to a local SQLite database. Secrets (the spreadsheet service
//! account blob) are expected from the environment, see `main.rs`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use booking_core::ports::is_valid_table_name;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "hotel-dash.toml";
pub const DEFAULT_TABLE: &str = "hotel_bookings";
pub const DEFAULT_DB_PATH: &str = "hotel_bookings.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Table name (relational) or worksheet title (spreadsheet).
    pub table: String,
    pub backend: BackendConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            table: DEFAULT_TABLE.to_string(),
            backend: BackendConfig::Sqlite(SqliteConfig::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Sqlite(SqliteConfig),
    Sheets(SheetsConfig),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SqliteConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_name: String,
    /// Service account key file; the environment blob takes precedence.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default = "default_sheets_api")]
    pub sheets_api_base: String,
    #[serde(default = "default_drive_api")]
    pub drive_api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_sheets_api() -> String {
    sheets_adapter::DEFAULT_SHEETS_API.to_string()
}

fn default_drive_api() -> String {
    sheets_adapter::DEFAULT_DRIVE_API.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Load and validate configuration.
///
/// A missing file is only tolerated when `required` is false (the default
/// path was not overridden); then the built-in defaults apply.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else if required {
        bail!("Config file not found: {}", path.display());
    } else {
        AppConfig::default()
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    Ok(toml::from_str(content)?)
}

fn validate_config(config: &AppConfig) -> Result<()> {
    anyhow::ensure!(
        is_valid_table_name(&config.table),
        "table must be a plain name (letters, digits, underscores, inner spaces), got '{}'",
        config.table
    );
    anyhow::ensure!(!config.log_level.trim().is_empty(), "log_level must not be empty");

    match &config.backend {
        BackendConfig::Sqlite(sqlite) => {
            anyhow::ensure!(
                !sqlite.path.as_os_str().is_empty(),
                "sqlite path must not be empty"
            );
            anyhow::ensure!(
                sqlite.busy_timeout_ms > 0,
                "sqlite busy_timeout_ms must be positive"
            );
        }
        BackendConfig::Sheets(sheets) => {
            anyhow::ensure!(
                !sheets.spreadsheet_name.trim().is_empty(),
                "sheets spreadsheet_name must not be empty"
            );
            anyhow::ensure!(sheets.timeout_secs > 0, "sheets timeout_secs must be positive");
            for (name, url) in [
                ("sheets_api_base", &sheets.sheets_api_base),
                ("drive_api_base", &sheets.drive_api_base),
            ] {
                anyhow::ensure!(
                    url.starts_with("https://") || url.starts_with("http://"),
                    "{name} must be an http(s) URL, got '{url}'"
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_sqlite_backend() {
        let config = parse_config(
            r#"
            log_level = "debug"
            table = "bookings"

            [backend]
            kind = "sqlite"
            path = "/var/lib/dash/bookings.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.table, "bookings");
        assert_eq!(
            config.backend,
            BackendConfig::Sqlite(SqliteConfig {
                path: PathBuf::from("/var/lib/dash/bookings.db"),
                busy_timeout_ms: 5000,
            })
        );
    }

    #[test]
    fn test_sheets_backend_defaults() {
        let config = parse_config(
            r#"
            table = "Sheet1"

            [backend]
            kind = "sheets"
            spreadsheet_name = "Hotel Bookings"
            "#,
        )
        .unwrap();
        validate_config(&config).unwrap();
        match config.backend {
            BackendConfig::Sheets(sheets) => {
                assert_eq!(sheets.spreadsheet_name, "Hotel Bookings");
                assert_eq!(sheets.credentials_path, None);
                assert_eq!(sheets.sheets_api_base, sheets_adapter::DEFAULT_SHEETS_API);
                assert_eq!(sheets.timeout_secs, 30);
            }
            other => panic!("expected sheets backend, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_backend_kind_fails() {
        assert!(parse_config("[backend]\nkind = \"mysql\"\n").is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.table = "bookings; --".to_string();
        assert!(validate_config(&config).is_err());

        let config = AppConfig {
            backend: BackendConfig::Sheets(SheetsConfig {
                spreadsheet_name: "  ".to_string(),
                credentials_path: None,
                token_uri: None,
                sheets_api_base: default_sheets_api(),
                drive_api_base: default_drive_api(),
                timeout_secs: 30,
            }),
            ..AppConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_file_handling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        assert_eq!(load_config(&path, false).unwrap(), AppConfig::default());
        assert!(load_config(&path, true).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hotel-dash.toml");
        std::fs::write(&path, "table = \"archive\"\n").unwrap();
        assert_eq!(load_config(&path, true).unwrap().table, "archive");
    }
}
