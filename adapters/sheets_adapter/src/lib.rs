//! Google Sheets storage backend.
//!
//! One worksheet plays the role of a table: row 1 is the header, every row
//! below it is a record. Access uses a service account: a signed JWT is traded
//! for a bearer token on every `connect`, then the spreadsheet is located by
//! name through the Drive API.

mod auth;
mod grid;

pub use auth::ServiceAccountKey;

use booking_core::ports::{is_valid_table_name, CellValue, RowSet, StorageBackend, StorageSession};
use booking_core::StoreError;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_API: &str = "https://www.googleapis.com";

/// Values are stored as sent: text stays text, so no formula evaluation and
/// no locale date or number coercion.
const APPEND_QUERY: &[(&str, &str)] = &[
    ("valueInputOption", "RAW"),
    ("insertDataOption", "INSERT_ROWS"),
];

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub spreadsheet_name: String,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub timeout: Duration,
}

pub struct SheetsBackend {
    key: ServiceAccountKey,
    settings: SheetsSettings,
    http: Client,
}

impl SheetsBackend {
    pub fn new(key: ServiceAccountKey, settings: SheetsSettings) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(StoreError::connection)?;
        Ok(Self { key, settings, http })
    }

    fn find_spreadsheet(&self, token: &str) -> Result<String, StoreError> {
        let query = format!(
            "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
            self.settings.spreadsheet_name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let url = format!("{}/drive/v3/files", self.settings.drive_api_base.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id)"), ("pageSize", "1")])
            .send()
            .map_err(StoreError::connection)?;
        let list: FileList = checked(response)
            .map_err(StoreError::Connection)?
            .json()
            .map_err(StoreError::connection)?;

        first_file_id(list, &self.settings.spreadsheet_name, &self.key.client_email)
    }
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

/// Zero matches means the name is wrong or the sheet is not shared with the
/// service account; both surface as a connection failure.
fn first_file_id(
    list: FileList,
    spreadsheet: &str,
    client_email: &str,
) -> Result<String, StoreError> {
    list.files.into_iter().next().map(|file| file.id).ok_or_else(|| {
        StoreError::Connection(format!(
            "spreadsheet '{spreadsheet}' not found or not shared with {client_email}"
        ))
    })
}

impl StorageBackend for SheetsBackend {
    fn name(&self) -> &str {
        "sheets"
    }

    fn connect(&self) -> Result<Box<dyn StorageSession + '_>, StoreError> {
        let token = auth::fetch_access_token(&self.http, &self.key)?;
        let spreadsheet_id = self.find_spreadsheet(&token)?;
        info!(
            spreadsheet = %self.settings.spreadsheet_name,
            id = %spreadsheet_id,
            "Connected to spreadsheet"
        );
        Ok(Box::new(SheetsSession {
            http: &self.http,
            api_base: self.settings.sheets_api_base.trim_end_matches('/'),
            token,
            spreadsheet_id,
        }))
    }
}

/// Holds a bearer token; nothing to release beyond dropping it.
struct SheetsSession<'a> {
    http: &'a Client,
    api_base: &'a str,
    token: String,
    spreadsheet_id: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsSession<'_> {
    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_base,
            self.spreadsheet_id,
            grid::encode_range(range)
        )
    }

    fn read(&self, range: &str) -> Result<Vec<Vec<serde_json::Value>>, String> {
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(&self.token)
            .query(&[
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ])
            .send()
            .map_err(|e| e.to_string())?;
        let range: ValueRange = checked(response)?.json().map_err(|e| e.to_string())?;
        Ok(range.values)
    }

    fn append_rows(&self, table: &str, rows: Vec<Vec<serde_json::Value>>) -> Result<(), String> {
        let url = format!("{}:append", self.values_url(&grid::a1_range(table, "A1")));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .query(APPEND_QUERY)
            .json(&json!({ "majorDimension": "ROWS", "values": rows }))
            .send()
            .map_err(|e| e.to_string())?;
        checked(response)?;
        Ok(())
    }
}

impl StorageSession for SheetsSession<'_> {
    fn fetch_all(&mut self, table: &str) -> Result<RowSet, StoreError> {
        check_table(table)?;
        let raw = self
            .read(&grid::a1_sheet(table))
            .map_err(StoreError::Connection)?;
        let rows = grid::to_row_set(raw);
        debug!(worksheet = table, rows = rows.rows.len(), "Worksheet read");
        Ok(rows)
    }

    fn append(
        &mut self,
        table: &str,
        columns: &[&str],
        values: &[CellValue],
    ) -> Result<(), StoreError> {
        check_table(table)?;
        let header = self
            .read(&grid::a1_range(table, "1:1"))
            .map_err(StoreError::Write)?
            .into_iter()
            .next()
            .map(|row| row.iter().map(grid::header_text).collect::<Vec<_>>())
            .unwrap_or_default();

        let rows = grid::rows_for_append(&header, columns, values);
        self.append_rows(table, rows).map_err(StoreError::Write)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

fn check_table(table: &str) -> Result<(), StoreError> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(StoreError::Connection(format!("invalid worksheet name '{table}'")))
    }
}

/// Turns a non-2xx response into its status plus body text.
fn checked(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(format!("HTTP {status}: {}", body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_file_wins() {
        let list: FileList = serde_json::from_value(json!({
            "files": [{ "id": "abc123" }, { "id": "def456" }]
        }))
        .unwrap();
        assert_eq!(first_file_id(list, "Hotel Bookings", "svc@example.com").unwrap(), "abc123");
    }

    #[test]
    fn test_no_matching_spreadsheet_is_connection_error() {
        let list: FileList = serde_json::from_value(json!({})).unwrap();
        let err = first_file_id(list, "Hotel Bookings", "svc@example.com").unwrap_err();
        match err {
            StoreError::Connection(message) => {
                assert!(message.contains("Hotel Bookings"));
                assert!(message.contains("svc@example.com"));
            }
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[test]
    fn test_append_stores_values_verbatim() {
        assert!(APPEND_QUERY.contains(&("valueInputOption", "RAW")));
        assert!(APPEND_QUERY.contains(&("insertDataOption", "INSERT_ROWS")));
    }

    #[test]
    fn test_invalid_worksheet_name_rejected() {
        assert!(check_table("Sheet1").is_ok());
        assert!(matches!(check_table("x'; drop"), Err(StoreError::Connection(_))));
    }
}
