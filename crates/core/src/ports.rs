use crate::domain::Booking;
use crate::error::StoreError;
use crate::insights::InsightReport;
use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// A single cell as the backend reports it, before typing.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Text view of the cell; numbers are rendered, `Null` has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(value) => Some(value.to_string()),
            CellValue::Real(value) => Some(value.to_string()),
            CellValue::Text(text) => Some(text.trim().to_string()),
        }
    }

    /// Numeric view of the cell. Non-finite values ("NaN", "inf") have none.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Null => None,
            CellValue::Integer(value) => Some(*value as f64),
            CellValue::Real(value) => Some(*value),
            // Spreadsheets hand back "15,000" for formatted numbers
            CellValue::Text(text) => text.trim().replace(',', "").parse().ok(),
        }?;
        value.is_finite().then_some(value)
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CellValue::Integer(0) => Some(false),
            CellValue::Integer(1) => Some(true),
            CellValue::Real(value) if *value == 0.0 => Some(false),
            CellValue::Real(value) if *value == 1.0 => Some(true),
            CellValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "no" => Some(false),
                "1" | "true" | "yes" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Real(value) => write!(f, "{value}"),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

/// Row-tuples fetched from a table together with the column names that label them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Handle to a configured backend. Passed explicitly to whoever needs storage;
/// every call to `connect` yields a fresh, independently released session.
pub trait StorageBackend {
    fn name(&self) -> &str;

    fn connect(&self) -> std::result::Result<Box<dyn StorageSession + '_>, StoreError>;
}

/// One acquired connection. Implementations release their resources on drop,
/// so a session abandoned after a failed call is still cleaned up.
pub trait StorageSession {
    fn fetch_all(&mut self, table: &str) -> std::result::Result<RowSet, StoreError>;

    fn append(
        &mut self,
        table: &str,
        columns: &[&str],
        values: &[CellValue],
    ) -> std::result::Result<(), StoreError>;

    fn close(self: Box<Self>) -> std::result::Result<(), StoreError>;
}

/// Writes the raw booking table somewhere a user can download it.
pub trait BookingExporter {
    fn export(&self, bookings: &[Booking]) -> Result<()>;
}

/// Renders aggregated insights for display.
pub trait ReportWriter {
    fn write(&self, report: &InsightReport) -> Result<()>;
}

/// Table names end up inside SQL text and A1 ranges, so only plain identifiers
/// (letters, digits, underscores, inner spaces) are accepted.
pub fn is_valid_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    !table.ends_with(' ')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_as_f64_accepts_formatted_text() {
        assert_eq!(CellValue::Text("15,000".into()).as_f64(), Some(15000.0));
        assert_eq!(CellValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(CellValue::Text("abc".into()).as_f64(), None);
        assert_eq!(CellValue::Null.as_f64(), None);
        assert_eq!(CellValue::Text("NaN".into()).as_f64(), None);
        assert_eq!(CellValue::Text("inf".into()).as_f64(), None);
        assert_eq!(CellValue::Real(f64::NEG_INFINITY).as_f64(), None);
    }

    #[test]
    fn test_cell_as_flag() {
        assert_eq!(CellValue::Integer(1).as_flag(), Some(true));
        assert_eq!(CellValue::Real(0.0).as_flag(), Some(false));
        assert_eq!(CellValue::Text("Yes".into()).as_flag(), Some(true));
        assert_eq!(CellValue::Text("FALSE".into()).as_flag(), Some(false));
        assert_eq!(CellValue::Integer(2).as_flag(), None);
    }

    #[test]
    fn test_cell_blankness() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::Text("   ".into()).is_blank());
        assert!(!CellValue::Integer(0).is_blank());
    }

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("hotel_bookings"));
        assert!(is_valid_table_name("Sheet1"));
        assert!(is_valid_table_name("Booking Data"));
        assert!(is_valid_table_name("_staging"));
    }

    #[test]
    fn test_invalid_table_names() {
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("1bookings"));
        assert!(!is_valid_table_name("bookings; DROP TABLE x"));
        assert!(!is_valid_table_name("book\"ings"));
        assert!(!is_valid_table_name("trailing "));
    }
}
