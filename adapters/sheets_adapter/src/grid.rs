use booking_core::ports::{CellValue, RowSet};
use serde_json::{json, Value};
use urlencoding::encode;

/// `'Sheet Name'` with embedded quotes doubled, as A1 notation wants it.
pub(crate) fn a1_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

pub(crate) fn a1_range(sheet: &str, cells: &str) -> String {
    format!("{}!{cells}", a1_sheet(sheet))
}

/// Percent-encodes a range for use as a URL path segment.
pub(crate) fn encode_range(range: &str) -> String {
    encode(range).into_owned()
}

pub(crate) fn to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(flag) => CellValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(int) => CellValue::Integer(int),
            None => number.as_f64().map_or(CellValue::Null, CellValue::Real),
        },
        Value::String(text) if text.is_empty() => CellValue::Null,
        Value::String(text) => CellValue::Text(text.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

pub(crate) fn to_json(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => json!(""),
        CellValue::Integer(int) => json!(int),
        CellValue::Real(real) => json!(real),
        CellValue::Text(text) => json!(text),
    }
}

pub(crate) fn header_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

/// First row becomes the column names; the API drops trailing empty cells,
/// so shorter rows are padded back out to the header width.
pub(crate) fn to_row_set(raw: Vec<Vec<Value>>) -> RowSet {
    let mut raw = raw.into_iter();
    let Some(header) = raw.next() else {
        return RowSet::default();
    };
    let columns: Vec<String> = header.iter().map(header_text).collect();
    let rows = raw
        .filter(|row| row.iter().any(|v| !to_cell(v).is_blank()))
        .map(|row| {
            let mut cells: Vec<CellValue> = row.iter().map(to_cell).collect();
            if cells.len() < columns.len() {
                cells.resize(columns.len(), CellValue::Null);
            }
            cells
        })
        .collect();
    RowSet { columns, rows }
}

/// Reorders `values` to follow an existing header. Header columns with no
/// matching value get an empty cell.
pub(crate) fn align_to_header(header: &[String], columns: &[&str], values: &[CellValue]) -> Vec<CellValue> {
    header
        .iter()
        .map(|name| {
            columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name.trim()))
                .and_then(|idx| values.get(idx).cloned())
                .unwrap_or(CellValue::Null)
        })
        .collect()
}

/// Rows to send for one appended record. An empty worksheet gets the column
/// names first; otherwise the values follow the existing header.
pub(crate) fn rows_for_append(
    header: &[String],
    columns: &[&str],
    values: &[CellValue],
) -> Vec<Vec<Value>> {
    if header.is_empty() {
        vec![
            columns.iter().map(|c| json!(c)).collect(),
            values.iter().map(to_json).collect(),
        ]
    } else {
        vec![align_to_header(header, columns, values).iter().map(to_json).collect()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_notation_quotes_sheet_names() {
        assert_eq!(a1_sheet("Sheet1"), "'Sheet1'");
        assert_eq!(a1_range("Booking Data", "1:1"), "'Booking Data'!1:1");
        assert_eq!(a1_sheet("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_encode_range() {
        assert_eq!(encode_range("'Booking Data'!A1"), "%27Booking%20Data%27%21A1");
        assert_eq!(encode_range("'Sheet1'!1:1"), "%27Sheet1%27%211%3A1");
        assert_eq!(encode_range("Sheet_1"), "Sheet_1");
    }

    #[test]
    fn test_json_cells_map_to_cell_values() {
        assert_eq!(to_cell(&json!(10000)), CellValue::Integer(10000));
        assert_eq!(to_cell(&json!(82.5)), CellValue::Real(82.5));
        assert_eq!(to_cell(&json!("Taj")), CellValue::Text("Taj".into()));
        assert_eq!(to_cell(&json!("")), CellValue::Null);
        assert_eq!(to_cell(&json!(true)), CellValue::Integer(1));
    }

    #[test]
    fn test_row_set_pads_short_rows_and_skips_blank_ones() {
        let raw = vec![
            vec![json!("booking_date"), json!("hotel_name"), json!("is_cancelled")],
            vec![json!("2024-01-01"), json!("Taj")],
            vec![json!(""), json!("")],
            vec![json!("2024-01-02"), json!("Leela"), json!(1)],
        ];
        let rows = to_row_set(raw);
        assert_eq!(rows.columns, vec!["booking_date", "hotel_name", "is_cancelled"]);
        assert_eq!(rows.rows.len(), 2);
        assert_eq!(rows.rows[0][2], CellValue::Null);
        assert_eq!(rows.rows[1][2], CellValue::Integer(1));
    }

    #[test]
    fn test_empty_worksheet_is_empty_row_set() {
        assert_eq!(to_row_set(Vec::new()), RowSet::default());
    }

    #[test]
    fn test_align_to_existing_header() {
        let header = vec![
            "Hotel_Name".to_string(),
            "booking_date".to_string(),
            "notes".to_string(),
        ];
        let aligned = align_to_header(
            &header,
            &["booking_date", "hotel_name"],
            &[CellValue::Text("2024-01-01".into()), CellValue::Text("Taj".into())],
        );
        assert_eq!(
            aligned,
            vec![
                CellValue::Text("Taj".into()),
                CellValue::Text("2024-01-01".into()),
                CellValue::Null,
            ]
        );
    }

    #[test]
    fn test_empty_worksheet_gets_header_row_first() {
        let rows = rows_for_append(
            &[],
            &["booking_date", "hotel_name"],
            &[CellValue::Text("2024-01-01".into()), CellValue::Text("Taj".into())],
        );
        assert_eq!(
            rows,
            vec![
                vec![json!("booking_date"), json!("hotel_name")],
                vec![json!("2024-01-01"), json!("Taj")],
            ]
        );
    }

    #[test]
    fn test_existing_header_gets_single_aligned_row() {
        let header = vec!["hotel_name".to_string(), "revenue".to_string()];
        let rows = rows_for_append(
            &header,
            &["revenue", "hotel_name"],
            &[CellValue::Real(5000.5), CellValue::Text("007".into())],
        );
        assert_eq!(rows, vec![vec![json!("007"), json!(5000.5)]]);
    }
}
