use booking_core::ports::{BookingExporter, Result};
use booking_core::Booking;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the downloadable export.
pub const EXPORT_FILE_NAME: &str = "hotel_bookings.csv";

/// Writes the raw booking table as `hotel_bookings.csv` into a directory
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(EXPORT_FILE_NAME)
    }
}

impl BookingExporter for CsvExporter {
    fn export(&self, bookings: &[Booking]) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path();
        write_bookings(File::create(&path)?, bookings)?;
        info!(path = %path.display(), rows = bookings.len(), "CSV export written");
        Ok(())
    }
}

/// Serialises bookings as UTF-8 CSV with a header row of the booking field
/// names. Dates are `YYYY-MM-DD`, cancellation is `0`/`1`.
pub fn write_bookings<W: Write>(writer: W, bookings: &[Booking]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for booking in bookings {
        csv_writer.serialize(booking)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_bytes(bookings: &[Booking]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_bookings(&mut buffer, bookings)?;
    Ok(buffer)
}

/// Parses an export back into bookings.
pub fn read_bookings<R: Read>(reader: R) -> Result<Vec<Booking>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let bookings = csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<Booking>, csv::Error>>()?;
    Ok(bookings)
}

pub fn read_bookings_file(path: &Path) -> Result<Vec<Booking>> {
    read_bookings(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_core::{BookingChannel, BOOKING_COLUMNS};
    use chrono::NaiveDate;

    fn sample() -> Vec<Booking> {
        vec![
            Booking {
                booking_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                hotel_name: "Taj".to_string(),
                room_type: "Deluxe".to_string(),
                occupancy_rate: 85.5,
                revenue: 10000.0,
                guest_nationality: "Indian".to_string(),
                booking_channel: BookingChannel::TravelAgent,
                is_cancelled: false,
            },
            Booking {
                booking_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                hotel_name: "The Leela, Goa".to_string(),
                room_type: "Suite \"Sea View\"".to_string(),
                occupancy_rate: 40.0,
                revenue: 5000.25,
                guest_nationality: "Français".to_string(),
                booking_channel: BookingChannel::Corporate,
                is_cancelled: true,
            },
        ]
    }

    #[test]
    fn test_header_matches_booking_columns() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, BOOKING_COLUMNS.join(","));
    }

    #[test]
    fn test_rows_use_stored_representation() {
        let text = String::from_utf8(to_csv_bytes(&sample()).unwrap()).unwrap();
        let first = text.lines().nth(1).unwrap();
        assert_eq!(first, "2024-01-01,Taj,Deluxe,85.5,10000.0,Indian,Travel Agent,0");
        assert!(text.contains("\"The Leela, Goa\""));
    }

    #[test]
    fn test_export_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = CsvExporter::new(dir.path().join("exports"));
        exporter.export(&sample()).unwrap();

        let path = exporter.output_path();
        assert!(path.ends_with(EXPORT_FILE_NAME));
        assert_eq!(read_bookings_file(&path).unwrap(), sample());
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let bytes = to_csv_bytes(&[]).unwrap();
        assert!(read_bookings(bytes.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unknown_channel() {
        let input = "booking_date,hotel_name,room_type,occupancy_rate,revenue,guest_nationality,booking_channel,is_cancelled\n\
                     2024-01-01,Taj,Deluxe,80,100,Indian,Fax,0\n";
        assert!(read_bookings(input.as_bytes()).is_err());
    }
}
