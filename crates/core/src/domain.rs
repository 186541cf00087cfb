use crate::error::{DecodeError, ValidationError};
use crate::ports::CellValue;
use crate::utils::{parse_booking_date, parse_form_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column names as stored in every backend, in insertion order.
pub const BOOKING_COLUMNS: [&str; 8] = [
    "booking_date",
    "hotel_name",
    "room_type",
    "occupancy_rate",
    "revenue",
    "guest_nationality",
    "booking_channel",
    "is_cancelled",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BookingChannel {
    Online,
    Direct,
    #[serde(rename = "Travel Agent")]
    TravelAgent,
    Corporate,
}

impl BookingChannel {
    pub const ALL: [BookingChannel; 4] = [
        BookingChannel::Online,
        BookingChannel::Direct,
        BookingChannel::TravelAgent,
        BookingChannel::Corporate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingChannel::Online => "Online",
            BookingChannel::Direct => "Direct",
            BookingChannel::TravelAgent => "Travel Agent",
            BookingChannel::Corporate => "Corporate",
        }
    }
}

impl fmt::Display for BookingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingChannel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "online" => Ok(BookingChannel::Online),
            "direct" => Ok(BookingChannel::Direct),
            "travel agent" => Ok(BookingChannel::TravelAgent),
            "corporate" => Ok(BookingChannel::Corporate),
            _ => Err(ValidationError::UnknownChannel(s.trim().to_string())),
        }
    }
}

/// One reservation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_date: NaiveDate,
    pub hotel_name: String,
    pub room_type: String,
    pub occupancy_rate: f64,
    pub revenue: f64,
    pub guest_nationality: String,
    pub booking_channel: BookingChannel,
    #[serde(with = "cancel_flag")]
    pub is_cancelled: bool,
}

impl Booking {
    /// Cells in `BOOKING_COLUMNS` order, ready for a backend append.
    pub fn to_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.booking_date.format("%Y-%m-%d").to_string()),
            CellValue::Text(self.hotel_name.clone()),
            CellValue::Text(self.room_type.clone()),
            CellValue::Real(self.occupancy_rate),
            CellValue::Real(self.revenue),
            CellValue::Text(self.guest_nationality.clone()),
            CellValue::Text(self.booking_channel.to_string()),
            CellValue::Integer(i64::from(self.is_cancelled)),
        ]
    }

    /// Decodes a fetched row by column name. Column order and extra columns
    /// (an auto-increment id, say) do not matter.
    pub fn from_row(columns: &[String], row: &[CellValue]) -> Result<Booking, DecodeError> {
        let view = RowView { columns, row };

        let date_cell = view.cell("booking_date")?;
        let booking_date = date_cell
            .as_text()
            .and_then(|raw| parse_booking_date(&raw))
            .ok_or_else(|| invalid("booking_date", date_cell))?;

        let channel_cell = view.cell("booking_channel")?;
        let booking_channel = channel_cell
            .as_text()
            .and_then(|raw| raw.parse::<BookingChannel>().ok())
            .ok_or_else(|| invalid("booking_channel", channel_cell))?;

        let cancel_cell = view.cell("is_cancelled")?;
        let is_cancelled = cancel_cell
            .as_flag()
            .ok_or_else(|| invalid("is_cancelled", cancel_cell))?;

        Ok(Booking {
            booking_date,
            hotel_name: view.text("hotel_name")?,
            room_type: view.text("room_type")?,
            occupancy_rate: view.number_in("occupancy_rate", 0.0, 100.0)?,
            revenue: view.number_in("revenue", 0.0, f64::MAX)?,
            guest_nationality: view.text("guest_nationality")?,
            booking_channel,
            is_cancelled,
        })
    }
}

static NULL_CELL: CellValue = CellValue::Null;

struct RowView<'a> {
    columns: &'a [String],
    row: &'a [CellValue],
}

impl<'a> RowView<'a> {
    /// Short rows (trailing empty spreadsheet cells) read as `Null`.
    fn cell(&self, name: &'static str) -> Result<&'a CellValue, DecodeError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name))
            .ok_or(DecodeError::MissingColumn(name))?;
        Ok(self.row.get(idx).unwrap_or(&NULL_CELL))
    }

    fn text(&self, name: &'static str) -> Result<String, DecodeError> {
        let value = self.cell(name)?;
        value.as_text().ok_or_else(|| invalid(name, value))
    }

    /// Finite number within `min..=max`; anything else makes the row undecodable.
    fn number_in(&self, name: &'static str, min: f64, max: f64) -> Result<f64, DecodeError> {
        let value = self.cell(name)?;
        value
            .as_f64()
            .filter(|n| (min..=max).contains(n))
            .ok_or_else(|| invalid(name, value))
    }
}

fn invalid(column: &'static str, value: &CellValue) -> DecodeError {
    DecodeError::InvalidValue {
        column,
        value: value.to_string(),
    }
}

/// Raw insertion form, exactly as the user typed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub booking_date: String,
    pub hotel_name: String,
    pub room_type: String,
    pub occupancy_rate: f64,
    pub revenue: f64,
    pub guest_nationality: String,
    pub booking_channel: String,
    pub is_cancelled: bool,
}

impl BookingForm {
    /// Turns the form into a `Booking` or reports the first rule it breaks.
    /// Text is trimmed; blank text, zero occupancy and zero revenue are refused.
    pub fn validate(&self) -> Result<Booking, ValidationError> {
        let booking_date = parse_form_date(&self.booking_date)
            .ok_or_else(|| ValidationError::InvalidDate(self.booking_date.trim().to_string()))?;

        let hotel_name = required("hotel_name", &self.hotel_name)?;
        let room_type = required("room_type", &self.room_type)?;
        let guest_nationality = required("guest_nationality", &self.guest_nationality)?;
        let booking_channel = required("booking_channel", &self.booking_channel)?
            .parse::<BookingChannel>()?;

        let occupancy_rate = self.occupancy_rate;
        if !occupancy_rate.is_finite() {
            return Err(ValidationError::NotFinite { field: "occupancy_rate" });
        }
        if !(0.0..=100.0).contains(&occupancy_rate) {
            return Err(ValidationError::OutOfRange {
                field: "occupancy_rate",
                value: occupancy_rate,
                min: 0.0,
                max: 100.0,
            });
        }
        if occupancy_rate == 0.0 {
            return Err(ValidationError::ZeroValue { field: "occupancy_rate" });
        }

        let revenue = self.revenue;
        if !revenue.is_finite() {
            return Err(ValidationError::NotFinite { field: "revenue" });
        }
        if revenue < 0.0 {
            return Err(ValidationError::Negative { field: "revenue", value: revenue });
        }
        if revenue == 0.0 {
            return Err(ValidationError::ZeroValue { field: "revenue" });
        }

        Ok(Booking {
            booking_date,
            hotel_name,
            room_type,
            occupancy_rate,
            revenue,
            guest_nationality,
            booking_channel,
            is_cancelled: self.is_cancelled,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

/// Cancellation is stored as 0/1 everywhere, including CSV exports.
mod cancel_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(de::Error::custom(format!("invalid cancellation flag '{other}'"))),
        }
    }
}
