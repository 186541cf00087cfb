use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Strict `YYYY-MM-DD`, the only shape accepted from user input.
pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parses a stored booking date as backends hand it over.
/// Supports ISO dates, SQL datetimes, RFC 3339 and, as a last resort,
/// whatever `dateparser` understands (e.g. "Jan 5, 2024"). Bare digit runs
/// are epoch timestamps to `dateparser` and are refused.
pub fn parse_booking_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    // MySQL/SQLite datetime (e.g., "2024-01-05 00:00:00")
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    // ISO 8601 without timezone (e.g., "2024-01-05T00:00:00")
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    // Keep the calendar date as written rather than shifting it to UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    dateparser::parse_with_timezone(raw, &Utc)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Groups the integer part with commas: 1234567 -> "1,234,567".
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats revenue for display, rounded to whole rupees: 15000.4 -> "₹15,000".
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}₹{}", group_thousands(rounded.abs() as u64))
}

/// Formats a fraction as a percentage with two decimals: 0.5 -> "50.00%".
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
