use booking_core::ports::{ReportWriter, Result};
use booking_core::utils::{format_currency, format_percent};
use booking_core::{Booking, DateRange, InsightReport};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const BAR_WIDTH: usize = 30;

/// Where rendered markdown goes
#[derive(Debug, Clone)]
pub enum ReportTarget {
    Stdout,
    File(PathBuf),
}

/// Markdown report writer adapter implementation
pub struct MarkdownReportWriter {
    target: ReportTarget,
}

impl MarkdownReportWriter {
    pub fn new(target: ReportTarget) -> Self {
        Self { target }
    }

    pub fn stdout() -> Self {
        Self::new(ReportTarget::Stdout)
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self::new(ReportTarget::File(path.into()))
    }

    fn emit(&self, markdown: &str) -> Result<()> {
        match &self.target {
            ReportTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(markdown.as_bytes())?;
                out.flush()?;
            }
            ReportTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, markdown)?;
                info!(path = %path.display(), "Markdown report written");
            }
        }
        Ok(())
    }

    /// Writes the raw booking table
    pub fn write_table(&self, bookings: &[Booking]) -> Result<()> {
        self.emit(&render_table(bookings))
    }
}

impl ReportWriter for MarkdownReportWriter {
    fn write(&self, report: &InsightReport) -> Result<()> {
        self.emit(&render_report(report))
    }
}

/// Renders the full insights page: metrics, filters, highlights and one
/// table-plus-bar-chart per grouping.
pub fn render_report(report: &InsightReport) -> String {
    let insights = &report.insights;
    let mut out = String::new();

    out.push_str("# Hotel Booking Analytics\n\n");

    out.push_str("## Key Metrics\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    let _ = writeln!(out, "| Total Bookings | {} |", insights.count);
    let _ = writeln!(out, "| Total Revenue | {} |", format_currency(insights.total_revenue));
    let _ = writeln!(
        out,
        "| Cancellation Rate | {} |",
        format_percent(insights.cancellation_rate)
    );
    out.push('\n');

    out.push_str("## Filters\n\n");
    match report.filter.date_range {
        Some(range) => {
            let _ = writeln!(out, "- Date range: {}", describe_range(&range));
        }
        None => match report.data_range {
            Some(range) => {
                let _ = writeln!(out, "- Date range: all ({} to {})", range.start(), range.end());
            }
            None => out.push_str("- Date range: all\n"),
        },
    }
    match report.filter.hotels.as_ref().filter(|h| !h.is_empty()) {
        Some(hotels) => {
            let names: Vec<&str> = hotels.iter().map(String::as_str).collect();
            let _ = writeln!(out, "- Hotels: {}", names.join(", "));
        }
        None => out.push_str("- Hotels: all\n"),
    }
    if !report.available_hotels.is_empty() {
        let _ = writeln!(out, "- Available hotels: {}", report.available_hotels.join(", "));
    }
    out.push('\n');

    if insights.is_empty() {
        out.push_str("*No bookings match the selected filters.*\n");
        return out;
    }

    let highlights = &insights.highlights;
    out.push_str("## Highlights\n\n");
    if let Some((hotel, count)) = &highlights.top_hotel {
        let _ = writeln!(out, "- Top hotel: **{}** ({} bookings)", escape_cell(hotel), count);
    }
    if let Some((date, count)) = &highlights.peak_date {
        let _ = writeln!(out, "- Peak booking date: **{date}** ({count} bookings)");
    }
    let _ = writeln!(
        out,
        "- Average revenue per booking: {}",
        format_currency(highlights.average_revenue)
    );
    out.push('\n');

    out.push_str("## Revenue by Booking Channel\n\n");
    let max = max_value(insights.revenue_by_channel.values().copied());
    out.push_str("| Booking Channel | Total Revenue | |\n|---|---:|---|\n");
    for (channel, revenue) in &insights.revenue_by_channel {
        let _ = writeln!(
            out,
            "| {channel} | {} | {} |",
            format_currency(*revenue),
            bar(*revenue, max)
        );
    }
    out.push('\n');

    out.push_str("## Occupancy Rate Over Time\n\n");
    out.push_str("| Date | Avg. Occupancy Rate | |\n|---|---:|---|\n");
    for (date, occupancy) in &insights.occupancy_by_date {
        let _ = writeln!(out, "| {date} | {occupancy:.1}% | {} |", bar(*occupancy, 100.0));
    }
    out.push('\n');

    out.push_str("## Booking Count by Hotel\n\n");
    let max = max_value(insights.count_by_hotel.iter().map(|(_, n)| *n as f64));
    out.push_str("| Hotel Name | Booking Count | |\n|---|---:|---|\n");
    for (hotel, count) in &insights.count_by_hotel {
        let _ = writeln!(
            out,
            "| {} | {count} | {} |",
            escape_cell(hotel),
            bar(*count as f64, max)
        );
    }

    out
}

/// Renders every booking as one markdown table in the stored order.
pub fn render_table(bookings: &[Booking]) -> String {
    let mut out = String::new();
    out.push_str("# All Hotel Bookings\n\n");
    let _ = writeln!(out, "*{} bookings*\n", bookings.len());
    out.push_str(
        "| Booking Date | Hotel Name | Room Type | Occupancy Rate (%) | Revenue | Guest Nationality | Booking Channel | Cancelled |\n",
    );
    out.push_str("|---|---|---|---:|---:|---|---|---|\n");
    for booking in bookings {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1} | {} | {} | {} | {} |",
            booking.booking_date,
            escape_cell(&booking.hotel_name),
            escape_cell(&booking.room_type),
            booking.occupancy_rate,
            format_currency(booking.revenue),
            escape_cell(&booking.guest_nationality),
            booking.booking_channel,
            if booking.is_cancelled { "Yes" } else { "No" },
        );
    }
    out
}

/// An open end (a bound left at the calendar limit) is not printed.
fn describe_range(range: &DateRange) -> String {
    match (range.start() == NaiveDate::MIN, range.end() == NaiveDate::MAX) {
        (true, true) => "all".to_string(),
        (false, true) => format!("from {}", range.start()),
        (true, false) => format!("up to {}", range.end()),
        (false, false) => format!("{} to {}", range.start(), range.end()),
    }
}

fn max_value(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

/// Horizontal bar scaled against `max`.
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(cells.clamp(1, BAR_WIDTH))
}

/// Pipes would split a table cell; newlines would end the row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}
