mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use booking_core::ports::StorageBackend;
use booking_core::utils::parse_form_date;
use booking_core::{
    BookingFilter, BookingForm, BookingRepository, DashboardService, DateRange, Delivered,
    StoreError, SubmitOutcome,
};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use csv_adapter::CsvExporter;
use markdown_adapter::MarkdownReportWriter;
use sheets_adapter::{ServiceAccountKey, SheetsBackend, SheetsSettings};
use sqlite_adapter::SqliteBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, BackendConfig};

/// Service account key (JSON text) for the spreadsheet backend. Read from the
/// environment only, never from argv.
const SHEETS_CREDENTIALS_ENV: &str = "HOTEL_DASH_SHEETS_CREDENTIALS";

/// Hotel booking analytics: record bookings and summarise them
#[derive(Parser, Debug)]
#[command(name = "hotel-dash")]
#[command(about = "Records hotel bookings and reports revenue, occupancy and booking trends")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long, env = "HOTEL_DASH_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the SQLite database path from the configuration
    #[arg(long, env = "HOTEL_DASH_DB")]
    db: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the bookings table in the SQLite database
    Init,
    /// Insert a new booking record
    Insert(InsertArgs),
    /// Show key metrics and grouped trends
    Insights(InsightsArgs),
    /// Show every stored booking
    Table,
    /// Write all bookings to hotel_bookings.csv
    Export {
        /// Directory that receives hotel_bookings.csv
        #[arg(short = 'o', long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct InsertArgs {
    /// Booking date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value = "")]
    hotel: String,
    #[arg(long, default_value = "")]
    room_type: String,
    /// Occupancy rate in percent (0-100)
    #[arg(long, default_value_t = 0.0)]
    occupancy: f64,
    #[arg(long, default_value_t = 0.0)]
    revenue: f64,
    #[arg(long, default_value = "")]
    nationality: String,
    /// Online, Direct, Travel Agent or Corporate
    #[arg(long, default_value = "Online")]
    channel: String,
    /// Mark the booking as cancelled
    #[arg(long)]
    cancelled: bool,
}

impl InsertArgs {
    fn into_form(self) -> BookingForm {
        BookingForm {
            booking_date: self
                .date
                .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string()),
            hotel_name: self.hotel,
            room_type: self.room_type,
            occupancy_rate: self.occupancy,
            revenue: self.revenue,
            guest_nationality: self.nationality,
            booking_channel: self.channel,
            is_cancelled: self.cancelled,
        }
    }
}

#[derive(Args, Debug)]
struct InsightsArgs {
    /// First booking date to include
    #[arg(long)]
    from: Option<String>,
    /// Last booking date to include
    #[arg(long)]
    to: Option<String>,
    /// Only include these hotels (repeatable)
    #[arg(long = "hotel")]
    hotels: Vec<String>,
    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl InsightsArgs {
    fn filter(&self) -> Result<BookingFilter> {
        let mut filter = BookingFilter::new();
        if self.from.is_some() || self.to.is_some() {
            let start = parse_date_arg("--from", self.from.as_deref())?.unwrap_or(NaiveDate::MIN);
            let end = parse_date_arg("--to", self.to.as_deref())?.unwrap_or(NaiveDate::MAX);
            let range = DateRange::new(start, end)
                .with_context(|| format!("--from {start} is after --to {end}"))?;
            filter = filter.with_date_range(range);
        }
        if !self.hotels.is_empty() {
            filter = filter.with_hotels(self.hotels.iter().map(|h| h.trim().to_string()));
        }
        Ok(filter)
    }
}

fn parse_date_arg(flag: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|value| {
        parse_form_date(value).with_context(|| format!("{flag}: invalid date '{value}', expected YYYY-MM-DD"))
    })
    .transpose()
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let mut app_config = config::load_config(&config_path, cli.config.is_some())
        .context("Failed to load configuration")?;
    if let (Some(db), BackendConfig::Sqlite(sqlite)) = (&cli.db, &mut app_config.backend) {
        sqlite.path = db.clone();
    }

    init_tracing(&app_config.log_level, cli.json_logs);
    info!(
        config = %config_path.display(),
        table = %app_config.table,
        version = env!("CARGO_PKG_VERSION"),
        "Starting hotel-dash"
    );

    match cli.command {
        Command::Init => init_store(&app_config),
        Command::Insert(args) => insert(&service(&app_config)?, args),
        Command::Insights(args) => insights(&service(&app_config)?, &args),
        Command::Table => table(&service(&app_config)?),
        Command::Export { out_dir } => export(&service(&app_config)?, out_dir),
    }
}

/// Instantiates the concrete storage backend and injects it into the core service.
fn service(app_config: &AppConfig) -> Result<DashboardService> {
    let credentials = std::env::var(SHEETS_CREDENTIALS_ENV).ok();
    let backend = build_backend(app_config, credentials.as_deref())?;
    Ok(DashboardService::new(BookingRepository::new(
        backend,
        app_config.table.clone(),
    )))
}

fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_backend(
    app_config: &AppConfig,
    credentials_blob: Option<&str>,
) -> Result<Box<dyn StorageBackend>> {
    match &app_config.backend {
        BackendConfig::Sqlite(sqlite) => Ok(Box::new(SqliteBackend::new(
            sqlite.path.clone(),
            Duration::from_millis(sqlite.busy_timeout_ms),
        ))),
        BackendConfig::Sheets(sheets) => {
            let blob = match (credentials_blob, &sheets.credentials_path) {
                (Some(blob), _) => blob.to_string(),
                (None, Some(path)) => std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read service account key: {}", path.display())
                })?,
                (None, None) => bail!(
                    "spreadsheet backend needs {SHEETS_CREDENTIALS_ENV} or backend.credentials_path"
                ),
            };
            let mut key = ServiceAccountKey::from_json(&blob)?;
            if let Some(token_uri) = &sheets.token_uri {
                key = key.with_token_uri(token_uri.clone());
            }
            let settings = SheetsSettings {
                spreadsheet_name: sheets.spreadsheet_name.clone(),
                sheets_api_base: sheets.sheets_api_base.clone(),
                drive_api_base: sheets.drive_api_base.clone(),
                timeout: Duration::from_secs(sheets.timeout_secs),
            };
            Ok(Box::new(SheetsBackend::new(key, settings)?))
        }
    }
}

fn init_store(app_config: &AppConfig) -> Result<i32> {
    let BackendConfig::Sqlite(sqlite) = &app_config.backend else {
        bail!("init only applies to the sqlite backend; create the worksheet in the spreadsheet instead");
    };
    let backend = SqliteBackend::new(
        sqlite.path.clone(),
        Duration::from_millis(sqlite.busy_timeout_ms),
    );
    backend
        .initialize(&app_config.table)
        .with_context(|| format!("Failed to initialise {}", sqlite.path.display()))?;
    println!(
        "Bookings table '{}' ready in {}",
        app_config.table,
        sqlite.path.display()
    );
    Ok(0)
}

fn insert(service: &DashboardService, args: InsertArgs) -> Result<i32> {
    match service.submit_booking(&args.into_form()) {
        SubmitOutcome::Inserted(booking) => {
            println!(
                "Booking inserted successfully: {} on {} ({})",
                booking.hotel_name, booking.booking_date, booking.booking_channel
            );
            Ok(0)
        }
        SubmitOutcome::Rejected(err) => {
            eprintln!("Warning: Please fill all fields before submitting. ({err})");
            Ok(2)
        }
        SubmitOutcome::Failed(err) => {
            report_warning(&err);
            Ok(0)
        }
    }
}

fn insights(service: &DashboardService, args: &InsightsArgs) -> Result<i32> {
    let filter = args.filter()?;
    let writer = match &args.output {
        Some(path) => MarkdownReportWriter::to_file(path),
        None => MarkdownReportWriter::stdout(),
    };

    let delivered = service
        .publish_insights(&filter, &writer)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to write insights report")?;
    report_delivery_warnings(&delivered);
    if !delivered.written {
        println!("No data to visualize.");
    } else if let Some(path) = &args.output {
        println!("Insights report written to {}", path.display());
    }
    Ok(0)
}

fn table(service: &DashboardService) -> Result<i32> {
    let fetched = service.bookings();
    if let Some(err) = &fetched.warning {
        report_warning(err);
    }
    report_skipped(fetched.skipped_rows);
    if fetched.bookings.is_empty() {
        println!("No data available or failed to load.");
        return Ok(0);
    }
    MarkdownReportWriter::stdout()
        .write_table(&fetched.bookings)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to print bookings")?;
    Ok(0)
}

fn export(service: &DashboardService, out_dir: PathBuf) -> Result<i32> {
    let exporter = CsvExporter::new(out_dir);
    let delivered = service
        .export_bookings(&exporter)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to export bookings")?;
    report_delivery_warnings(&delivered);
    if !delivered.written {
        println!("No data available or failed to load.");
    } else {
        println!(
            "Exported {} bookings to {}",
            delivered.rows,
            exporter.output_path().display()
        );
    }
    Ok(0)
}

fn report_warning(err: &StoreError) {
    warn!(error = %err, "Storage backend unavailable");
    eprintln!("Warning: {err}");
}

fn report_skipped(skipped_rows: usize) {
    if let Some(message) = skipped_message(skipped_rows) {
        eprintln!("Warning: {message}");
    }
}

fn skipped_message(skipped_rows: usize) -> Option<String> {
    (skipped_rows > 0).then(|| format!("{skipped_rows} stored rows could not be read and were skipped."))
}

fn report_delivery_warnings(delivered: &Delivered) {
    if let Some(err) = &delivered.warning {
        report_warning(err);
    }
    report_skipped(delivered.skipped_rows);
}
