pub mod application;
pub mod domain;
pub mod error;
pub mod insights;
pub mod ports;
pub mod repository;
pub mod utils;

pub use application::{DashboardService, Delivered, SubmitOutcome};
pub use domain::{Booking, BookingChannel, BookingForm, BOOKING_COLUMNS};
pub use error::{DecodeError, StoreError, ValidationError};
pub use insights::{
    aggregate, distinct_hotels, BookingFilter, DateRange, Highlights, InsightReport, Insights,
};
pub use ports::{BookingExporter, CellValue, ReportWriter, RowSet, StorageBackend, StorageSession};
pub use repository::{BookingRepository, FetchOutcome};
