use crate::domain::{Booking, BookingForm};
use crate::error::{StoreError, ValidationError};
use crate::insights::{BookingFilter, InsightReport};
use crate::ports::{BookingExporter, ReportWriter, Result};
use crate::repository::{BookingRepository, FetchOutcome};
use tracing::{info, warn};

/// What happened to a submitted form.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Inserted(Booking),
    /// The form broke a rule; nothing was sent to the backend.
    Rejected(ValidationError),
    /// The backend refused the write; the row is presumed not stored.
    Failed(StoreError),
}

/// Outcome of a read view.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered {
    /// False when the store held no bookings and the writer was never called.
    pub written: bool,
    /// Rows that made it into the output, after filtering.
    pub rows: usize,
    pub warning: Option<StoreError>,
    /// Stored rows that could not be decoded and were left out.
    pub skipped_rows: usize,
}

impl Delivered {
    fn nothing(fetched: FetchOutcome) -> Self {
        Self {
            written: false,
            rows: 0,
            warning: fetched.warning,
            skipped_rows: fetched.skipped_rows,
        }
    }
}

/// Application service behind the three dashboard views: insert, insights and raw data.
pub struct DashboardService {
    repository: BookingRepository,
}

impl DashboardService {
    pub fn new(repository: BookingRepository) -> Self {
        Self { repository }
    }

    /// Validates the form and, only if it passes, stores the booking.
    pub fn submit_booking(&self, form: &BookingForm) -> SubmitOutcome {
        let booking = match form.validate() {
            Ok(booking) => booking,
            Err(err) => {
                warn!(error = %err, "Booking form rejected");
                return SubmitOutcome::Rejected(err);
            }
        };
        match self.repository.insert_booking(&booking) {
            Ok(()) => SubmitOutcome::Inserted(booking),
            Err(err) => SubmitOutcome::Failed(err),
        }
    }

    pub fn bookings(&self) -> FetchOutcome {
        self.repository.fetch_bookings()
    }

    /// Writes the insights report for `filter`. The writer is skipped when no
    /// data is stored at all; a filter that excludes every row still yields a
    /// (zeroed) report.
    pub fn publish_insights(
        &self,
        filter: &BookingFilter,
        writer: &dyn ReportWriter,
    ) -> Result<Delivered> {
        let fetched = self.repository.fetch_bookings();
        if fetched.bookings.is_empty() {
            return Ok(Delivered::nothing(fetched));
        }
        let report = InsightReport::build(&fetched.bookings, filter);
        writer.write(&report)?;
        info!(
            rows = report.insights.count,
            filtered = !report.filter.is_empty(),
            "Insights report written"
        );
        Ok(Delivered {
            written: true,
            rows: report.insights.count,
            warning: fetched.warning,
            skipped_rows: fetched.skipped_rows,
        })
    }

    /// Exports every stored booking, unfiltered.
    pub fn export_bookings(&self, exporter: &dyn BookingExporter) -> Result<Delivered> {
        let fetched = self.repository.fetch_bookings();
        if fetched.bookings.is_empty() {
            return Ok(Delivered::nothing(fetched));
        }
        exporter.export(&fetched.bookings)?;
        info!(rows = fetched.bookings.len(), "Bookings exported");
        Ok(Delivered {
            written: true,
            rows: fetched.bookings.len(),
            warning: fetched.warning,
            skipped_rows: fetched.skipped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookingChannel;
    use crate::repository::tests::{booking, FakeBackend};
    use std::cell::RefCell;

    #[derive(Default)]
    struct CapturingWriter {
        reports: RefCell<Vec<InsightReport>>,
    }

    impl ReportWriter for CapturingWriter {
        fn write(&self, report: &InsightReport) -> Result<()> {
            self.reports.borrow_mut().push(report.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CapturingExporter {
        exported: RefCell<Vec<Booking>>,
    }

    impl BookingExporter for CapturingExporter {
        fn export(&self, bookings: &[Booking]) -> Result<()> {
            self.exported.borrow_mut().extend_from_slice(bookings);
            Ok(())
        }
    }

    fn form() -> BookingForm {
        BookingForm {
            booking_date: "2024-01-01".to_string(),
            hotel_name: "Taj".to_string(),
            room_type: "Deluxe".to_string(),
            occupancy_rate: 80.0,
            revenue: 10000.0,
            guest_nationality: "Indian".to_string(),
            booking_channel: "Online".to_string(),
            is_cancelled: false,
        }
    }

    fn service(backend: &FakeBackend) -> DashboardService {
        DashboardService::new(BookingRepository::new(Box::new(backend.clone()), "hotel_bookings"))
    }

    #[test]
    fn test_submit_valid_form_stores_booking() {
        let backend = FakeBackend::new();
        let outcome = service(&backend).submit_booking(&form());
        assert!(matches!(outcome, SubmitOutcome::Inserted(ref b) if b.booking_channel == BookingChannel::Online));
        assert_eq!(backend.rows.borrow().len(), 1);
    }

    #[test]
    fn test_submit_empty_hotel_never_reaches_backend() {
        let backend = FakeBackend::new();
        let mut input = form();
        input.hotel_name = String::new();
        let outcome = service(&backend).submit_booking(&input);
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(ValidationError::EmptyField { field: "hotel_name" })
        );
        assert_eq!(backend.connects.get(), 0);
    }

    #[test]
    fn test_submit_write_failure_is_reported() {
        let backend = FakeBackend {
            refuse_write: true,
            ..FakeBackend::new()
        };
        let outcome = service(&backend).submit_booking(&form());
        assert!(matches!(outcome, SubmitOutcome::Failed(StoreError::Write(_))));
    }

    #[test]
    fn test_publish_insights_filters_rows() {
        let backend = FakeBackend::new();
        backend.rows.borrow_mut().push(booking("Taj", 10000.0).to_cells());
        backend.rows.borrow_mut().push(booking("Oberoi", 5000.0).to_cells());

        let writer = CapturingWriter::default();
        let filter = BookingFilter::new().with_hotels(["Oberoi"]);
        let delivered = service(&backend).publish_insights(&filter, &writer).unwrap();

        assert_eq!(
            delivered,
            Delivered {
                written: true,
                rows: 1,
                warning: None,
                skipped_rows: 0,
            }
        );
        let reports = writer.reports.borrow();
        assert_eq!(reports[0].insights.total_revenue, 5000.0);
        assert_eq!(reports[0].available_hotels, vec!["Taj", "Oberoi"]);
    }

    #[test]
    fn test_publish_insights_without_data_skips_writer() {
        let backend = FakeBackend {
            refuse_connect: true,
            ..FakeBackend::new()
        };
        let writer = CapturingWriter::default();
        let delivered = service(&backend)
            .publish_insights(&BookingFilter::new(), &writer)
            .unwrap();
        assert!(!delivered.written);
        assert!(matches!(delivered.warning, Some(StoreError::Connection(_))));
        assert!(writer.reports.borrow().is_empty());
    }

    #[test]
    fn test_publish_insights_with_filter_excluding_all_still_writes() {
        let backend = FakeBackend::new();
        backend.rows.borrow_mut().push(booking("Taj", 10000.0).to_cells());

        let writer = CapturingWriter::default();
        let filter = BookingFilter::new().with_hotels(["Hyatt"]);
        let delivered = service(&backend).publish_insights(&filter, &writer).unwrap();
        assert!(delivered.written);
        assert_eq!(delivered.rows, 0);
        assert!(writer.reports.borrow()[0].insights.is_empty());
    }

    #[test]
    fn test_export_passes_every_row() {
        let backend = FakeBackend::new();
        backend.rows.borrow_mut().push(booking("Taj", 10000.0).to_cells());
        backend.rows.borrow_mut().push(booking("Taj", 10000.0).to_cells());

        let exporter = CapturingExporter::default();
        let delivered = service(&backend).export_bookings(&exporter).unwrap();
        assert_eq!(delivered.rows, 2);
        assert_eq!(exporter.exported.borrow().len(), 2);
    }

    #[test]
    fn test_undecodable_rows_are_counted_in_every_read_view() {
        let backend = FakeBackend::new();
        let mut bad = booking("Taj", 10000.0).to_cells();
        bad[4] = crate::ports::CellValue::Text("NaN".to_string());
        backend.rows.borrow_mut().push(bad);

        let writer = CapturingWriter::default();
        let delivered = service(&backend)
            .publish_insights(&BookingFilter::new(), &writer)
            .unwrap();
        assert!(!delivered.written);
        assert_eq!(delivered.skipped_rows, 1);

        backend.rows.borrow_mut().push(booking("Oberoi", 5000.0).to_cells());
        let exporter = CapturingExporter::default();
        let delivered = service(&backend).export_bookings(&exporter).unwrap();
        assert_eq!(delivered.rows, 1);
        assert_eq!(delivered.skipped_rows, 1);
    }
}
