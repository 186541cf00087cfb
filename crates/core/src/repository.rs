use crate::domain::{Booking, BOOKING_COLUMNS};
use crate::error::StoreError;
use crate::ports::StorageBackend;
use tracing::{debug, info, warn};

/// Result of a fetch. A failed backend still yields a (possibly empty) table;
/// the failure travels alongside it instead of being raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub bookings: Vec<Booking>,
    pub warning: Option<StoreError>,
    /// Stored rows that could not be decoded into a `Booking`.
    pub skipped_rows: usize,
}

impl FetchOutcome {
    fn failed(err: StoreError) -> Self {
        Self {
            bookings: Vec::new(),
            warning: Some(err),
            skipped_rows: 0,
        }
    }
}

/// Booking persistence over any `StorageBackend`. Each call acquires its own
/// session and releases it before returning.
pub struct BookingRepository {
    backend: Box<dyn StorageBackend>,
    table: String,
}

impl BookingRepository {
    pub fn new(backend: Box<dyn StorageBackend>, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
        }
    }

    /// Every stored booking in backend order.
    pub fn fetch_bookings(&self) -> FetchOutcome {
        match self.try_fetch() {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    backend = self.backend.name(),
                    table = %self.table,
                    error = %err,
                    "Fetching bookings failed; continuing with an empty table"
                );
                FetchOutcome::failed(err)
            }
        }
    }

    fn try_fetch(&self) -> Result<FetchOutcome, StoreError> {
        let mut session = self.backend.connect()?;
        let rows = session.fetch_all(&self.table)?;
        session.close()?;

        let mut outcome = FetchOutcome::default();
        for (idx, row) in rows.rows.iter().enumerate() {
            match Booking::from_row(&rows.columns, row) {
                Ok(booking) => outcome.bookings.push(booking),
                Err(err) => {
                    warn!(row = idx + 1, error = %err, "Skipping undecodable booking row");
                    outcome.skipped_rows += 1;
                }
            }
        }

        debug!(
            backend = self.backend.name(),
            rows = outcome.bookings.len(),
            skipped = outcome.skipped_rows,
            "Fetched bookings"
        );
        Ok(outcome)
    }

    /// Appends one booking. No retry: on error the row is presumed not stored.
    pub fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let result = self.try_insert(booking);
        match &result {
            Ok(()) => info!(
                backend = self.backend.name(),
                hotel = %booking.hotel_name,
                date = %booking.booking_date,
                "Booking inserted"
            ),
            Err(err) => warn!(
                backend = self.backend.name(),
                error = %err,
                "Booking insert failed"
            ),
        }
        result
    }

    fn try_insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut session = self.backend.connect()?;
        session.append(&self.table, &BOOKING_COLUMNS, &booking.to_cells())?;
        session.close()
    }
}
