use crate::domain::{Booking, BookingChannel};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The earliest to latest booking date, or `None` for an empty table.
    pub fn spanning(bookings: &[Booking]) -> Option<Self> {
        let start = bookings.iter().map(|b| b.booking_date).min()?;
        let end = bookings.iter().map(|b| b.booking_date).max()?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Row filter. Absent criteria keep everything; present ones are ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub date_range: Option<DateRange>,
    pub hotels: Option<BTreeSet<String>>,
}

impl BookingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_hotels<I, S>(mut self, hotels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hotels = Some(hotels.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date_range.is_none() && self.hotel_set().is_none()
    }

    /// An empty selection behaves like no selection at all.
    fn hotel_set(&self) -> Option<&BTreeSet<String>> {
        self.hotels.as_ref().filter(|set| !set.is_empty())
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(range) = &self.date_range {
            if !range.contains(booking.booking_date) {
                return false;
            }
        }
        if let Some(hotels) = self.hotel_set() {
            if !hotels.contains(&booking.hotel_name) {
                return false;
            }
        }
        true
    }

    /// Keeps matching rows in their original order.
    pub fn apply(&self, bookings: &[Booking]) -> Vec<Booking> {
        bookings
            .iter()
            .filter(|b| self.matches(b))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlights {
    pub top_hotel: Option<(String, usize)>,
    pub peak_date: Option<(NaiveDate, usize)>,
    pub average_revenue: f64,
}

/// Everything the insights view shows, computed over the filtered rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insights {
    pub count: usize,
    pub total_revenue: f64,
    /// Fraction in `0.0..=1.0`; formatted as a percentage only for display.
    pub cancellation_rate: f64,
    pub revenue_by_channel: BTreeMap<BookingChannel, f64>,
    pub occupancy_by_date: BTreeMap<NaiveDate, f64>,
    /// Busiest hotel first; equal counts keep first-seen order.
    pub count_by_hotel: Vec<(String, usize)>,
    pub highlights: Highlights,
}

impl Insights {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// What a report writer receives: the insights plus the context needed to
/// describe how they were filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightReport {
    pub insights: Insights,
    pub filter: BookingFilter,
    /// Full extent of the stored data, before filtering.
    pub data_range: Option<DateRange>,
    pub available_hotels: Vec<String>,
}

impl InsightReport {
    pub fn build(bookings: &[Booking], filter: &BookingFilter) -> Self {
        Self {
            insights: aggregate(bookings, filter),
            filter: filter.clone(),
            data_range: DateRange::spanning(bookings),
            available_hotels: distinct_hotels(bookings),
        }
    }
}

pub fn aggregate(bookings: &[Booking], filter: &BookingFilter) -> Insights {
    let rows: Vec<&Booking> = bookings.iter().filter(|b| filter.matches(b)).collect();
    if rows.is_empty() {
        return Insights::default();
    }

    let count = rows.len();
    let total_revenue: f64 = rows.iter().map(|b| b.revenue).sum();
    let cancelled = rows.iter().filter(|b| b.is_cancelled).count();

    let mut revenue_by_channel: BTreeMap<BookingChannel, f64> = BTreeMap::new();
    let mut occupancy_sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for booking in &rows {
        *revenue_by_channel.entry(booking.booking_channel).or_insert(0.0) += booking.revenue;
        let slot = occupancy_sums.entry(booking.booking_date).or_insert((0.0, 0));
        slot.0 += booking.occupancy_rate;
        slot.1 += 1;
    }
    let occupancy_by_date = occupancy_sums
        .into_iter()
        .map(|(date, (sum, n))| (date, sum / n as f64))
        .collect();

    let mut count_by_hotel = count_first_seen(rows.iter().map(|b| b.hotel_name.clone()));
    let top_hotel = most_frequent(&count_by_hotel);
    // stable: equal counts stay in first-seen order
    count_by_hotel.sort_by(|a, b| b.1.cmp(&a.1));

    let by_date = count_first_seen(rows.iter().map(|b| b.booking_date));
    let peak_date = most_frequent(&by_date);

    Insights {
        count,
        total_revenue,
        cancellation_rate: cancelled as f64 / count as f64,
        revenue_by_channel,
        occupancy_by_date,
        count_by_hotel,
        highlights: Highlights {
            top_hotel,
            peak_date,
            average_revenue: total_revenue / count as f64,
        },
    }
}

/// Hotel names in first-seen order, for building a hotel selection.
pub fn distinct_hotels(bookings: &[Booking]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    bookings
        .iter()
        .filter(|b| seen.insert(b.hotel_name.as_str()))
        .map(|b| b.hotel_name.clone())
        .collect()
}

fn count_first_seen<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + std::hash::Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match index.get(&key) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

/// Highest count; the earliest entry wins a tie.
fn most_frequent<K: Clone>(counts: &[(K, usize)]) -> Option<(K, usize)> {
    counts
        .iter()
        .fold(None::<&(K, usize)>, |best, entry| match best {
            Some(current) if current.1 >= entry.1 => Some(current),
            _ => Some(entry),
        })
        .cloned()
}
