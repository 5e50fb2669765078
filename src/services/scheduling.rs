use std::sync::MutexGuard;

use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::{queries, Db};
use crate::models::{
    display_date, display_time, BookingConfirmation, BookingRecord, BookingStatus, Schedule, Slot,
    TimeSpec,
};
use crate::services::parser;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", describe_conflict(.date, .requested, .alternatives))]
    Conflict {
        date: NaiveDate,
        requested: TimeSpec,
        alternatives: Vec<NaiveTime>,
    },

    #[error("I couldn't find booking number BOOK-{0}. Please check the number and try again.")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

fn describe_conflict(date: &NaiveDate, requested: &TimeSpec, alternatives: &[NaiveTime]) -> String {
    let day = display_date(*date);
    match (requested, alternatives.is_empty()) {
        (TimeSpec::At(time), false) => format!(
            "Sorry, {} on {day} is not available. Nearby free slots: {}. Please reply with your preferred time.",
            display_time(*time),
            alternatives
                .iter()
                .map(|t| display_time(*t))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => format!(
            "Sorry, there are no available slots {} on {day}. Please choose another time or day.",
            requested.describe()
        ),
    }
}

/// A complete, parsed booking request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub date: NaiveDate,
    pub time: TimeSpec,
    pub name: String,
    pub phone: String,
}

impl BookingRequest {
    /// Builds a request from loosely formatted fields ("25 May", "9:00 AM" or "morning").
    pub fn from_fields(
        date: &str,
        time: &str,
        name: &str,
        phone: &str,
        today: NaiveDate,
    ) -> Result<Self, SchedulingError> {
        let parsed_date = parser::parse_date(date, today).ok_or_else(|| {
            SchedulingError::InvalidInput(format!("I couldn't understand the date '{date}'."))
        })?;
        let parsed_time = parser::parse_time_spec(time).ok_or_else(|| {
            SchedulingError::InvalidInput(format!(
                "I couldn't understand the time '{time}'. Try 9:00 AM, or morning, afternoon or evening."
            ))
        })?;

        Ok(Self {
            date: parsed_date,
            time: parsed_time,
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    /// Trimmed name and normalised phone, or `InvalidInput` if either is empty.
    fn validated(&self) -> Result<(String, String), SchedulingError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "Please provide your name.".to_string(),
            ));
        }
        let phone = parser::normalize_phone(&self.phone);
        if phone.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "Please provide a phone number we can reach you on.".to_string(),
            ));
        }
        Ok((name.to_string(), phone))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelOutcome {
    pub record: BookingRecord,
    /// False when the booking had already been cancelled.
    pub released: bool,
}

/// Slot store and booking ledger behind one injected handle.
#[derive(Clone)]
pub struct SchedulingService {
    db: Db,
    schedule: Schedule,
}

impl SchedulingService {
    pub fn new(db: Db, schedule: Schedule) -> Self {
        Self { db, schedule }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, SchedulingError> {
        self.db
            .lock()
            .map_err(|_| SchedulingError::Store(anyhow::anyhow!("database lock poisoned")))
    }

    /// Generates slots for `days` consecutive days starting at `from`.
    pub fn prepopulate(&self, from: NaiveDate, days: u32) -> Result<usize, SchedulingError> {
        let conn = self.conn()?;
        let mut created = 0;
        for offset in 0..days {
            created += queries::ensure_day(&conn, from + Duration::days(offset as i64), &self.schedule)?;
        }
        Ok(created)
    }

    pub fn slots_for_day(&self, date: NaiveDate) -> Result<Vec<Slot>, SchedulingError> {
        let conn = self.conn()?;
        queries::ensure_day(&conn, date, &self.schedule)?;
        Ok(queries::slots_for_day(&conn, date)?)
    }

    pub fn find_slot(&self, date: NaiveDate, spec: &TimeSpec) -> Result<Option<Slot>, SchedulingError> {
        let conn = self.conn()?;
        queries::ensure_day(&conn, date, &self.schedule)?;
        Ok(queries::find_slot(&conn, date, spec)?)
    }

    /// Nearest free slots around `time`, for offering alternatives.
    pub fn alternatives(&self, date: NaiveDate, time: NaiveTime) -> Result<Vec<NaiveTime>, SchedulingError> {
        let conn = self.conn()?;
        queries::ensure_day(&conn, date, &self.schedule)?;
        Ok(queries::nearby_available(&conn, date, time)?)
    }

    /// Reserves the matching slot and records the booking as one unit.
    pub fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation, SchedulingError> {
        let (name, phone) = request.validated()?;

        let mut conn = self.conn()?;
        queries::ensure_day(&conn, request.date, &self.schedule)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let slot = match queries::find_slot(&tx, request.date, &request.time)? {
            Some(slot) if queries::reserve(&tx, slot.id)? => slot,
            _ => {
                let alternatives = match request.time {
                    TimeSpec::At(time) => queries::nearby_available(&tx, request.date, time)?,
                    TimeSpec::Bucket(_) => vec![],
                };
                tracing::info!(
                    date = %request.date,
                    requested = %request.time.describe(),
                    "no free slot for booking request"
                );
                return Err(SchedulingError::Conflict {
                    date: request.date,
                    requested: request.time,
                    alternatives,
                });
            }
        };

        let booking_number = queries::create_booking(&tx, slot.id, &name, &phone)?;
        debug_assert_eq!(queries::count_active_for_slot(&tx, slot.id).ok(), Some(1));
        tx.commit()?;

        tracing::info!(
            booking_number,
            slot_id = slot.id,
            date = %slot.date,
            time = %slot.display_time(),
            "booking confirmed"
        );

        Ok(BookingConfirmation {
            booking_number,
            date: slot.date,
            time: slot.time,
            name,
            phone,
        })
    }

    /// Cancels a booking and frees its slot. Cancelling twice is a no-op.
    pub fn cancel(&self, booking_number: i64) -> Result<CancelOutcome, SchedulingError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let booking = queries::get_booking(&tx, booking_number)?
            .ok_or(SchedulingError::NotFound(booking_number))?;

        let released = booking.status == BookingStatus::Confirmed
            && queries::cancel_booking(&tx, booking_number)?;
        if released {
            queries::release(&tx, booking.slot_id)?;
        }

        let record = queries::get_booking_record(&tx, booking_number)?
            .ok_or(SchedulingError::NotFound(booking_number))?;
        tx.commit()?;

        if released {
            tracing::info!(booking_number, slot_id = booking.slot_id, "booking cancelled");
        }

        Ok(CancelOutcome { record, released })
    }

    pub fn get_booking(&self, booking_number: i64) -> Result<BookingRecord, SchedulingError> {
        let conn = self.conn()?;
        queries::get_booking_record(&conn, booking_number)?
            .ok_or(SchedulingError::NotFound(booking_number))
    }

    /// All bookings, cancelled ones included, by booking number.
    pub fn list_bookings(&self) -> Result<Vec<BookingRecord>, SchedulingError> {
        let conn = self.conn()?;
        Ok(queries::list_bookings(&conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::TimeBucket;

    fn service() -> SchedulingService {
        let conn = db::init_db(":memory:").unwrap();
        SchedulingService::new(db::shared(conn), Schedule::default())
    }

    fn may25() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 25).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn request(time: TimeSpec, name: &str, phone: &str) -> BookingRequest {
        BookingRequest {
            date: may25(),
            time,
            name: name.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn test_first_booking_is_number_one_then_conflict() {
        let svc = service();
        let req = request(TimeSpec::At(t(9, 0)), "Jane Doe", "555-1234");

        let confirmation = svc.book(&req).unwrap();
        assert_eq!(confirmation.booking_number, 1);
        assert_eq!(confirmation.time, t(9, 0));
        assert_eq!(confirmation.phone, "5551234");
        assert!(confirmation.message().contains("BOOK-1"));

        let err = svc.book(&req).unwrap_err();
        match err {
            SchedulingError::Conflict { alternatives, .. } => {
                assert_eq!(alternatives, vec![t(9, 30)]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_bucket_resolves_to_earliest() {
        let svc = service();
        let confirmation = svc
            .book(&request(TimeSpec::Bucket(TimeBucket::Morning), "Jane Doe", "5551234"))
            .unwrap();
        assert_eq!(confirmation.time, t(9, 0));

        let next = svc
            .book(&request(TimeSpec::Bucket(TimeBucket::Morning), "John Roe", "5559876"))
            .unwrap();
        assert_eq!(next.time, t(9, 30));
    }

    #[test]
    fn test_full_bucket_is_conflict() {
        let conn = db::init_db(":memory:").unwrap();
        let schedule = Schedule::new("09:00", "10:00", 60).unwrap();
        let svc = SchedulingService::new(db::shared(conn), schedule);

        svc.book(&request(TimeSpec::Bucket(TimeBucket::Morning), "A", "5550001")).unwrap();
        svc.book(&request(TimeSpec::Bucket(TimeBucket::Morning), "B", "5550002")).unwrap();
        let err = svc
            .book(&request(TimeSpec::Bucket(TimeBucket::Morning), "C", "5550003"))
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Conflict { .. }));
        assert!(err.to_string().contains("no available slots in the morning"));
    }

    #[test]
    fn test_off_grid_time_is_conflict_with_neighbours() {
        let svc = service();
        let err = svc
            .book(&request(TimeSpec::At(t(9, 15)), "Jane Doe", "5551234"))
            .unwrap_err();
        match err {
            SchedulingError::Conflict { alternatives, .. } => {
                assert_eq!(alternatives, vec![t(9, 0), t(9, 30)]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(svc.list_bookings().unwrap().is_empty());
    }

    #[test]
    fn test_empty_name_or_phone_is_invalid() {
        let svc = service();
        for (name, phone) in [("", "5551234"), ("   ", "5551234"), ("Jane", ""), ("Jane", " - ")] {
            let err = svc.book(&request(TimeSpec::At(t(9, 0)), name, phone)).unwrap_err();
            assert!(matches!(err, SchedulingError::InvalidInput(_)), "{name:?}/{phone:?}");
        }
        // Nothing was reserved by the failed attempts.
        let slot = svc.find_slot(may25(), &TimeSpec::At(t(9, 0))).unwrap();
        assert!(slot.is_some());
    }

    #[test]
    fn test_cancel_releases_slot_for_rebooking() {
        let svc = service();
        let req = request(TimeSpec::At(t(11, 0)), "Jane Doe", "5551234");
        let first = svc.book(&req).unwrap();

        let outcome = svc.cancel(first.booking_number).unwrap();
        assert!(outcome.released);
        assert_eq!(outcome.record.status, BookingStatus::Cancelled);
        assert!(outcome.record.slot_available);

        let second = svc.book(&req).unwrap();
        assert_eq!(second.booking_number, 2);
        assert_eq!(second.time, t(11, 0));
    }

    #[test]
    fn test_cancel_twice_does_not_free_rebooked_slot() {
        let svc = service();
        let req = request(TimeSpec::At(t(11, 0)), "Jane Doe", "5551234");
        let first = svc.book(&req).unwrap();
        svc.cancel(first.booking_number).unwrap();
        svc.book(&req).unwrap();

        let again = svc.cancel(first.booking_number).unwrap();
        assert!(!again.released);
        assert!(svc.find_slot(may25(), &TimeSpec::At(t(11, 0))).unwrap().is_none());
    }

    #[test]
    fn test_cancel_unknown_is_not_found() {
        let svc = service();
        assert!(matches!(svc.cancel(42), Err(SchedulingError::NotFound(42))));
        assert!(matches!(svc.get_booking(42), Err(SchedulingError::NotFound(42))));
    }

    #[test]
    fn test_list_after_three_bookings_and_a_cancellation() {
        let svc = service();
        svc.book(&request(TimeSpec::At(t(9, 0)), "A", "5550001")).unwrap();
        svc.book(&request(TimeSpec::At(t(10, 0)), "B", "5550002")).unwrap();
        svc.book(&request(TimeSpec::At(t(11, 0)), "C", "5550003")).unwrap();
        svc.cancel(2).unwrap();
        svc.book(&request(TimeSpec::At(t(12, 0)), "D", "5550004")).unwrap();

        let records = svc.list_bookings().unwrap();
        let numbers: Vec<i64> = records.iter().map(|r| r.booking_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(records[1].status, BookingStatus::Cancelled);
        assert!(records[1].slot_available);
        assert!(records
            .iter()
            .filter(|r| r.booking_number != 2)
            .all(|r| r.status == BookingStatus::Confirmed && !r.slot_available));
    }

    #[test]
    fn test_concurrent_requests_for_one_slot() {
        let svc = service();
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["Jane Doe", "John Roe"]
                .into_iter()
                .map(|name| {
                    let svc = svc.clone();
                    scope.spawn(move || svc.book(&request(TimeSpec::At(t(9, 0)), name, "5551234")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(SchedulingError::Conflict { .. })))
                .count(),
            1
        );
    }

    #[test]
    fn test_concurrent_requests_across_connections() {
        let path = std::env::temp_dir().join(format!("clinicdesk-{}.db", uuid::Uuid::new_v4()));
        let path_str = path.to_string_lossy().to_string();
        let services: Vec<SchedulingService> = (0..2)
            .map(|_| {
                let conn = db::init_db(&path_str).unwrap();
                SchedulingService::new(db::shared(conn), Schedule::default())
            })
            .collect();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = services
                .iter()
                .map(|svc| scope.spawn(move || svc.book(&request(TimeSpec::At(t(15, 0)), "X", "5551234"))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(SchedulingError::Conflict { .. })))
                .count(),
            1
        );

        drop(services);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(format!("{path_str}-wal"));
        let _ = std::fs::remove_file(format!("{path_str}-shm"));
    }

    #[test]
    fn test_from_fields() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let req = BookingRequest::from_fields("25th May", "morning", "Jane", "5551234", today).unwrap();
        assert_eq!(req.date, may25());
        assert_eq!(req.time, TimeSpec::Bucket(TimeBucket::Morning));

        assert!(matches!(
            BookingRequest::from_fields("someday", "9am", "Jane", "5551234", today),
            Err(SchedulingError::InvalidInput(_))
        ));
        assert!(matches!(
            BookingRequest::from_fields("2025-05-25", "soonish", "Jane", "5551234", today),
            Err(SchedulingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_prepopulate() {
        let svc = service();
        assert_eq!(svc.prepopulate(may25(), 3).unwrap(), 66);
        assert_eq!(svc.prepopulate(may25(), 3).unwrap(), 0);
        assert_eq!(svc.slots_for_day(may25()).unwrap().len(), 22);
    }
}
