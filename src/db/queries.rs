use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, BookingRecord, BookingStatus, Schedule, Slot, TimeSpec};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";
const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn date_str(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn time_str(time: NaiveTime) -> String {
    time.format(TIME_FMT).to_string()
}

// ── Slots ──

/// Inserts the schedule's slots for `date`. Existing rows are left untouched.
pub fn ensure_day(conn: &Connection, date: NaiveDate, schedule: &Schedule) -> anyhow::Result<usize> {
    let day = date_str(date);
    let mut stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO slots (date, time, available) VALUES (?1, ?2, 1)")?;

    let mut inserted = 0;
    for time in schedule.slot_times() {
        inserted += stmt.execute(params![day, time_str(time)])?;
    }
    Ok(inserted)
}

pub fn slots_for_day(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Slot>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, time, available FROM slots WHERE date = ?1 ORDER BY time ASC",
    )?;

    let rows = stmt.query_map(params![date_str(date)], |row| Ok(parse_slot_row(row)))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

/// Earliest available slot on `date` inside the window of `spec`.
pub fn find_slot(conn: &Connection, date: NaiveDate, spec: &TimeSpec) -> anyhow::Result<Option<Slot>> {
    let (start, end) = spec.window();
    let result = conn
        .query_row(
            "SELECT id, date, time, available FROM slots
             WHERE date = ?1 AND time >= ?2 AND time <= ?3 AND available = 1
             ORDER BY time ASC LIMIT 1",
            params![date_str(date), time_str(start), time_str(end)],
            |row| Ok(parse_slot_row(row)),
        )
        .optional()?;

    result.transpose()
}

/// Marks the slot unavailable. Returns false if it was already taken.
pub fn reserve(conn: &Connection, slot_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE slots SET available = 0 WHERE id = ?1 AND available = 1",
        params![slot_id],
    )?;
    Ok(count > 0)
}

pub fn release(conn: &Connection, slot_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE slots SET available = 1 WHERE id = ?1",
        params![slot_id],
    )?;
    Ok(count > 0)
}

/// Closest available slots before and after `time` on the same day.
pub fn nearby_available(
    conn: &Connection,
    date: NaiveDate,
    time: NaiveTime,
) -> anyhow::Result<Vec<NaiveTime>> {
    let day = date_str(date);
    let at = time_str(time);

    let before: Option<String> = conn
        .query_row(
            "SELECT time FROM slots WHERE date = ?1 AND time < ?2 AND available = 1
             ORDER BY time DESC LIMIT 1",
            params![day, at],
            |row| row.get(0),
        )
        .optional()?;
    let after: Option<String> = conn
        .query_row(
            "SELECT time FROM slots WHERE date = ?1 AND time > ?2 AND available = 1
             ORDER BY time ASC LIMIT 1",
            params![day, at],
            |row| row.get(0),
        )
        .optional()?;

    before
        .into_iter()
        .chain(after)
        .map(|t| parse_time(&t))
        .collect()
}

fn parse_slot_row(row: &rusqlite::Row) -> anyhow::Result<Slot> {
    let id: i64 = row.get(0)?;
    let date_str: String = row.get(1)?;
    let time_str: String = row.get(2)?;
    let available: bool = row.get::<_, i32>(3)? != 0;

    Ok(Slot {
        id,
        date: parse_date(&date_str)?,
        time: parse_time(&time_str)?,
        available,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, slot_id: i64, name: &str, phone: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (slot_id, name, phone, status) VALUES (?1, ?2, ?3, ?4)",
        params![slot_id, name, phone, BookingStatus::Confirmed.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, booking_number: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            "SELECT booking_number, slot_id, name, phone, status, created_at, updated_at
             FROM bookings WHERE booking_number = ?1",
            params![booking_number],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

/// Moves a confirmed booking to cancelled. Returns false if there was no
/// confirmed booking with that number.
pub fn cancel_booking(conn: &Connection, booking_number: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = datetime('now')
         WHERE booking_number = ?2 AND status = ?3",
        params![
            BookingStatus::Cancelled.as_str(),
            booking_number,
            BookingStatus::Confirmed.as_str()
        ],
    )?;
    Ok(count > 0)
}

const RECORD_SELECT: &str = "SELECT b.booking_number, b.slot_id, s.date, s.time, b.name, b.phone, b.status, s.available
     FROM bookings b INNER JOIN slots s ON s.id = b.slot_id";

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<BookingRecord>> {
    let mut stmt = conn.prepare(&format!("{RECORD_SELECT} ORDER BY b.booking_number ASC"))?;

    let rows = stmt.query_map([], |row| Ok(parse_record_row(row)))?;

    let mut records = vec![];
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

pub fn get_booking_record(conn: &Connection, booking_number: i64) -> anyhow::Result<Option<BookingRecord>> {
    let result = conn
        .query_row(
            &format!("{RECORD_SELECT} WHERE b.booking_number = ?1"),
            params![booking_number],
            |row| Ok(parse_record_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn count_active_for_slot(conn: &Connection, slot_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE slot_id = ?1 AND status = ?2",
        params![slot_id, BookingStatus::Confirmed.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    let updated_at_str: String = row.get(6)?;

    Ok(Booking {
        booking_number: row.get(0)?,
        slot_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        status: BookingStatus::parse(&status_str),
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FMT)
            .with_context(|| format!("bad created_at: {created_at_str}"))?,
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, TIMESTAMP_FMT)
            .with_context(|| format!("bad updated_at: {updated_at_str}"))?,
    })
}

fn parse_record_row(row: &rusqlite::Row) -> anyhow::Result<BookingRecord> {
    let date_str: String = row.get(2)?;
    let time_str: String = row.get(3)?;
    let status_str: String = row.get(6)?;

    Ok(BookingRecord {
        booking_number: row.get(0)?,
        slot_id: row.get(1)?,
        date: parse_date(&date_str)?,
        time: parse_time(&time_str)?,
        name: row.get(4)?,
        phone: row.get(5)?,
        status: BookingStatus::parse(&status_str),
        slot_available: row.get::<_, i32>(7)? != 0,
    })
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("bad slot date: {s}"))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT).with_context(|| format!("bad slot time: {s}"))
}
