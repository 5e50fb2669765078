use chrono::{Duration, NaiveDateTime};

use crate::models::booking::format_booking_number;
use crate::models::{BookingRecord, BookingStatus};

/// Single-event iCalendar file for a booking. Cancelled bookings are
/// exported with `STATUS:CANCELLED` so calendar clients drop the event.
pub fn generate_ics(record: &BookingRecord, slot_minutes: u32, stamp: NaiveDateTime) -> String {
    let start = record.date.and_time(record.time);
    let dtstart = start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = (start + Duration::minutes(slot_minutes as i64))
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let dtstamp = stamp.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@clinicdesk", format_booking_number(record.booking_number));
    let status = match record.status {
        BookingStatus::Confirmed => "CONFIRMED",
        BookingStatus::Cancelled => "CANCELLED",
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Clinicdesk//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:Doctor's appointment ({booking})\r\n\
         DESCRIPTION:Patient: {name}\\, phone {phone}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        booking = format_booking_number(record.booking_number),
        name = record.name,
        phone = record.phone,
    )
}
