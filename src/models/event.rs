use serde::{Deserialize, Serialize};

use super::booking::{BookingConfirmation, BookingRecord};
use super::slot::display_time;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingEventKind {
    Booked,
    Cancelled,
}

/// Broadcast to SSE subscribers and the notifier after a ledger change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingEvent {
    pub kind: BookingEventKind,
    pub booking_number: i64,
    pub date: String,
    pub time: String,
    pub name: String,
    pub phone: String,
}

impl BookingEvent {
    pub fn booked(confirmation: &BookingConfirmation) -> Self {
        Self {
            kind: BookingEventKind::Booked,
            booking_number: confirmation.booking_number,
            date: confirmation.date.format("%Y-%m-%d").to_string(),
            time: display_time(confirmation.time),
            name: confirmation.name.clone(),
            phone: confirmation.phone.clone(),
        }
    }

    pub fn cancelled(record: &BookingRecord) -> Self {
        Self {
            kind: BookingEventKind::Cancelled,
            booking_number: record.booking_number,
            date: record.date.format("%Y-%m-%d").to_string(),
            time: display_time(record.time),
            name: record.name.clone(),
            phone: record.phone.clone(),
        }
    }
}
