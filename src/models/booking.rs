use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::slot::{display_date, display_time};

/// Phrase the chat page looks for to raise a "booked" notification.
pub const CONFIRMATION_PHRASE: &str = "Your appointment is confirmed!";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_number: i64,
    pub slot_id: i64,
    pub name: String,
    pub phone: String,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }
}

/// A ledger row joined with its slot, as shown in the "all bookings" view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub booking_number: i64,
    pub slot_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub name: String,
    pub phone: String,
    pub status: BookingStatus,
    pub slot_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfirmation {
    pub booking_number: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub name: String,
    pub phone: String,
}

impl BookingConfirmation {
    pub fn message(&self) -> String {
        format!(
            "{CONFIRMATION_PHRASE} Booking Number: {}. We'll see you on {} at {}. Thank you for visiting.",
            format_booking_number(self.booking_number),
            display_date(self.date),
            display_time(self.time),
        )
    }
}

pub fn format_booking_number(number: i64) -> String {
    format!("BOOK-{number}")
}
