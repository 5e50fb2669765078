use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{display_time, BookingEvent, BookingRecord, BookingStatus, Slot};
use crate::services::notify;
use crate::services::parser;
use crate::services::scheduling::BookingRequest;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingView {
    booking_number: i64,
    date: String,
    time: String,
    name: String,
    phone: String,
    status: BookingStatus,
    slot_available: bool,
}

impl From<BookingRecord> for BookingView {
    fn from(r: BookingRecord) -> Self {
        Self {
            booking_number: r.booking_number,
            date: r.date.format("%Y-%m-%d").to_string(),
            time: display_time(r.time),
            name: r.name,
            phone: r.phone,
            status: r.status,
            slot_available: r.slot_available,
        }
    }
}

/// Accepts `3` or `BOOK-3`.
fn booking_number(raw: &str) -> Result<i64, AppError> {
    let digits = raw
        .strip_prefix("BOOK-")
        .or_else(|| raw.strip_prefix("book-"))
        .unwrap_or(raw);
    digits
        .parse()
        .map_err(|_| AppError::NotFound(format!("booking {raw}")))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    let records = state.scheduler.list_bookings()?;
    Ok(Json(records.into_iter().map(BookingView::from).collect()))
}

// POST /api/bookings
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CreateBookingRequest {
    pub date: String,
    pub time: String,
    pub name: String,
    pub phone: String,
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    booking_number: i64,
    date: String,
    time: String,
    name: String,
    phone: String,
    message: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let today = Local::now().date_naive();
    let request = BookingRequest::from_fields(
        &payload.date,
        &payload.time,
        &payload.name,
        &payload.phone,
        today,
    )?;

    let confirmation = state.scheduler.book(&request)?;
    notify::publish(&state, BookingEvent::booked(&confirmation)).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_number: confirmation.booking_number,
            date: confirmation.date.format("%Y-%m-%d").to_string(),
            time: display_time(confirmation.time),
            message: confirmation.message(),
            name: confirmation.name,
            phone: confirmation.phone,
        }),
    ))
}

// GET /api/bookings/:number
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let record = state.scheduler.get_booking(booking_number(&raw)?)?;
    Ok(Json(record.into()))
}

// POST /api/bookings/:number/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let outcome = state.scheduler.cancel(booking_number(&raw)?)?;
    if outcome.released {
        notify::publish(&state, BookingEvent::cancelled(&outcome.record)).await;
    }
    Ok(Json(outcome.record.into()))
}

// GET /api/slots?date=2025-05-25
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

#[derive(Serialize)]
pub struct SlotView {
    id: i64,
    date: String,
    time: String,
    available: bool,
}

impl From<Slot> for SlotView {
    fn from(s: Slot) -> Self {
        Self {
            id: s.id,
            date: s.date.format("%Y-%m-%d").to_string(),
            time: s.display_time(),
            available: s.available,
        }
    }
}

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<SlotView>>, AppError> {
    let today = Local::now().date_naive();
    let date = parser::parse_date(&query.date, today)
        .ok_or_else(|| AppError::InvalidInput(format!("I couldn't understand the date '{}'.", query.date)))?;

    let slots = state.scheduler.slots_for_day(date)?;
    Ok(Json(slots.into_iter().map(SlotView::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_number_forms() {
        assert_eq!(booking_number("3").unwrap(), 3);
        assert_eq!(booking_number("BOOK-12").unwrap(), 12);
        assert_eq!(booking_number("book-4").unwrap(), 4);
        assert!(matches!(booking_number("abc"), Err(AppError::NotFound(_))));
    }
}
