use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::errors::AppError;
use crate::models::booking::format_booking_number;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /calendar/:number.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let raw = raw.strip_suffix(".ics").unwrap_or(&raw);
    let number = raw
        .strip_prefix("BOOK-")
        .unwrap_or(raw)
        .parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("booking {raw}")))?;

    let record = state.scheduler.get_booking(number)?;
    let ics = generate_ics(
        &record,
        state.scheduler.schedule().slot_minutes,
        Utc::now().naive_utc(),
    );
    let filename = format!("{}.ics", format_booking_number(number));

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
