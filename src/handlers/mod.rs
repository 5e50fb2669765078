pub mod bookings;
pub mod calendar;
pub mod chat;
pub mod events;
pub mod health;
pub mod pages;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::landing_page))
        .route("/app", get(pages::chat_page))
        .route("/health", get(health::health))
        .route("/ws", get(chat::ws_handler))
        .route("/api/chat", post(chat::post_chat))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/events", get(events::events_stream))
        .route("/api/bookings/:number", get(bookings::get_booking))
        .route(
            "/api/bookings/:number/cancel",
            post(bookings::cancel_booking),
        )
        .route("/api/slots", get(bookings::list_slots))
        .route("/calendar/:number", get(calendar::download_ics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
