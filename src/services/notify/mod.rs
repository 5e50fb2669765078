pub mod webhook;

use async_trait::async_trait;

use crate::models::BookingEvent;
use crate::state::AppState;

/// Outbound delivery of booking changes, e.g. to a front-desk system.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()>;
}

/// Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()> {
        tracing::info!(
            kind = ?event.kind,
            booking_number = event.booking_number,
            date = %event.date,
            time = %event.time,
            "booking event"
        );
        Ok(())
    }
}

/// Fans a ledger change out to live subscribers and the notifier.
/// Delivery failures are logged, never returned.
pub async fn publish(state: &AppState, event: BookingEvent) {
    // No receivers is fine.
    let _ = state.events_tx.send(event.clone());

    if let Err(e) = state.notifier.notify(&event).await {
        tracing::error!(error = %e, booking_number = event.booking_number, "failed to deliver booking event");
    }
}
