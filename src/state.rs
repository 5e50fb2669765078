use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, Mutex as AsyncMutex};

use crate::config::AppConfig;
use crate::models::{BookingEvent, Conversation};
use crate::services::notify::Notifier;
use crate::services::scheduling::SchedulingService;

pub struct AppState {
    pub config: AppConfig,
    pub scheduler: SchedulingService,
    pub notifier: Box<dyn Notifier>,
    pub events_tx: broadcast::Sender<BookingEvent>,
    /// Chat sessions for the stateless `POST /api/chat` transport.
    pub sessions: Mutex<HashMap<String, Arc<AsyncMutex<Conversation>>>>,
}
