use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Local;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use clinicdesk::config::AppConfig;
use clinicdesk::db;
use clinicdesk::handlers;
use clinicdesk::models::Schedule;
use clinicdesk::services::notify::webhook::WebhookNotifier;
use clinicdesk::services::notify::{LogNotifier, Notifier};
use clinicdesk::services::scheduling::SchedulingService;
use clinicdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let schedule = Schedule::new(&config.clinic_open, &config.clinic_close, config.slot_minutes)?;
    tracing::info!("clinic hours: {}", schedule.to_human_readable());

    let conn = db::init_db(&config.database_url)?;
    let scheduler = SchedulingService::new(db::shared(conn), schedule);

    let created = scheduler.prepopulate(Local::now().date_naive(), config.prepopulate_days)?;
    tracing::info!(created, days = config.prepopulate_days, "slots prepopulated");

    let notifier: Box<dyn Notifier> = if config.notify_webhook_url.is_empty() {
        tracing::info!("booking notifications go to the log");
        Box::new(LogNotifier)
    } else {
        tracing::info!("posting booking notifications to {}", config.notify_webhook_url);
        Box::new(WebhookNotifier::new(config.notify_webhook_url.clone()))
    };

    let (events_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        config: config.clone(),
        scheduler,
        notifier,
        events_tx,
        sessions: Mutex::new(HashMap::new()),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
