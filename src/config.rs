use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub clinic_open: String,
    pub clinic_close: String,
    pub slot_minutes: u32,
    pub prepopulate_days: u32,
    pub session_ttl_minutes: i64,
    pub notify_webhook_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            database_url: "appointments.db".to_string(),
            clinic_open: "09:00".to_string(),
            clinic_close: "19:30".to_string(),
            slot_minutes: 30,
            prepopulate_days: 14,
            session_ttl_minutes: 30,
            notify_webhook_url: String::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed("PORT").unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            clinic_open: env::var("CLINIC_OPEN").unwrap_or(defaults.clinic_open),
            clinic_close: env::var("CLINIC_CLOSE").unwrap_or(defaults.clinic_close),
            slot_minutes: parsed("SLOT_MINUTES").unwrap_or(defaults.slot_minutes),
            prepopulate_days: parsed("PREPOPULATE_DAYS").unwrap_or(defaults.prepopulate_days),
            session_ttl_minutes: parsed("SESSION_TTL_MINUTES").unwrap_or(defaults.session_ttl_minutes),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").unwrap_or_default(),
        }
    }
}

/// Unset keys fall back silently; malformed ones fall back with a warning.
fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring malformed setting, using the default");
            None
        }
    }
}
