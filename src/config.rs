use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub calendar_service_url: String,
    pub calendar_service_token: String,
    pub meeting_service_url: String,
    pub meeting_service_token: String,
    pub notification_service_url: String,
    pub notification_service_token: String,
    pub gateway_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            calendar_service_url: env::var("CALENDAR_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1/availability/check".to_string()),
            calendar_service_token: env::var("CALENDAR_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            meeting_service_url: env::var("MEETING_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8200/api/v1/meetings".to_string()),
            meeting_service_token: env::var("MEETING_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            notification_service_url: env::var("NOTIFICATION_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8300/api/v1/notify".to_string()),
            notification_service_token: env::var("NOTIFICATION_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            gateway_timeout_ms: env::var("GATEWAY_TIMEOUT_MS").unwrap_or_else(|_| "5000".to_string()).parse().expect("GATEWAY_TIMEOUT_MS must be a number"),
        }
    }
}
