use crate::domain::ports::CalendarService;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

pub struct HttpCalendarService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpCalendarService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct AvailabilityPayload<'a> {
    therapist_id: &'a str,
    start: DateTime<Utc>,
    duration_minutes: i32,
}

#[derive(Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

#[async_trait]
impl CalendarService for HttpCalendarService {
    async fn check_availability(
        &self,
        therapist_id: &str,
        when: DateTime<Utc>,
        duration_min: i32,
    ) -> Result<bool, AppError> {
        let payload = AvailabilityPayload {
            therapist_id,
            start: when,
            duration_minutes: duration_min,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Calendar service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Calendar service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        let body: AvailabilityResponse = res.json().await.map_err(|e| {
            AppError::InternalWithMsg(format!("Calendar service returned invalid body: {}", e))
        })?;

        Ok(body.available)
    }
}
