use crate::domain::ports::MeetingService;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

pub struct HttpMeetingService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpMeetingService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct MeetingPayload<'a> {
    topic: &'a str,
    start: DateTime<Utc>,
    duration_minutes: i32,
}

#[derive(Deserialize)]
struct MeetingResponse {
    join_url: String,
}

#[async_trait]
impl MeetingService for HttpMeetingService {
    async fn create_meeting(
        &self,
        topic: &str,
        when: DateTime<Utc>,
        duration_min: i32,
    ) -> Result<String, AppError> {
        let payload = MeetingPayload {
            topic,
            start: when,
            duration_minutes: duration_min,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Meeting service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Meeting service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        let body: MeetingResponse = res.json().await.map_err(|e| {
            AppError::InternalWithMsg(format!("Meeting service returned invalid body: {}", e))
        })?;

        Ok(body.join_url)
    }
}
