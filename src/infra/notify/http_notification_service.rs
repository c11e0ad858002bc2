use crate::domain::ports::NotificationService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Adapter for the notification hub. Delivery is fire-and-forget from
/// the ledger's point of view: the background worker logs failures and
/// marks the job FAILED, it never blocks a booking on this.
pub struct HttpNotificationService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotificationService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    recipient_id: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn send(&self, recipient_id: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let payload = NotificationPayload {
            recipient_id,
            subject,
            html_body: body,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
