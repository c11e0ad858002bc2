use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::warn;

use crate::domain::ports::{CalendarService, MeetingService};
use crate::error::AppError;

/// Boundary to the external calendar and video-conferencing providers.
/// Every call is bounded by a timeout so a hanging provider surfaces as
/// `GatewayTimeout` instead of leaving a credit half-transitioned; the
/// ledger only mutates state after a successful reservation here.
#[derive(Clone)]
pub struct SchedulingGateway {
    calendar: Arc<dyn CalendarService>,
    meetings: Arc<dyn MeetingService>,
    call_timeout: Duration,
}

impl SchedulingGateway {
    pub fn new(
        calendar: Arc<dyn CalendarService>,
        meetings: Arc<dyn MeetingService>,
        call_timeout: Duration,
    ) -> Self {
        Self { calendar, meetings, call_timeout }
    }

    /// Verifies the therapist is free and creates the meeting, returning
    /// the join link. Join links always come from here, never from the
    /// client.
    pub async fn reserve(
        &self,
        therapist_id: &str,
        when: DateTime<Utc>,
        duration_min: i32,
        topic: &str,
    ) -> Result<String, AppError> {
        let available = timeout(
            self.call_timeout,
            self.calendar.check_availability(therapist_id, when, duration_min),
        )
        .await
        .map_err(|_| {
            warn!("Availability check timed out for therapist {}", therapist_id);
            AppError::GatewayTimeout
        })??;

        if !available {
            return Err(AppError::SlotConflict);
        }

        let join_link = timeout(
            self.call_timeout,
            self.meetings.create_meeting(topic, when, duration_min),
        )
        .await
        .map_err(|_| {
            warn!("Meeting creation timed out for therapist {}", therapist_id);
            AppError::GatewayTimeout
        })??;

        Ok(join_link)
    }
}
