use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::domain::models::package::{Package, ParticipantType};
use crate::domain::services::{commission, policy};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Completed,
    Expired,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Available,
    Scheduled,
    Completed,
    Cancelled,
}

/// One purchase of one package by one client, together with its money
/// split. `therapist_earnings` is always derived by subtraction so
/// `platform_fee + therapist_earnings == final_amount` holds by
/// construction.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub package_id: String,
    pub client_id: String,
    pub therapist_id: String,
    pub purchase_date: DateTime<Utc>,
    pub total_sessions: i32,
    pub total_amount: i64,
    pub voucher_code: Option<String>,
    pub voucher_discount_percent: i64,
    pub final_amount: i64,
    pub platform_fee: i64,
    pub therapist_earnings: i64,
    pub expiry_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SessionCredit {
    pub id: String,
    pub booking_id: String,
    pub session_index: i32,
    pub status: CreditStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub join_link: Option<String>,
    pub recording_url: Option<String>,
    pub duration_minutes: i32,
    pub title: String,
    pub description: Option<String>,
    pub participant_type: ParticipantType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds the booking row plus its full set of credits from the
    /// package as it reads right now. One credit per session template,
    /// `session_index` 0..N-1, all starting `available`.
    pub fn new(
        package: &Package,
        client_id: &str,
        voucher: Option<(&str, i64)>,
        idempotency_key: &str,
        now: DateTime<Utc>,
    ) -> Result<(Booking, Vec<SessionCredit>), AppError> {
        let (voucher_code, discount_percent) = match voucher {
            Some((code, pct)) => (Some(code.to_string()), pct),
            None => (None, 0),
        };

        let final_amount = package.price - commission::discount_amount(package.price, discount_percent);
        let split = commission::split(final_amount, package.platform_fee_percent)?;

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            package_id: package.id.clone(),
            client_id: client_id.to_string(),
            therapist_id: package.therapist_id.clone(),
            purchase_date: now,
            total_sessions: package.total_sessions(),
            total_amount: package.price,
            voucher_code,
            voucher_discount_percent: discount_percent,
            final_amount,
            platform_fee: split.platform_fee,
            therapist_earnings: split.therapist_earnings,
            expiry_date: policy::booking_expiry(now),
            status: BookingStatus::Active,
            idempotency_key: idempotency_key.to_string(),
            created_at: now,
        };

        let credits = package
            .session_templates
            .0
            .iter()
            .enumerate()
            .map(|(i, template)| SessionCredit {
                id: Uuid::new_v4().to_string(),
                booking_id: booking.id.clone(),
                session_index: i as i32,
                status: CreditStatus::Available,
                scheduled_date: None,
                join_link: None,
                recording_url: None,
                duration_minutes: template.duration_minutes,
                title: template.title.clone(),
                description: template.description.clone(),
                participant_type: template.participant_type,
                created_at: now,
                updated_at: now,
            })
            .collect();

        Ok((booking, credits))
    }
}
