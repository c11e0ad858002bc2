use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::package::{SessionMode, SessionTemplate};

#[derive(Deserialize)]
pub struct CreatePackageRequest {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub languages: Vec<String>,
    pub mode: SessionMode,
    pub max_participants: i32,
    pub session_templates: Vec<SessionTemplate>,
    pub tags: Option<Vec<String>>,
    pub platform_fee_percent: Option<i64>,
    pub save_as_draft: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdatePackageRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub languages: Option<Vec<String>>,
    pub mode: Option<SessionMode>,
    pub max_participants: Option<i32>,
    pub session_templates: Option<Vec<SessionTemplate>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct RejectPackageRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ListPackagesQuery {
    pub status: Option<String>,
    pub therapist_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateVoucherRequest {
    pub code: Option<String>,
    pub discount_percent: i64,
    pub min_amount: Option<i64>,
    pub usage_limit: Option<i64>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ValidateVoucherRequest {
    pub code: String,
    pub price: i64,
}

#[derive(Deserialize)]
pub struct PurchaseRequest {
    pub package_id: String,
    pub voucher_code: Option<String>,
    pub idempotency_key: String,
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub client_id: Option<String>,
    pub therapist_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ScheduleCreditRequest {
    pub scheduled_date: DateTime<Utc>,
}

#[derive(Deserialize, Default)]
pub struct CompleteCreditRequest {
    pub recording_url: Option<String>,
}
