use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct VoucherQuoteResponse {
    pub code: String,
    pub discount_percent: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
}

#[derive(Serialize)]
pub struct JoinWindowResponse {
    pub can_join: bool,
    pub join_link: Option<String>,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
}
