use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Voucher {
    pub id: String,
    pub code: String,
    pub discount_percent: i64,
    pub min_amount: Option<i64>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub is_active: bool,
    pub expiry_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewVoucherParams {
    pub code: Option<String>,
    pub discount_percent: i64,
    pub min_amount: Option<i64>,
    pub usage_limit: Option<i64>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Voucher {
    /// Codes are stored uppercase; lookups uppercase the input so
    /// matching is case-insensitive. A missing code gets a random one.
    pub fn new(params: NewVoucherParams) -> Self {
        let code = match params.code {
            Some(c) => c.trim().to_uppercase(),
            None => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(8)
                .map(char::from)
                .collect::<String>()
                .to_uppercase(),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            code,
            discount_percent: params.discount_percent,
            min_amount: params.min_amount,
            usage_limit: params.usage_limit,
            usage_count: 0,
            is_active: params.is_active,
            expiry_date: params.expiry_date,
            description: params.description,
            created_at: Utc::now(),
        }
    }
}
