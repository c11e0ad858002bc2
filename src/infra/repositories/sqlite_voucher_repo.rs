use crate::domain::{models::voucher::Voucher, ports::VoucherRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteVoucherRepo {
    pool: SqlitePool,
}

impl SqliteVoucherRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoucherRepository for SqliteVoucherRepo {
    async fn create(&self, voucher: &Voucher) -> Result<Voucher, AppError> {
        sqlx::query_as::<_, Voucher>(
            "INSERT INTO vouchers (id, code, discount_percent, min_amount, usage_limit, usage_count, is_active, expiry_date, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&voucher.id).bind(&voucher.code).bind(voucher.discount_percent)
            .bind(voucher.min_amount).bind(voucher.usage_limit).bind(voucher.usage_count)
            .bind(voucher.is_active).bind(voucher.expiry_date).bind(&voucher.description)
            .bind(voucher.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, AppError> {
        sqlx::query_as::<_, Voucher>("SELECT * FROM vouchers WHERE code = ?")
            .bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Voucher>, AppError> {
        sqlx::query_as::<_, Voucher>("SELECT * FROM vouchers ORDER BY created_at DESC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
