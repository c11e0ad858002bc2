use crate::domain::{models::package::{Package, PackageStatus}, ports::PackageRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqlitePackageRepo {
    pool: SqlitePool,
}

impl SqlitePackageRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PackageRepository for SqlitePackageRepo {
    async fn create(&self, package: &Package) -> Result<Package, AppError> {
        sqlx::query_as::<_, Package>(
            "INSERT INTO packages (id, therapist_id, title, description, price, category, languages, mode, max_participants, session_templates, tags, status, rejection_reason, platform_fee_percent, reviewed_by, reviewed_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&package.id).bind(&package.therapist_id).bind(&package.title).bind(&package.description)
            .bind(package.price).bind(&package.category).bind(&package.languages).bind(package.mode)
            .bind(package.max_participants).bind(&package.session_templates).bind(&package.tags)
            .bind(package.status).bind(&package.rejection_reason).bind(package.platform_fee_percent)
            .bind(&package.reviewed_by).bind(package.reviewed_at).bind(package.created_at).bind(package.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError> {
        sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE id = ?")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, package: &Package) -> Result<Package, AppError> {
        sqlx::query_as::<_, Package>(
            "UPDATE packages SET title=?, description=?, price=?, category=?, languages=?, mode=?, max_participants=?, session_templates=?, tags=?, status=?, rejection_reason=?, reviewed_by=?, reviewed_at=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&package.title).bind(&package.description).bind(package.price).bind(&package.category)
            .bind(&package.languages).bind(package.mode).bind(package.max_participants)
            .bind(&package.session_templates).bind(&package.tags).bind(package.status)
            .bind(&package.rejection_reason).bind(&package.reviewed_by).bind(package.reviewed_at)
            .bind(package.updated_at).bind(&package.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM packages WHERE id = ?")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Package not found".into())); }
        Ok(())
    }

    async fn list_by_status(&self, status: PackageStatus) -> Result<Vec<Package>, AppError> {
        sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE status = ? ORDER BY created_at DESC")
            .bind(status).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_therapist(&self, therapist_id: &str) -> Result<Vec<Package>, AppError> {
        sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE therapist_id = ? ORDER BY created_at DESC")
            .bind(therapist_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
