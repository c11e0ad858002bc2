use crate::domain::{
    models::{booking::{Booking, SessionCredit}, job::NotificationJob},
    ports::BookingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create_with_credits(
        &self,
        booking: &Booking,
        credits: &[SessionCredit],
        redeem_code: Option<&str>,
        job: Option<NotificationJob>,
    ) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if let Some(code) = redeem_code {
            let result = sqlx::query(
                "UPDATE vouchers SET usage_count = usage_count + 1
                 WHERE code = $1 AND is_active = TRUE AND (usage_limit IS NULL OR usage_count < usage_limit)"
            )
                .bind(code).execute(&mut *tx).await.map_err(AppError::Database)?;
            if result.rows_affected() == 0 {
                return Err(AppError::Voucher(crate::error::VoucherError::UsageExhausted));
            }
        }

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, package_id, client_id, therapist_id, purchase_date, total_sessions, total_amount, voucher_code, voucher_discount_percent, final_amount, platform_fee, therapist_earnings, expiry_date, status, idempotency_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.package_id).bind(&booking.client_id).bind(&booking.therapist_id)
            .bind(booking.purchase_date).bind(booking.total_sessions).bind(booking.total_amount)
            .bind(&booking.voucher_code).bind(booking.voucher_discount_percent).bind(booking.final_amount)
            .bind(booking.platform_fee).bind(booking.therapist_earnings).bind(booking.expiry_date)
            .bind(booking.status).bind(&booking.idempotency_key).bind(booking.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for credit in credits {
            sqlx::query(
                "INSERT INTO session_credits (id, booking_id, session_index, status, scheduled_date, join_link, recording_url, duration_minutes, title, description, participant_type, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
            )
                .bind(&credit.id).bind(&credit.booking_id).bind(credit.session_index).bind(credit.status)
                .bind(credit.scheduled_date).bind(&credit.join_link).bind(&credit.recording_url)
                .bind(credit.duration_minutes).bind(&credit.title).bind(&credit.description)
                .bind(credit.participant_type).bind(credit.created_at).bind(credit.updated_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        if let Some(job) = job {
            sqlx::query("INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(&job.id).bind(&job.job_type).bind(&job.payload).bind(job.execute_at)
                .bind(&job.status).bind(&job.error_message).bind(job.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_idempotency_key(&self, client_id: &str, key: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE client_id = $1 AND idempotency_key = $2")
            .bind(client_id).bind(key).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE client_id = $1 ORDER BY purchase_date DESC")
            .bind(client_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_therapist(&self, therapist_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE therapist_id = $1 ORDER BY purchase_date DESC")
            .bind(therapist_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_credit(&self, credit_id: &str) -> Result<Option<SessionCredit>, AppError> {
        sqlx::query_as::<_, SessionCredit>("SELECT * FROM session_credits WHERE id = $1")
            .bind(credit_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_credits(&self, booking_id: &str) -> Result<Vec<SessionCredit>, AppError> {
        sqlx::query_as::<_, SessionCredit>("SELECT * FROM session_credits WHERE booking_id = $1 ORDER BY session_index ASC")
            .bind(booking_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn schedule_credit(
        &self,
        credit_id: &str,
        when: DateTime<Utc>,
        join_link: &str,
        reminder: Option<NotificationJob>,
    ) -> Result<SessionCredit, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Same single-winner guard as the SQLite repo; the booking
        // predicate closes the window against the expiry sweep running
        // between the service-level check and this UPDATE.
        let scheduled = sqlx::query_as::<_, SessionCredit>(
            "UPDATE session_credits SET status = 'scheduled', scheduled_date = $1, join_link = $2, updated_at = $3
             WHERE id = $4 AND status = 'available'
               AND (SELECT status FROM bookings WHERE id = session_credits.booking_id) = 'active'
             RETURNING *"
        )
            .bind(when).bind(join_link).bind(Utc::now()).bind(credit_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Credit is not available for scheduling".into()))?;

        if let Some(job) = reminder {
            sqlx::query("INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(&job.id).bind(&job.job_type).bind(&job.payload).bind(job.execute_at)
                .bind(&job.status).bind(&job.error_message).bind(job.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(scheduled)
    }

    async fn reschedule_credit(
        &self,
        credit_id: &str,
        when: DateTime<Utc>,
        join_link: &str,
    ) -> Result<SessionCredit, AppError> {
        sqlx::query_as::<_, SessionCredit>(
            "UPDATE session_credits SET scheduled_date = $1, join_link = $2, updated_at = $3
             WHERE id = $4 AND status = 'scheduled'
               AND (SELECT status FROM bookings WHERE id = session_credits.booking_id) = 'active'
             RETURNING *"
        )
            .bind(when).bind(join_link).bind(Utc::now()).bind(credit_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Credit is not scheduled".into()))
    }

    async fn complete_credit(
        &self,
        credit_id: &str,
        recording_url: Option<&str>,
    ) -> Result<(SessionCredit, Booking), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let completed = sqlx::query_as::<_, SessionCredit>(
            "UPDATE session_credits SET status = 'completed', recording_url = $1, updated_at = $2
             WHERE id = $3 AND status = 'scheduled'
             RETURNING *"
        )
            .bind(recording_url).bind(Utc::now()).bind(credit_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Credit is not yet scheduled".into()))?;

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'completed'
             WHERE id = $1 AND status = 'active'
               AND NOT EXISTS (
                   SELECT 1 FROM session_credits
                   WHERE booking_id = $1 AND status NOT IN ('completed', 'cancelled')
               )
             RETURNING *"
        )
            .bind(&completed.booking_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let booking = match booking {
            Some(b) => b,
            None => sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
                .bind(&completed.booking_id)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?,
        };

        tx.commit().await.map_err(AppError::Database)?;
        Ok((completed, booking))
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE bookings SET status = 'expired' WHERE status = 'active' AND expiry_date < $1")
            .bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
