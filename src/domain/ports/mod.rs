use crate::domain::models::{
    booking::{Booking, SessionCredit},
    job::NotificationJob,
    package::{Package, PackageStatus},
    voucher::Voucher,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn create(&self, package: &Package) -> Result<Package, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError>;
    async fn update(&self, package: &Package) -> Result<Package, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn list_by_status(&self, status: PackageStatus) -> Result<Vec<Package>, AppError>;
    async fn list_by_therapist(&self, therapist_id: &str) -> Result<Vec<Package>, AppError>;
}

#[async_trait]
pub trait VoucherRepository: Send + Sync {
    async fn create(&self, voucher: &Voucher) -> Result<Voucher, AppError>;
    /// Lookup by uppercase code; callers normalize case first.
    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, AppError>;
    async fn list(&self) -> Result<Vec<Voucher>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomic purchase: inserts the booking, all its credits, the
    /// confirmation job, and redeems the voucher (guarded increment) in
    /// one transaction. Any failure rolls the whole purchase back.
    async fn create_with_credits(
        &self,
        booking: &Booking,
        credits: &[SessionCredit],
        redeem_code: Option<&str>,
        job: Option<NotificationJob>,
    ) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_idempotency_key(&self, client_id: &str, key: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_therapist(&self, therapist_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn find_credit(&self, credit_id: &str) -> Result<Option<SessionCredit>, AppError>;
    async fn list_credits(&self, booking_id: &str) -> Result<Vec<SessionCredit>, AppError>;
    /// Guarded `available -> scheduled` transition; loses with Conflict
    /// if another writer got there first.
    async fn schedule_credit(
        &self,
        credit_id: &str,
        when: DateTime<Utc>,
        join_link: &str,
        reminder: Option<NotificationJob>,
    ) -> Result<SessionCredit, AppError>;
    /// Guarded `scheduled -> scheduled` with new date/link.
    async fn reschedule_credit(
        &self,
        credit_id: &str,
        when: DateTime<Utc>,
        join_link: &str,
    ) -> Result<SessionCredit, AppError>;
    /// Guarded `scheduled -> completed`; flips the parent booking to
    /// completed in the same transaction when the last open credit
    /// settles.
    async fn complete_credit(
        &self,
        credit_id: &str,
        recording_url: Option<&str>,
    ) -> Result<(SessionCredit, Booking), AppError>;
    /// Marks overdue active bookings expired; never touches completed
    /// ones. Returns how many rows flipped.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &NotificationJob) -> Result<NotificationJob, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<NotificationJob>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
    async fn list(&self) -> Result<Vec<NotificationJob>, AppError>;
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn check_availability(
        &self,
        therapist_id: &str,
        when: DateTime<Utc>,
        duration_min: i32,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait MeetingService: Send + Sync {
    async fn create_meeting(
        &self,
        topic: &str,
        when: DateTime<Utc>,
        duration_min: i32,
    ) -> Result<String, AppError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, recipient_id: &str, subject: &str, body: &str) -> Result<(), AppError>;
}
