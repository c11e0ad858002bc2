use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::domain::models::booking::{Booking, CreditStatus, SessionCredit};
use crate::domain::models::identity::{Identity, Role};
use crate::domain::models::job::{JobPayload, NotificationJob};
use crate::domain::models::package::PackageStatus;
use crate::domain::ports::{BookingRepository, PackageRepository, VoucherRepository};
use crate::domain::services::scheduling::SchedulingGateway;
use crate::domain::services::voucher;
use crate::error::{AppError, VoucherError};

/// The booking ledger: the only writer of bookings and session credits.
/// Owns the purchase transaction and the per-credit state machine;
/// handlers stay thin and never recompute money or window arithmetic.
pub struct LedgerService {
    packages: Arc<dyn PackageRepository>,
    vouchers: Arc<dyn VoucherRepository>,
    bookings: Arc<dyn BookingRepository>,
    gateway: SchedulingGateway,
}

pub struct PurchaseParams {
    pub package_id: String,
    pub voucher_code: Option<String>,
    pub idempotency_key: String,
}

impl LedgerService {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        vouchers: Arc<dyn VoucherRepository>,
        bookings: Arc<dyn BookingRepository>,
        gateway: SchedulingGateway,
    ) -> Self {
        Self { packages, vouchers, bookings, gateway }
    }

    pub async fn purchase(&self, identity: &Identity, params: PurchaseParams) -> Result<Booking, AppError> {
        if params.idempotency_key.trim().is_empty() {
            return Err(AppError::Validation("idempotency_key must not be empty".into()));
        }

        // A retried purchase returns the original booking untouched.
        if let Some(existing) = self.bookings
            .find_by_idempotency_key(&identity.user_id, &params.idempotency_key)
            .await?
        {
            info!("purchase: idempotent replay for key {}", params.idempotency_key);
            return Ok(existing);
        }

        // Fresh read; a package rejected moments ago must not sell.
        let package = self.packages.find_by_id(&params.package_id).await?
            .ok_or(AppError::NotFound("Package not found".into()))?;
        if package.status != PackageStatus::Approved {
            return Err(AppError::PackageNotAvailable);
        }

        let now = Utc::now();

        let voucher_info = match &params.voucher_code {
            Some(raw) => {
                let code = raw.trim().to_uppercase();
                let row = self.vouchers.find_by_code(&code).await?
                    .ok_or(AppError::Voucher(VoucherError::NotFound))?;
                let discount_percent = voucher::validate(&row, package.price, now)?;
                Some((code, discount_percent))
            }
            None => None,
        };

        let (booking, credits) = Booking::new(
            &package,
            &identity.user_id,
            voucher_info.as_ref().map(|(code, pct)| (code.as_str(), *pct)),
            &params.idempotency_key,
            now,
        )?;

        let job = NotificationJob::new(
            "BOOKING_CONFIRMED",
            JobPayload {
                recipient_id: identity.user_id.clone(),
                booking_id: Some(booking.id.clone()),
                package_id: Some(package.id.clone()),
                credit_id: None,
            },
            now,
        );

        let redeem_code = voucher_info.as_ref().map(|(code, _)| code.as_str());
        match self.bookings.create_with_credits(&booking, &credits, redeem_code, Some(job)).await {
            Ok(created) => {
                info!("purchase: booking {} created for package {} ({} credits)",
                    created.id, package.id, created.total_sessions);
                Ok(created)
            }
            // Two racing requests with the same key: the loser re-reads
            // the winner's booking instead of surfacing a 409.
            Err(e) if e.is_unique_violation() => {
                self.bookings
                    .find_by_idempotency_key(&identity.user_id, &params.idempotency_key)
                    .await?
                    .ok_or(AppError::Internal)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn schedule_credit(
        &self,
        identity: &Identity,
        credit_id: &str,
        when: DateTime<Utc>,
    ) -> Result<SessionCredit, AppError> {
        let (credit, booking) = self.load_credit_for_client(identity, credit_id).await?;
        let now = Utc::now();

        if now > booking.expiry_date {
            return Err(AppError::BookingExpired);
        }
        if when <= now {
            return Err(AppError::Validation("Cannot schedule a session in the past".into()));
        }
        if credit.status != CreditStatus::Available {
            return Err(AppError::Conflict("Credit is not available for scheduling".into()));
        }

        // Reserve with the external providers first; the credit only
        // transitions once a real slot and join link exist.
        let join_link = self.gateway
            .reserve(&booking.therapist_id, when, credit.duration_minutes, &credit.title)
            .await?;

        let remind_at = when - Duration::hours(24);
        let reminder = if remind_at > now {
            Some(NotificationJob::new(
                "SESSION_REMINDER",
                JobPayload {
                    recipient_id: booking.client_id.clone(),
                    booking_id: Some(booking.id.clone()),
                    package_id: None,
                    credit_id: Some(credit.id.clone()),
                },
                remind_at,
            ))
        } else {
            None
        };

        let scheduled = self.bookings.schedule_credit(credit_id, when, &join_link, reminder).await?;
        info!("schedule_credit: credit {} scheduled at {}", credit_id, when);
        Ok(scheduled)
    }

    pub async fn reschedule_credit(
        &self,
        identity: &Identity,
        credit_id: &str,
        new_when: DateTime<Utc>,
    ) -> Result<SessionCredit, AppError> {
        let (credit, booking) = self.load_credit_for_client(identity, credit_id).await?;
        let now = Utc::now();

        if now > booking.expiry_date {
            return Err(AppError::BookingExpired);
        }
        if new_when <= now {
            return Err(AppError::Validation("Cannot schedule a session in the past".into()));
        }
        if credit.status != CreditStatus::Scheduled {
            return Err(AppError::Conflict("Only scheduled credits can be rescheduled".into()));
        }

        let join_link = self.gateway
            .reserve(&booking.therapist_id, new_when, credit.duration_minutes, &credit.title)
            .await?;

        let rescheduled = self.bookings.reschedule_credit(credit_id, new_when, &join_link).await?;
        info!("reschedule_credit: credit {} moved to {}", credit_id, new_when);
        Ok(rescheduled)
    }

    pub async fn complete_credit(
        &self,
        identity: &Identity,
        credit_id: &str,
        recording_url: Option<&str>,
    ) -> Result<SessionCredit, AppError> {
        let credit = self.bookings.find_credit(credit_id).await?
            .ok_or(AppError::NotFound("Session credit not found".into()))?;
        let booking = self.bookings.find_by_id(&credit.booking_id).await?
            .ok_or(AppError::Internal)?;

        if identity.role != Role::Admin && identity.user_id != booking.therapist_id {
            return Err(AppError::Forbidden("Only the therapist can complete a session".into()));
        }
        if credit.status != CreditStatus::Scheduled {
            return Err(AppError::Conflict("Credit is not yet scheduled".into()));
        }

        let (completed, booking) = self.bookings.complete_credit(credit_id, recording_url).await?;
        info!("complete_credit: credit {} completed (booking {} now {:?})",
            credit_id, booking.id, booking.status);
        Ok(completed)
    }

    pub async fn get_booking(&self, identity: &Identity, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.bookings.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        self.authorize_participant(identity, &booking)?;
        Ok(booking)
    }

    pub async fn list_credits(&self, identity: &Identity, booking_id: &str) -> Result<Vec<SessionCredit>, AppError> {
        let booking = self.get_booking(identity, booking_id).await?;
        self.bookings.list_credits(&booking.id).await
    }

    pub async fn get_credit(&self, identity: &Identity, credit_id: &str) -> Result<(SessionCredit, Booking), AppError> {
        let credit = self.bookings.find_credit(credit_id).await?
            .ok_or(AppError::NotFound("Session credit not found".into()))?;
        let booking = self.bookings.find_by_id(&credit.booking_id).await?
            .ok_or(AppError::Internal)?;
        self.authorize_participant(identity, &booking)?;
        Ok((credit, booking))
    }

    pub async fn list_bookings(&self, identity: &Identity) -> Result<Vec<Booking>, AppError> {
        match identity.role {
            Role::Client => self.bookings.list_by_client(&identity.user_id).await,
            Role::Therapist => self.bookings.list_by_therapist(&identity.user_id).await,
            Role::Admin => Err(AppError::Validation(
                "Admins must query bookings by client_id or therapist_id".into(),
            )),
        }
    }

    pub async fn list_bookings_for_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_by_client(client_id).await
    }

    async fn load_credit_for_client(
        &self,
        identity: &Identity,
        credit_id: &str,
    ) -> Result<(SessionCredit, Booking), AppError> {
        let credit = self.bookings.find_credit(credit_id).await?
            .ok_or(AppError::NotFound("Session credit not found".into()))?;
        let booking = self.bookings.find_by_id(&credit.booking_id).await?
            .ok_or(AppError::Internal)?;

        if identity.role != Role::Admin && identity.user_id != booking.client_id {
            return Err(AppError::Forbidden("Credit belongs to another client".into()));
        }
        Ok((credit, booking))
    }

    fn authorize_participant(&self, identity: &Identity, booking: &Booking) -> Result<(), AppError> {
        if identity.is_admin()
            || identity.user_id == booking.client_id
            || identity.user_id == booking.therapist_id
        {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not a participant of this booking".into()))
        }
    }
}
