use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};

use crate::domain::models::booking::CreditStatus;
use crate::domain::models::job::NotificationJob;
use crate::error::AppError;
use crate::state::AppState;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    loop {
        // Sweep first so an expired booking can no longer be scheduled
        // against while its notification jobs drain.
        match state.booking_repo.expire_overdue(Utc::now()).await {
            Ok(0) => {}
            Ok(n) => info!("Expired {} overdue bookings", n),
            Err(e) => error!("Expiry sweep failed: {:?}", e),
        }

        match state.job_repo.find_pending(10).await {
            Ok(jobs) => {
                for job in jobs {
                    let span = info_span!(
                        "background_job",
                        job_id = %job.id,
                        job_type = %job.job_type,
                    );

                    let state = state.clone();
                    async move {
                        info!("Processing job: {}", job.job_type);
                        match process_job(&state, &job).await {
                            Ok(_) => {
                                info!("Job completed successfully");
                                if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                                    error!("Failed to mark job as completed: {:?}", e);
                                }
                            }
                            Err(e) => {
                                let err_msg = format!("{}", e);
                                error!("Job failed with error: {}", err_msg);
                                if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                                    error!("Failed to mark job as failed: {:?}", up_err);
                                }
                            }
                        }
                    }
                    .instrument(span)
                    .await;
                }
            }
            Err(e) => error!("Failed to fetch pending jobs: {:?}", e),
        }
        sleep(Duration::from_secs(5)).await;
    }
}

async fn process_job(state: &Arc<AppState>, job: &NotificationJob) -> Result<(), AppError> {
    let payload = &job.payload.0;

    let (template_name, subject, context) = match job.job_type.as_str() {
        "BOOKING_CONFIRMED" => {
            let booking_id = payload.booking_id.as_deref()
                .ok_or(AppError::InternalWithMsg("BOOKING_CONFIRMED job without booking_id".into()))?;
            let booking = state.booking_repo.find_by_id(booking_id).await?
                .ok_or(AppError::NotFound(format!("Booking {} not found", booking_id)))?;
            let package = state.package_repo.find_by_id(&booking.package_id).await?
                .ok_or(AppError::NotFound(format!("Package {} not found", booking.package_id)))?;

            let mut context = tera::Context::new();
            context.insert("package_title", &package.title);
            context.insert("total_sessions", &booking.total_sessions);
            context.insert("expiry_date", &booking.expiry_date.format("%Y-%m-%d").to_string());
            context.insert("final_amount", &booking.final_amount);
            ("booking_confirmed.html", "Your booking is confirmed", context)
        }
        "PACKAGE_APPROVED" => {
            let package = load_package(state, payload.package_id.as_deref()).await?;
            let mut context = tera::Context::new();
            context.insert("package_title", &package.title);
            ("package_approved.html", "Your package is live", context)
        }
        "PACKAGE_REJECTED" => {
            let package = load_package(state, payload.package_id.as_deref()).await?;
            let mut context = tera::Context::new();
            context.insert("package_title", &package.title);
            context.insert("reason", package.rejection_reason.as_deref().unwrap_or(""));
            ("package_rejected.html", "Your package needs changes", context)
        }
        "SESSION_REMINDER" => {
            let credit_id = payload.credit_id.as_deref()
                .ok_or(AppError::InternalWithMsg("SESSION_REMINDER job without credit_id".into()))?;
            let credit = state.booking_repo.find_credit(credit_id).await?
                .ok_or(AppError::NotFound(format!("Credit {} not found", credit_id)))?;

            // The session may have been rescheduled or completed since
            // the reminder was queued.
            let scheduled = match (credit.status, credit.scheduled_date) {
                (CreditStatus::Scheduled, Some(when)) => when,
                _ => {
                    info!("Reminder skipped, credit {} is no longer scheduled", credit_id);
                    return Ok(());
                }
            };

            let mut context = tera::Context::new();
            context.insert("session_title", &credit.title);
            context.insert("scheduled_date", &scheduled.format("%Y-%m-%d %H:%M UTC").to_string());
            ("session_reminder.html", "Upcoming session reminder", context)
        }
        other => {
            return Err(AppError::InternalWithMsg(format!("Unknown job type {}", other)));
        }
    };

    let body = state.templates.render(template_name, &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))?;

    state.notification_service.send(&payload.recipient_id, subject, &body).await?;
    Ok(())
}

async fn load_package(
    state: &Arc<AppState>,
    package_id: Option<&str>,
) -> Result<crate::domain::models::package::Package, AppError> {
    let package_id = package_id
        .ok_or(AppError::InternalWithMsg("Package job without package_id".into()))?;
    state.package_repo.find_by_id(package_id).await?
        .ok_or(AppError::NotFound(format!("Package {} not found", package_id)))
}
