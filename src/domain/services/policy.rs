use chrono::{DateTime, Duration, Utc};

use crate::domain::models::booking::{CreditStatus, SessionCredit};

/// How long a purchased package stays consumable. The marketplace sells
/// these as "valid for 6 months".
pub const BOOKING_VALIDITY_DAYS: i64 = 180;

/// Join window around a scheduled session. Every call site goes through
/// `join_window`/`can_join` below; the window is never recomputed ad hoc.
pub const JOIN_OPENS_BEFORE_MIN: i64 = 15;
pub const JOIN_CLOSES_AFTER_MIN: i64 = 60;

/// Commission retained by the platform when a package does not specify
/// its own fee percent at creation.
pub const DEFAULT_PLATFORM_FEE_PERCENT: i64 = 35;

/// Ceiling on a package price in minor units (1,000,000.00). Keeps the
/// ledger's integer arithmetic far from i64 limits.
pub const MAX_PACKAGE_PRICE: i64 = 100_000_000;

pub fn booking_expiry(purchase_date: DateTime<Utc>) -> DateTime<Utc> {
    purchase_date + Duration::days(BOOKING_VALIDITY_DAYS)
}

pub fn join_window(scheduled_date: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        scheduled_date - Duration::minutes(JOIN_OPENS_BEFORE_MIN),
        scheduled_date + Duration::minutes(JOIN_CLOSES_AFTER_MIN),
    )
}

/// True iff the credit is scheduled and `now` falls inside the join
/// window (boundaries inclusive). Any other status is never joinable,
/// regardless of time.
pub fn can_join(credit: &SessionCredit, now: DateTime<Utc>) -> bool {
    if credit.status != CreditStatus::Scheduled {
        return false;
    }
    match credit.scheduled_date {
        Some(scheduled) => {
            let (opens, closes) = join_window(scheduled);
            now >= opens && now <= closes
        }
        None => false,
    }
}
