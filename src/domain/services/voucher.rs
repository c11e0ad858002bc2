use chrono::{DateTime, Utc};

use crate::domain::models::voucher::Voucher;
use crate::error::VoucherError;

/// Checks a voucher against a price at a point in time and returns the
/// discount percent on success. Pure: never touches usage_count. The
/// actual redeem is a guarded UPDATE inside the purchase transaction.
pub fn validate(voucher: &Voucher, price: i64, now: DateTime<Utc>) -> Result<i64, VoucherError> {
    if !voucher.is_active {
        return Err(VoucherError::Inactive);
    }
    if let Some(expiry) = voucher.expiry_date {
        if now > expiry {
            return Err(VoucherError::Expired);
        }
    }
    if let Some(min_amount) = voucher.min_amount {
        if price < min_amount {
            return Err(VoucherError::BelowMinimum);
        }
    }
    if let Some(limit) = voucher.usage_limit {
        if voucher.usage_count >= limit {
            return Err(VoucherError::UsageExhausted);
        }
    }
    Ok(voucher.discount_percent)
}
