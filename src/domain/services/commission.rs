use crate::error::AppError;

/// A commission split in integer minor currency units. The earnings are
/// always the remainder after the fee, so the two sides add up to the
/// final amount exactly, whatever the rounding did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub platform_fee: i64,
    pub therapist_earnings: i64,
}

/// Percentage of an amount, round-half-up. The one rounding rule used
/// for both voucher discounts and commission fees. Widened to i128 so
/// the multiply cannot overflow for any i64 input; the result fits i64
/// again because percent is at most 100.
fn percent_of(amount: i64, percent: i64) -> i64 {
    ((amount as i128 * percent as i128 + 50) / 100) as i64
}

pub fn discount_amount(total_amount: i64, discount_percent: i64) -> i64 {
    percent_of(total_amount, discount_percent)
}

pub fn split(final_amount: i64, fee_percent: i64) -> Result<Split, AppError> {
    if !(0..=100).contains(&fee_percent) {
        return Err(AppError::InvalidFeePercent(fee_percent));
    }
    if final_amount < 0 {
        return Err(AppError::Validation("Amount must not be negative".into()));
    }

    let platform_fee = percent_of(final_amount, fee_percent);
    Ok(Split {
        platform_fee,
        therapist_earnings: final_amount - platform_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_scenario() {
        // 15000 with WELCOME10 => 13500, then 35% commission.
        let final_amount = 15000 - discount_amount(15000, 10);
        assert_eq!(final_amount, 13500);

        let s = split(final_amount, 35).unwrap();
        assert_eq!(s.platform_fee, 4725);
        assert_eq!(s.therapist_earnings, 8775);
    }

    #[test]
    fn test_round_half_up() {
        // 12345 * 33% = 4073.85 -> 4074
        assert_eq!(split(12345, 33).unwrap().platform_fee, 4074);
        // 10 * 25% = 2.5 -> 3
        assert_eq!(split(10, 25).unwrap().platform_fee, 3);
        assert_eq!(discount_amount(10, 25), 3);
    }

    #[test]
    fn test_no_drift_across_percent_sweep() {
        for amount in [0i64, 1, 99, 101, 13500, 999_999_999] {
            for pct in 0..=100 {
                let s = split(amount, pct).unwrap();
                assert_eq!(s.platform_fee + s.therapist_earnings, amount,
                    "drift at amount={} pct={}", amount, pct);
                assert!(s.platform_fee >= 0 && s.therapist_earnings >= 0);
            }
        }
    }

    #[test]
    fn test_extreme_amounts_do_not_overflow() {
        for amount in [i64::MAX, i64::MAX - 1, 1 << 62] {
            for pct in [1, 35, 99, 100] {
                let s = split(amount, pct).unwrap();
                assert_eq!(s.platform_fee + s.therapist_earnings, amount);
                assert!(s.platform_fee >= 0 && s.therapist_earnings >= 0);
            }
        }
        assert_eq!(discount_amount(i64::MAX, 100), i64::MAX);
    }

    #[test]
    fn test_fee_percent_out_of_range() {
        assert!(matches!(split(100, -1), Err(AppError::InvalidFeePercent(-1))));
        assert!(matches!(split(100, 101), Err(AppError::InvalidFeePercent(101))));
        assert_eq!(split(100, 0).unwrap().platform_fee, 0);
        assert_eq!(split(100, 100).unwrap().therapist_earnings, 0);
    }
}
