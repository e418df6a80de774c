//! Two-decimal money and multiplier arithmetic.
//!
//! All threshold comparisons and balance updates use values rounded to
//! cents, so two ticks can never disagree about the same multiplier.

/// Largest multiplier the engine will ever hand out.
pub const MULTIPLIER_CEILING: f64 = 1_000_000.0;

/// Upper bound for a single payout credited to the balance.
pub const MAX_PAYOUT: f64 = 1_000_000_000_000.0;

/// Round to two decimal places (half away from zero).
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bound a multiplier to `[1.0, MULTIPLIER_CEILING]`.
///
/// NaN maps to 1.0; infinities map to the ceiling.
#[inline]
pub fn sanitize_multiplier(value: f64) -> f64 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(1.0, MULTIPLIER_CEILING)
    }
}

/// Winnings for `amount` cashed at `multiplier`, rounded and capped.
pub fn payout(amount: f64, multiplier: f64) -> f64 {
    cap_payout(round2(amount * multiplier))
}

/// Clamp a payout into `[0, MAX_PAYOUT]`.
#[inline]
pub fn cap_payout(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_PAYOUT)
    }
}

/// Format a multiplier the way history and labels show it.
pub fn format_multiplier(value: f64) -> String {
    format!("{:.2}x", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.866065983073615), 2.87);
        assert_eq!(round2(1.004), 1.0);
        assert_eq!(round2(15.0), 15.0);
    }

    #[test]
    fn test_sanitize_multiplier() {
        assert_eq!(sanitize_multiplier(f64::NAN), 1.0);
        assert_eq!(sanitize_multiplier(f64::INFINITY), MULTIPLIER_CEILING);
        assert_eq!(sanitize_multiplier(0.5), 1.0);
        assert_eq!(sanitize_multiplier(2.5), 2.5);
    }

    #[test]
    fn test_payout_is_capped() {
        assert_eq!(payout(10.0, 1.5), 15.0);
        assert_eq!(payout(10.0, f64::INFINITY), MAX_PAYOUT);
        assert_eq!(payout(f64::MAX, 2.0), MAX_PAYOUT);
        assert_eq!(cap_payout(f64::NAN), 0.0);
    }

    #[test]
    fn test_format_multiplier() {
        assert_eq!(format_multiplier(2.0), "2.00x");
        assert_eq!(format_multiplier(12.345), "12.35x");
    }
}
