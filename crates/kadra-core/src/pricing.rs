use serde::{Deserialize, Serialize};

/// Pricing knobs, carried explicitly in app state rather than as module
/// globals. The posting price funds the recruiter payouts and the
/// platform fee, split by the two share fractions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fraction of the average salary charged for a listing.
    pub multiplier: f64,
    /// Price floor for degenerate salary bands.
    pub min_price: f64,
    /// Fraction of the posting price paid out per recruiter.
    pub recruiter_share: f64,
    /// Fraction of the posting price kept by the platform.
    pub platform_share: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            multiplier: 0.7,
            min_price: 3000.0,
            recruiter_share: 0.7,
            platform_share: 0.3,
        }
    }
}

impl PricingConfig {
    /// Price of publishing a listing with the given salary band.
    ///
    /// A negative bound or an all-zero band falls back to the floor;
    /// otherwise the price is the salary average times the multiplier,
    /// never below the floor. Total and deterministic.
    pub fn posting_price(&self, salary_min: i64, salary_max: i64) -> f64 {
        if salary_min < 0 || salary_max < 0 {
            return self.min_price;
        }
        if salary_min == 0 && salary_max == 0 {
            return self.min_price;
        }

        // sum in f64 so extreme bounds cannot overflow i64
        let average = (salary_min as f64 + salary_max as f64) / 2.0;
        (average * self.multiplier).max(self.min_price)
    }

    /// Per-recruiter payout, truncated to whole currency units.
    pub fn recruiter_earnings(&self, posting_price: f64) -> i64 {
        (posting_price * self.recruiter_share) as i64
    }

    /// Platform's cut, truncated to whole currency units.
    pub fn platform_fee(&self, posting_price: f64) -> i64 {
        (posting_price * self.platform_share) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_bands_hit_the_floor() {
        let cfg = PricingConfig::default();
        assert_eq!(cfg.posting_price(0, 0), 3000.0);
        assert_eq!(cfg.posting_price(-5, -5), 3000.0);
        assert_eq!(cfg.posting_price(-1, 500_000), 3000.0);
    }

    #[test]
    fn average_times_multiplier() {
        let cfg = PricingConfig::default();
        // avg 15000 * 0.7 = 10500
        assert_eq!(cfg.posting_price(10_000, 20_000), 10_500.0);
        // avg 300000 * 0.7 = 210000
        assert_eq!(cfg.posting_price(200_000, 400_000), 210_000.0);
    }

    #[test]
    fn small_bands_are_floored() {
        let cfg = PricingConfig::default();
        // avg 2000 * 0.7 = 1400 < 3000
        assert_eq!(cfg.posting_price(1_000, 3_000), 3000.0);
    }

    #[test]
    fn price_never_below_floor() {
        let cfg = PricingConfig::default();
        for (lo, hi) in [(0, 0), (0, 1), (1, 1), (5_000, 5_000), (-3, 10), (100, 8_000)] {
            assert!(cfg.posting_price(lo, hi) >= cfg.min_price);
        }
    }

    #[test]
    fn shares_truncate_to_whole_units() {
        let cfg = PricingConfig::default();
        // 10500 * 0.7 lands just under 7350 in binary floating point and
        // truncation keeps it there
        assert_eq!(cfg.recruiter_earnings(10_500.0), 7_349);
        assert_eq!(cfg.platform_fee(10_500.0), 3_150);
        assert_eq!(cfg.recruiter_earnings(3_001.0), 2_100);
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let cfg = PricingConfig::default();
        let price = cfg.posting_price(i64::MAX, i64::MAX);
        assert!(price >= cfg.min_price);
        assert!(price.is_finite());
    }
}
