//! Shared rate and rounding helpers.
//!
//! Every percentage devpulse displays goes through [`ratio`] so that empty
//! populations yield 0% instead of a division error, and through [`round2`]
//! so values are stable to compare in tests and across runs.

/// Percentage of `numerator` over `denominator`, rounded to 2 decimals.
///
/// An empty population (zero denominator) gives 0% rather than dividing by
/// zero, whatever the numerator.
///
/// # Examples
///
/// ```
/// use devpulse_metrics::rates::ratio;
///
/// assert_eq!(ratio(3, 4), 75.0);
/// assert_eq!(ratio(1, 3), 33.33);
/// assert_eq!(ratio(5, 0), 0.0);
/// ```
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2(numerator as f64 / denominator as f64 * 100.0)
}

/// Round to 2 decimal places.
///
/// # Examples
///
/// ```
/// use devpulse_metrics::rates::round2;
///
/// assert_eq!(round2(2.345), 2.35);
/// assert_eq!(round2(2.0), 2.0);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_yields_zero_for_any_numerator() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(u64::MAX, 0), 0.0);
    }

    #[test]
    fn full_population_is_one_hundred_percent() {
        assert_eq!(ratio(10, 10), 100.0);
    }

    #[test]
    fn result_is_rounded_to_two_decimals() {
        assert_eq!(ratio(2, 3), 66.67);
        assert_eq!(ratio(1, 6), 16.67);
    }

    #[test]
    fn round2_behaves_at_midpoints() {
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(-1.005), -1.0);
    }
}
