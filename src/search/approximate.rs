//! Approximate result counts.

/// Returns an approximation of `estimate` calibrated by its relative standard
/// error `sigma`.
///
/// The result is a number that is not misleading in "1-10 of about N results"
/// but still close to the estimate. The expected error `sigma * estimate` is
/// rounded to the logarithmically closest power of ten (300 becomes 100, 400
/// becomes 1000), and the estimate is rounded half-up to a multiple of that
/// unit. An estimate below half a unit therefore shows as 0.
///
/// The unit never drops below 1, so small estimates come back exact.
/// A `sigma` of zero (or anything non-positive or non-finite) means the
/// estimate is already exact.
pub fn approximate_number(estimate: u64, sigma: f64) -> u64 {
    if estimate == 0 || !sigma.is_finite() || sigma <= 0.0 {
        return estimate;
    }

    let expected_error = sigma * estimate as f64;
    let unit = 10f64.powi(expected_error.log10().round() as i32).max(1.0);
    (unit * (estimate as f64 / unit).round()) as u64
}
