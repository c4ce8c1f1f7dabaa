//! Exponential Moving Average (EMA).
//!
//! k = 2 / (period + 1). The accumulator is seeded with the first finite
//! value, not an SMA warm-up, so the output is defined from that bar on.
//! Stored signals depend on this seed; do not change it.
//!
//! Values before the seed are NaN. A later non-finite input yields NaN for
//! that bar and leaves the accumulator untouched.

/// Exponential moving average seeded with the first finite value.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        let next = match prev {
            None => v,
            Some(p) => v * k + p * (1.0 - k),
        };
        prev = Some(next);
        result[i] = next;
    }

    result
}
