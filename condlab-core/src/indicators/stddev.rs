//! Rolling population standard deviation.
//!
//! sqrt(max(0, E[x²] − E[x]²)) over a window of `period` values, tracked with
//! running sum and sum of squares. Same warm-up and NaN rules as `sma`.

/// Rolling population standard deviation.
pub fn stddev(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let p = period as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut bad_in_window = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            sum += v;
            sum_sq += v * v;
        } else {
            bad_in_window += 1;
        }
        if i >= period {
            let old = values[i - period];
            if old.is_finite() {
                sum -= old;
                sum_sq -= old * old;
            } else {
                bad_in_window -= 1;
            }
        }
        if i + 1 >= period && bad_in_window == 0 {
            let mean = sum / p;
            let variance = (sum_sq / p - mean * mean).max(0.0);
            result[i] = variance.sqrt();
        }
    }

    result
}
