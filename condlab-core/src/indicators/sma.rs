//! Simple Moving Average (SMA).
//!
//! Rolling mean over a window of `period` values.
//! First valid value at index period-1. A window holding any non-finite
//! value yields NaN.

/// Rolling simple moving average.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut bad_in_window = 0usize;
    for (i, &entering) in values.iter().enumerate() {
        if entering.is_finite() {
            sum += entering;
        } else {
            bad_in_window += 1;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                bad_in_window -= 1;
            }
        }
        if i + 1 >= period && bad_in_window == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}
