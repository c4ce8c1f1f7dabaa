//! Relative Strength Index (RSI).
//!
//! Per-bar gains and losses (index 0 contributes zero to both) averaged by
//! SMA or EMA. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge cases: avg_loss == 0 → 100; avg_gain + avg_loss == 0 (flat market)
//! → NaN; any non-finite average → NaN.

use super::MaMethod;

/// RSI line for `closes`.
pub fn rsi(closes: &[f64], period: usize, method: MaMethod) -> Vec<f64> {
    let n = closes.len();
    let mut gains = Vec::with_capacity(n);
    let mut losses = Vec::with_capacity(n);
    for i in 0..n {
        if i == 0 {
            gains.push(0.0);
            losses.push(0.0);
            continue;
        }
        let diff = closes[i] - closes[i - 1];
        if diff.is_finite() {
            gains.push(diff.max(0.0));
            losses.push((-diff).max(0.0));
        } else {
            gains.push(f64::NAN);
            losses.push(f64::NAN);
        }
    }

    let avg_gain = method.apply(&gains, period);
    let avg_loss = method.apply(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&ag, &al)| compute_rsi(ag, al))
        .collect()
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if !avg_gain.is_finite() || !avg_loss.is_finite() || avg_gain + avg_loss == 0.0 {
        return f64::NAN;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
