//! DMI / ADX: Directional Movement Index (Wilder).
//!
//! Steps:
//! 1. Per bar (from the second): +DM, -DM and true range
//! 2. Wilder-smooth each over `di_period`: first value = sum of the first
//!    `period` inputs, then prev − prev/period + value
//! 3. DI± = 100 · smoothed(DM±) / smoothed(TR)
//! 4. DX = 100 · |DI+ − DI−| / (DI+ + DI−)
//! 5. ADX = Wilder-smooth(DX, adx_period) / adx_period
//!
//! Non-finite inputs to the smoother count as zero movement, so ADX is
//! defined as soon as `max(di_period, adx_period) + 2` bars exist.

use serde::{Deserialize, Serialize};

/// Full DMI series, index-aligned with the input bars. Index 0 is always NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DmiSeries {
    pub di_plus: Vec<f64>,
    pub di_minus: Vec<f64>,
    pub dx: Vec<f64>,
    pub adx: Vec<f64>,
}

/// Most recent DMI reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmiSnapshot {
    pub di_plus: f64,
    pub di_minus: f64,
    pub adx: f64,
}

/// Wilder smoothing with a running-sum seed.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 {
        return out;
    }
    let p = period as f64;
    let mut sum = 0.0;
    for (i, &raw) in values.iter().enumerate() {
        let v = if raw.is_finite() { raw } else { 0.0 };
        if i < period {
            sum += v;
            if i == period - 1 {
                out[i] = sum;
            }
        } else {
            let prev = out[i - 1];
            out[i] = prev - prev / p + v;
        }
    }
    out
}

/// Compute DI+, DI−, DX and ADX.
pub fn dmi(highs: &[f64], lows: &[f64], closes: &[f64], di_period: usize, adx_period: usize) -> DmiSeries {
    let n = highs.len().min(lows.len()).min(closes.len());
    let mut series = DmiSeries {
        di_plus: vec![f64::NAN; n],
        di_minus: vec![f64::NAN; n],
        dx: vec![f64::NAN; n],
        adx: vec![f64::NAN; n],
    };
    if n < 2 {
        return series;
    }

    // Movement arrays start at bar 1; shifted index k maps to bar k + 1.
    let mut tr = Vec::with_capacity(n - 1);
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    for i in 1..n {
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        let range = (highs[i] - lows[i])
            .max((highs[i] - closes[i - 1]).abs())
            .max((lows[i] - closes[i - 1]).abs());
        tr.push(range);
    }

    let sm_tr = wilder_smooth(&tr, di_period);
    let sm_plus = wilder_smooth(&plus_dm, di_period);
    let sm_minus = wilder_smooth(&minus_dm, di_period);

    let di = |sm: f64, sm_tr: f64| {
        if sm.is_finite() && sm_tr.is_finite() && sm_tr != 0.0 {
            100.0 * sm / sm_tr
        } else {
            f64::NAN
        }
    };
    let di_plus: Vec<f64> = sm_plus.iter().zip(&sm_tr).map(|(&s, &t)| di(s, t)).collect();
    let di_minus: Vec<f64> = sm_minus.iter().zip(&sm_tr).map(|(&s, &t)| di(s, t)).collect();
    let dx: Vec<f64> = di_plus
        .iter()
        .zip(&di_minus)
        .map(|(&dp, &dm)| {
            if !dp.is_finite() || !dm.is_finite() || dp + dm == 0.0 {
                f64::NAN
            } else {
                100.0 * (dp - dm).abs() / (dp + dm)
            }
        })
        .collect();
    let adx_p = adx_period as f64;
    let adx: Vec<f64> = wilder_smooth(&dx, adx_period)
        .into_iter()
        .map(|v| if v.is_finite() { v / adx_p } else { f64::NAN })
        .collect();

    for k in 0..n - 1 {
        series.di_plus[k + 1] = di_plus[k];
        series.di_minus[k + 1] = di_minus[k];
        series.dx[k + 1] = dx[k];
        series.adx[k + 1] = adx[k];
    }
    series
}

/// Latest DMI reading, or `None` with fewer than `max(di, adx) + 2` bars or
/// when any of the three latest values is non-finite.
pub fn dmi_snapshot(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    di_period: usize,
    adx_period: usize,
) -> Option<DmiSnapshot> {
    let n = highs.len().min(lows.len()).min(closes.len());
    if n < di_period.max(adx_period) + 2 {
        return None;
    }
    let series = dmi(highs, lows, closes, di_period, adx_period);
    let snapshot = DmiSnapshot {
        di_plus: *series.di_plus.last()?,
        di_minus: *series.di_minus.last()?,
        adx: *series.adx.last()?,
    };
    (snapshot.di_plus.is_finite() && snapshot.di_minus.is_finite() && snapshot.adx.is_finite())
        .then_some(snapshot)
}
