//! Resolve a price reference against numeric indicator series.

use tracing::trace;

use super::expr::{parse_expr_ref, CrossDirection, CrossWhen, ExprRef, Interpolation, PairOp};
use crate::signals::SeriesMap;

const INTERP_EPSILON: f64 = 1e-12;

/// Resolve `reference` to a finite price, or `None` when it cannot be.
///
/// Plain ids read the series at `index` when given and in range, otherwise
/// the last element. A missing series, a parse failure or a NaN reading all
/// yield `None`.
pub fn resolve_price_from_ref(reference: Option<&str>, series: &SeriesMap, index: Option<usize>) -> Option<f64> {
    let parsed = match parse_expr_ref(reference.unwrap_or_default()) {
        Ok(parsed) => parsed,
        Err(err) => {
            trace!(%err, "unparseable price reference");
            return None;
        }
    };
    let value = match &parsed {
        ExprRef::Indicator { id } => at(series, id, index),
        ExprRef::Cross { a, b, dir, when, interp } => {
            let (a, b) = (series.get_series(a)?, series.get_series(b)?);
            cross_price(a, b, *dir, *when, *interp)?
        }
        ExprRef::Pair { op, a, b } => {
            let (a, b) = (at(series, a, index), at(series, b, index));
            if !a.is_finite() || !b.is_finite() {
                return None;
            }
            match op {
                PairOp::Min => a.min(b),
                PairOp::Max => a.max(b),
                PairOp::Avg => (a + b) / 2.0,
                PairOp::Ratio if b == 0.0 => return None,
                PairOp::Ratio => a / b,
            }
        }
        ExprRef::Offset { a, pct } => at(series, a, index) * (1.0 + pct / 100.0),
    };
    value.is_finite().then_some(value)
}

fn at(series: &SeriesMap, id: &str, index: Option<usize>) -> f64 {
    let Some(values) = series.get_series(id) else {
        return f64::NAN;
    };
    match index {
        Some(i) if i < values.len() => values[i],
        _ => values.last().copied().unwrap_or(f64::NAN),
    }
}

/// Bar index of the selected crossing, scanning back from the latest bar.
fn find_cross(a: &[f64], b: &[f64], dir: CrossDirection, when: CrossWhen) -> Option<usize> {
    let n = a.len().min(b.len());
    let mut crossings = (1..n).rev().filter(|&i| {
        let (a0, a1, b0, b1) = (a[i], a[i - 1], b[i], b[i - 1]);
        if ![a0, a1, b0, b1].iter().all(|v| v.is_finite()) {
            return false;
        }
        let up = a1 <= b1 && a0 > b0;
        let down = a1 >= b1 && a0 < b0;
        match dir {
            CrossDirection::Up => up,
            CrossDirection::Down => down,
            CrossDirection::Both => up || down,
        }
    });
    match when {
        CrossWhen::Recent => crossings.next(),
        CrossWhen::Previous => crossings.nth(1),
    }
}

fn cross_price(a: &[f64], b: &[f64], dir: CrossDirection, when: CrossWhen, interp: Interpolation) -> Option<f64> {
    let i = find_cross(a, b, dir, when)?;
    let (a0, b0) = (a[i], b[i]);
    if interp == Interpolation::Linear {
        if let Some(v) = interpolate(a[i - 1], a0, b[i - 1], b0) {
            return Some(v);
        }
    }
    Some((a0 + b0) / 2.0)
}

/// Intersection of segments `a1→a0` and `b1→b0`, if it lies within the bar.
fn interpolate(a1: f64, a0: f64, b1: f64, b0: f64) -> Option<f64> {
    let da = a0 - a1;
    let denom = da - (b0 - b1);
    if !denom.is_finite() || denom.abs() < INTERP_EPSILON {
        return None;
    }
    let t = (b1 - a1) / denom;
    (0.0..=1.0).contains(&t).then(|| a1 + t * da).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(pairs: &[(&str, &[f64])]) -> SeriesMap {
        pairs.iter().map(|(id, v)| (id.to_string(), v.to_vec())).collect()
    }

    #[test]
    fn plain_id_reads_last_or_index() {
        let s = series(&[("x", &[1.0, 2.0, 3.0])]);
        assert_eq!(resolve_price_from_ref(Some("x"), &s, None), Some(3.0));
        assert_eq!(resolve_price_from_ref(Some("x"), &s, Some(0)), Some(1.0));
        assert_eq!(resolve_price_from_ref(Some("x"), &s, Some(9)), Some(3.0));
    }

    #[test]
    fn missing_or_nan_is_unresolved() {
        let s = series(&[("x", &[1.0, f64::NAN])]);
        assert_eq!(resolve_price_from_ref(Some("x"), &s, None), None);
        assert_eq!(resolve_price_from_ref(Some("gone"), &s, None), None);
        assert_eq!(resolve_price_from_ref(None, &s, None), None);
        assert_eq!(resolve_price_from_ref(Some("expr:bogus:x:x"), &s, None), None);
    }

    #[test]
    fn pair_ops() {
        let s = series(&[("a", &[2.0, 4.0, 6.0]), ("b", &[1.0, 2.0, 3.0]), ("z", &[0.0])]);
        assert_eq!(resolve_price_from_ref(Some("expr:avg:a:b"), &s, None), Some(4.5));
        assert_eq!(resolve_price_from_ref(Some("expr:min:a:b"), &s, None), Some(3.0));
        assert_eq!(resolve_price_from_ref(Some("expr:max:a:b"), &s, None), Some(6.0));
        assert_eq!(resolve_price_from_ref(Some("expr:ratio:a:b"), &s, None), Some(2.0));
        assert_eq!(resolve_price_from_ref(Some("expr:ratio:a:z"), &s, None), None);
    }

    #[test]
    fn offset() {
        let s = series(&[("a", &[100.0, 100.0, 100.0])]);
        let v = resolve_price_from_ref(Some("expr:offset:a:pct=10"), &s, None).unwrap();
        assert_relative_eq!(v, 110.0, epsilon = 1e-8);
    }

    #[test]
    fn cross_recent_and_previous() {
        let s = series(&[("a", &[1.0, 2.0, 3.0, 4.0, 3.0, 5.0]), ("b", &[2.0, 2.0, 2.0, 3.0, 3.0, 4.0])]);
        let recent = resolve_price_from_ref(Some("expr:cross:a:b:dir=up:when=recent"), &s, None).unwrap();
        let previous = resolve_price_from_ref(Some("expr:cross:a:b:dir=up:when=previous"), &s, None).unwrap();
        assert_relative_eq!(recent, 4.5, epsilon = 1e-8);
        assert_relative_eq!(previous, 2.5, epsilon = 1e-8);
        assert_eq!(resolve_price_from_ref(Some("expr:cross:a:b:dir=down"), &s, None), None);
    }

    #[test]
    fn cross_linear_interpolation() {
        let s = series(&[("a", &[1.0, 4.0]), ("b", &[3.0, 2.0])]);
        let v = resolve_price_from_ref(Some("expr:cross:a:b:dir=both:when=recent:interp=linear"), &s, None).unwrap();
        assert_relative_eq!(v, 2.5, epsilon = 1e-8);
    }

    #[test]
    fn parallel_segments_fall_back_to_midpoint() {
        assert_eq!(interpolate(1.0, 2.0, 1.0, 2.0), None);
    }
}
