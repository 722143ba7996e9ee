//! Rolling-window statistics over gappy series.
//!
//! Series are `&[Option<f64>]`, `None` marking gap slots and warmup. Window
//! functions require a full window of present values; the first (n-1) slots
//! and any window touching a gap are `None`.

/// Shift a series forward by `lag` slots; the first `lag` slots become `None`.
pub fn shift(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i < lag { None } else { values[i - lag] })
        .collect()
}

/// Fractional change over `periods` slots: `(x[i] - x[i-p]) / x[i-p]`.
pub fn pct_change(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                return None;
            }
            match (values[i - periods], values[i]) {
                (Some(prev), Some(curr)) if prev != 0.0 => Some((curr - prev) / prev),
                _ => None,
            }
        })
        .collect()
}

/// Carry the last present value forward over gaps.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

fn window_values(values: &[Option<f64>], i: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || i + 1 < window {
        return None;
    }
    values[i + 1 - window..=i].iter().copied().collect()
}

/// Rolling arithmetic mean over a full window.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            window_values(values, i, window).map(|w| w.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Rolling sample standard deviation (ddof = 1) over a full window.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window < 2 {
                return None;
            }
            window_values(values, i, window).map(|w| {
                let mean = w.iter().sum::<f64>() / window as f64;
                let variance =
                    w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
                variance.sqrt()
            })
        })
        .collect()
}

/// Rolling quantile with linear interpolation between order statistics.
pub fn rolling_quantile(values: &[Option<f64>], window: usize, q: f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            window_values(values, i, window).map(|mut w| {
                w.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let rank = q.clamp(0.0, 1.0) * (w.len() - 1) as f64;
                let lo = rank.floor() as usize;
                let hi = rank.ceil() as usize;
                if lo == hi {
                    w[lo]
                } else {
                    let frac = rank - lo as f64;
                    w[lo] * (1.0 - frac) + w[hi] * frac
                }
            })
        })
        .collect()
}

/// Exponential moving average with span smoothing (alpha = 2/(span+1)),
/// seeded at the first present value. The first `span` present observations
/// are warmup and emit `None`; gaps hold the state and emit `None`.
pub fn ema_span(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;
    let mut seen = 0usize;

    values
        .iter()
        .map(|v| {
            if let Some(v) = v {
                state = Some(match state {
                    Some(prev) => v * alpha + prev * (1.0 - alpha),
                    None => *v,
                });
                seen += 1;
            }
            if seen >= span { state } else { None }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn shift_introduces_leading_gaps() {
        let shifted = shift(&series(&[1.0, 2.0, 3.0]), 2);
        assert_eq!(shifted, vec![None, None, Some(1.0)]);
    }

    #[test]
    fn shift_zero_is_identity() {
        let input = series(&[1.0, 2.0]);
        assert_eq!(shift(&input, 0), input);
    }

    #[test]
    fn pct_change_single_period() {
        let changes = pct_change(&series(&[100.0, 110.0, 99.0]), 1);
        assert_eq!(changes[0], None);
        assert!((changes[1].unwrap() - 0.10).abs() < 1e-12);
        assert!((changes[2].unwrap() - (99.0 - 110.0) / 110.0).abs() < 1e-12);
    }

    #[test]
    fn pct_change_multi_period() {
        let changes = pct_change(&series(&[100.0, 101.0, 102.0, 120.0]), 3);
        assert_eq!(changes[2], None);
        assert!((changes[3].unwrap() - 0.20).abs() < 1e-12);
    }

    #[test]
    fn pct_change_propagates_gaps() {
        let input = vec![Some(100.0), None, Some(110.0)];
        let changes = pct_change(&input, 1);
        assert_eq!(changes[1], None);
        assert_eq!(changes[2], None);
    }

    #[test]
    fn forward_fill_carries_values() {
        let input = vec![None, Some(1.0), None, None, Some(2.0)];
        assert_eq!(
            forward_fill(&input),
            vec![None, Some(1.0), Some(1.0), Some(1.0), Some(2.0)]
        );
    }

    #[test]
    fn rolling_mean_warmup_and_values() {
        let means = rolling_mean(&series(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(means[0], None);
        assert_eq!(means[1], None);
        assert!((means[2].unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((means[3].unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rolling_mean_window_with_gap_is_none() {
        let input = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let means = rolling_mean(&input, 3);
        assert_eq!(means[2], None);
        assert_eq!(means[3], None);
        assert!((means[4].unwrap() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rolling_std_sample_deviation() {
        let stds = rolling_std(&series(&[2.0, 4.0, 6.0]), 3);
        // Sample std of {2,4,6} = 2.
        assert!((stds[2].unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rolling_std_constant_window_is_zero() {
        let stds = rolling_std(&series(&[5.0, 5.0, 5.0, 5.0]), 3);
        assert!((stds[3].unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rolling_quantile_interpolates() {
        let quantiles = rolling_quantile(&series(&[1.0, 2.0, 3.0, 4.0]), 4, 0.5);
        assert!((quantiles[3].unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rolling_quantile_extremes() {
        let input = series(&[3.0, 1.0, 2.0]);
        let min = rolling_quantile(&input, 3, 0.0);
        let max = rolling_quantile(&input, 3, 1.0);
        assert!((min[2].unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((max[2].unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_seeds_at_first_value() {
        let emas = ema_span(&series(&[10.0, 20.0, 30.0]), 2);
        // alpha = 2/3; seed 10; 20*2/3 + 10/3 = 50/3; warmup hides slot 0.
        assert_eq!(emas[0], None);
        assert!((emas[1].unwrap() - 50.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn ema_holds_state_over_gaps() {
        let input = vec![Some(10.0), Some(20.0), None, Some(30.0)];
        let emas = ema_span(&input, 2);
        assert_eq!(emas[2], emas[1]);
        assert!(emas[3].unwrap() > emas[1].unwrap());
    }
}
