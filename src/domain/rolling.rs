//! Time-series helpers over optional values.
//!
//! Every series here is aligned to the trade range; `None` marks a row where
//! no value exists yet (warmup, no data) and is never treated as zero.

/// Maps a raw float onto the missing-value convention: `±inf` becomes 0,
/// `NaN` becomes missing.
pub fn sanitize(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else if value.is_infinite() {
        Some(0.0)
    } else {
        Some(value)
    }
}

/// Carries the last present value forward over gaps. Rows before the first
/// present value stay missing.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for slot in values.iter_mut() {
        if slot.is_some() {
            last = *slot;
        } else {
            *slot = last;
        }
    }
}

/// Simple moving average over `period` rows. A window containing any
/// missing row yields missing.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().all(Option::is_some) {
            let total: f64 = window.iter().flatten().sum();
            out[i] = Some(total / period as f64);
        }
    }
    out
}

/// Population mean and standard deviation.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
