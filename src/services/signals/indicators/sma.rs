//! Simple Moving Average (SMA) helper.

/// Rolling mean over `period` values, aligned with the input.
pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);

    // Slide the window
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Rolling mean over `period` entries that are all defined.
pub fn sma_sparse(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    for i in (period.saturating_sub(1))..values.len() {
        let window = &values[i + 1 - period..=i];
        let defined: Option<Vec<f64>> = window.iter().copied().collect();
        out[i] = defined.map(|w| w.iter().sum::<f64>() / period as f64);
    }
    out
}
