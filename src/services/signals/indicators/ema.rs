//! Exponential Moving Average (EMA) indicator.

use super::Indicator;
use crate::types::Candle;

/// EMA (Exponential Moving Average) indicator.
///
/// Like SMA but gives more weight to recent prices. Smoothing factor is
/// `2 / (period + 1)`, seeded with the simple average of the first `period`
/// closes.
pub struct Ema {
    id: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            id: format!("ema{}", period),
            period,
        }
    }
}

/// EMA of a dense series.
pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // First EMA is SMA
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for i in period..values.len() {
        ema = (values[i] - ema) * multiplier + ema;
        out[i] = Some(ema);
    }
    out
}

impl Indicator for Ema {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        &self.id
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema_series(&closes, self.period)
    }
}
