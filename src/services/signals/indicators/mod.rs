//! Technical indicator implementations.
//!
//! Every indicator returns a series aligned with its input candles. Indices
//! without enough history are `None`; nothing here panics on short input.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volume;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::{BollingerBands, BollingerSeries};
pub use ema::Ema;
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use stochastic::{Stochastic, StochasticSeries};
pub use volume::VolumeSpike;

use crate::types::Candle;

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    /// Aligned output, one entry per input candle.
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Number of candles needed before the first defined value.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator over the full candle history.
    fn calculate(&self, candles: &[Candle]) -> Self::Output;
}

/// True Range: max(high - low, |high - prev_close|, |low - prev_close|).
pub fn true_range(current: &Candle, previous: &Candle) -> f64 {
    let hl = current.high - current.low;
    let hc = (current.high - previous.close).abs();
    let lc = (current.low - previous.close).abs();
    hl.max(hc).max(lc)
}

/// Wilder's smoothing, seeded with the mean of the first `period` values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut smoothed = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(smoothed);

    for i in period..values.len() {
        smoothed = (smoothed * (period - 1) as f64 + values[i]) / period as f64;
        out[i] = Some(smoothed);
    }
    out
}

/// Apply a dense-series function to the first contiguous run of defined values.
///
/// Used for indicators of indicators (MACD signal, ADX) whose input starts
/// with a `None` warm-up prefix.
pub(crate) fn apply_to_defined<F>(values: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Vec<Option<f64>>,
{
    let mut out = vec![None; values.len()];
    let Some(start) = values.iter().position(Option::is_some) else {
        return out;
    };

    let run: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
    for (offset, value) in f(&run).into_iter().enumerate() {
        out[start + offset] = value;
    }
    out
}

/// Keep only finite values.
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_true_range_uses_previous_close() {
        let candles = candles_from_closes(&[100.0, 110.0]);
        // high 111 vs prev close 100 dominates the 2.0 bar range
        assert_eq!(true_range(&candles[1], &candles[0]), 11.0);
    }

    #[test]
    fn test_wilder_smooth_seed_and_step() {
        let out = wilder_smooth(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_close(out[2], 4.0);
        // (4 * 2 + 8) / 3
        assert_close(out[3], 16.0 / 3.0);
    }

    #[test]
    fn test_wilder_smooth_short_input() {
        assert_eq!(wilder_smooth(&[1.0, 2.0], 3), vec![None, None]);
        assert_eq!(wilder_smooth(&[1.0], 0), vec![None]);
    }

    #[test]
    fn test_apply_to_defined_realigns() {
        let values = [None, None, Some(1.0), Some(2.0), Some(3.0)];
        let out = apply_to_defined(&values, |run| run.iter().map(|v| Some(v * 10.0)).collect());
        assert_eq!(out, vec![None, None, Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn test_apply_to_defined_all_none() {
        let values = [None, None];
        let out = apply_to_defined(&values, |run| run.iter().map(|v| Some(*v)).collect());
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_finite_filters_nan() {
        assert_eq!(finite(Some(f64::NAN)), None);
        assert_eq!(finite(Some(1.5)), Some(1.5));
    }
}
