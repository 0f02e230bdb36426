//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::{apply_to_defined, Indicator};
use crate::types::Candle;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// Aligned MACD lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdSeries;

    fn id(&self) -> &str {
        "macd"
    }

    /// Candles needed for the first signal line value.
    fn min_periods(&self) -> usize {
        self.fast_period.max(self.slow_period) + self.signal_period - 1
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let fast_ema = ema_series(&closes, self.fast_period);
        let slow_ema = ema_series(&closes, self.slow_period);

        let macd: Vec<Option<f64>> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(fast, slow)| Some((*fast)? - (*slow)?))
            .collect();

        let signal_period = self.signal_period;
        let signal = apply_to_defined(&macd, |line| ema_series(line, signal_period));

        let histogram = macd
            .iter()
            .zip(signal.iter())
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect();

        MacdSeries {
            macd,
            signal,
            histogram,
        }
    }
}
