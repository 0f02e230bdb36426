//! Stochastic Oscillator indicator.

use super::sma::sma_sparse;
use super::Indicator;
use crate::types::Candle;

/// Stochastic Oscillator.
///
/// Compares closing price to price range over a period:
/// %K = (Current Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA(3) of %K
///
/// %K is undefined when the window has no range.
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self { k_period, d_period }
    }
}

impl Indicator for Stochastic {
    type Output = StochasticSeries;

    fn id(&self) -> &str {
        "stochastic"
    }

    fn min_periods(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let mut k = vec![None; candles.len()];

        if self.k_period > 0 && candles.len() >= self.k_period {
            for i in (self.k_period - 1)..candles.len() {
                let window = &candles[(i + 1 - self.k_period)..=i];

                let lowest_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
                let highest_high = window
                    .iter()
                    .map(|c| c.high)
                    .fold(f64::NEG_INFINITY, f64::max);

                let range = highest_high - lowest_low;
                if range > 0.0 {
                    k[i] = Some(((candles[i].close - lowest_low) / range) * 100.0);
                }
            }
        }

        let d = sma_sparse(&k, self.d_period);
        StochasticSeries { k, d }
    }
}
