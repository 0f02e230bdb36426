//! Relative Strength Index (RSI) indicator.

use super::Indicator;
use crate::types::Candle;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

impl Indicator for Rsi {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let mut results = vec![None; candles.len()];
        if self.period == 0 || candles.len() < self.min_periods() {
            return results;
        }

        let period = self.period as f64;
        let mut gains = 0.0;
        let mut losses = 0.0;

        // Initial averages over the first `period` changes
        for i in 1..=self.period {
            let change = candles[i].close - candles[i - 1].close;
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let mut avg_gain = gains / period;
        let mut avg_loss = losses / period;
        results[self.period] = Some(Self::rsi_value(avg_gain, avg_loss));

        // Wilder's smoothing for the rest
        for i in (self.period + 1)..candles.len() {
            let change = candles[i].close - candles[i - 1].close;
            let (gain, loss) = if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            };

            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;
            results[i] = Some(Self::rsi_value(avg_gain, avg_loss));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::default().min_periods(), 15);
        assert_eq!(Rsi::new(7).min_periods(), 8);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let candles = candles_from_closes(&[1.0; 14]);
        let results = Rsi::default().calculate(&candles);
        assert_eq!(results, vec![None; 14]);
    }

    #[test]
    fn test_rsi_first_value_index() {
        let candles = create_uptrend_candles(15);
        let results = Rsi::default().calculate(&candles);
        assert!(results[..14].iter().all(Option::is_none));
        assert!(results[14].is_some());
    }

    #[test]
    fn test_rsi_all_gains() {
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let results = Rsi::default().calculate(&candles_from_closes(&closes));
        for value in &results[14..] {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn test_rsi_all_losses() {
        let closes: Vec<f64> = (1..=20).map(|i| 40.0 - i as f64).collect();
        let results = Rsi::default().calculate(&candles_from_closes(&closes));
        for value in &results[14..] {
            assert_eq!(*value, Some(0.0));
        }
    }

    #[test]
    fn test_rsi_flat_series_is_100() {
        // No losses at all, so RSI is pinned at 100
        let results = Rsi::default().calculate(&candles_from_closes(&[50.0; 30]));
        assert_eq!(results[29], Some(100.0));
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // Alternating +1/-1 changes: equal average gain and loss
        let closes: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let results = Rsi::default().calculate(&candles_from_closes(&closes));
        assert_close(results[14], 50.0);
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let results = Rsi::default().calculate(&create_downtrend_candles(50));
        let value = results[49].unwrap();
        assert!(value < 50.0, "RSI in downtrend should be < 50, got {}", value);
        assert!((0.0..=100.0).contains(&value));
    }
}
