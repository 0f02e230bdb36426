//! Average True Range (ATR) indicator.

use super::{true_range, wilder_smooth, Indicator};
use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// Wilder-smoothed average of the true range, in price units.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Atr {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        "atr"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let mut results = vec![None; candles.len()];
        if candles.len() < 2 {
            return results;
        }

        let true_ranges: Vec<f64> = candles
            .windows(2)
            .map(|w| true_range(&w[1], &w[0]))
            .collect();

        // True range i belongs to candle i + 1
        for (i, atr) in wilder_smooth(&true_ranges, self.period).into_iter().enumerate() {
            results[i + 1] = atr;
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_atr_min_periods() {
        assert_eq!(Atr::default().min_periods(), 15);
    }

    #[test]
    fn test_atr_insufficient_data() {
        let results = Atr::default().calculate(&create_uptrend_candles(14));
        assert!(results.iter().all(Option::is_none));
    }

    #[test]
    fn test_atr_first_value_index() {
        let results = Atr::default().calculate(&create_uptrend_candles(15));
        assert!(results[..14].iter().all(Option::is_none));
        assert!(results[14].is_some());
    }

    #[test]
    fn test_atr_constant_range() {
        // Flat closes with a 2.0 wide bar: every true range is 2.0
        let results = Atr::default().calculate(&candles_from_closes(&[50.0; 30]));
        assert_close(results[29], 2.0);
    }

    #[test]
    fn test_atr_uptrend_value() {
        // Bar range 3.0 beats the 2.5 gap to the previous close
        let results = Atr::default().calculate(&create_uptrend_candles(30));
        assert_close(results[29], 3.0);
    }

    #[test]
    fn test_atr_single_candle() {
        assert_eq!(Atr::default().calculate(&create_uptrend_candles(1)), vec![None]);
    }
}
