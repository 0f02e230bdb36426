//! Average Directional Index (ADX) indicator.

use super::{apply_to_defined, true_range, wilder_smooth, Indicator};
use crate::types::Candle;

/// ADX (Average Directional Index) indicator.
///
/// Measures trend strength (not direction):
/// - Below 20: Weak trend / ranging market
/// - 20-40: Trending
/// - Above 40: Strong trend
pub struct Adx {
    period: usize,
}

impl Default for Adx {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Directional index from smoothed DM and TR.
    ///
    /// A flat window (no range or no directional movement) has DX 0.
    fn dx(plus_dm: f64, minus_dm: f64, tr: f64) -> f64 {
        if tr == 0.0 {
            return 0.0;
        }
        let plus_di = (plus_dm / tr) * 100.0;
        let minus_di = (minus_dm / tr) * 100.0;
        let di_sum = plus_di + minus_di;
        if di_sum > 0.0 {
            ((plus_di - minus_di).abs() / di_sum) * 100.0
        } else {
            0.0
        }
    }
}

impl Indicator for Adx {
    type Output = Vec<Option<f64>>;

    fn id(&self) -> &str {
        "adx"
    }

    fn min_periods(&self) -> usize {
        self.period * 2
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let mut results = vec![None; candles.len()];
        if self.period == 0 || candles.len() < 2 {
            return results;
        }

        let mut plus_dm = Vec::with_capacity(candles.len() - 1);
        let mut minus_dm = Vec::with_capacity(candles.len() - 1);
        let mut tr = Vec::with_capacity(candles.len() - 1);

        for pair in candles.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            let up_move = current.high - previous.high;
            let down_move = previous.low - current.low;

            plus_dm.push(if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            });
            minus_dm.push(if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            });
            tr.push(true_range(current, previous));
        }

        let smoothed_plus = wilder_smooth(&plus_dm, self.period);
        let smoothed_minus = wilder_smooth(&minus_dm, self.period);
        let smoothed_tr = wilder_smooth(&tr, self.period);

        let dx: Vec<Option<f64>> = (0..tr.len())
            .map(|i| {
                Some(Self::dx(
                    smoothed_plus[i]?,
                    smoothed_minus[i]?,
                    smoothed_tr[i]?,
                ))
            })
            .collect();

        let period = self.period;
        let adx = apply_to_defined(&dx, |values| wilder_smooth(values, period));

        // Movement i belongs to candle i + 1
        for (i, value) in adx.into_iter().enumerate() {
            results[i + 1] = value;
        }
        results
    }
}
