//! Bollinger Bands indicator.

use super::sma::sma_series;
use super::Indicator;
use crate::types::Candle;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// Position is %B in 0-1 terms: `(close - lower) / (upper - lower)`.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    /// `None` wherever the bands have zero width.
    pub position: Vec<Option<f64>>,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Population standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerSeries;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let middle = sma_series(&closes, self.period);

        let len = closes.len();
        let mut upper = vec![None; len];
        let mut lower = vec![None; len];
        let mut position = vec![None; len];

        for i in 0..len {
            let Some(mid) = middle[i] else { continue };
            let window = &closes[(i + 1 - self.period)..=i];

            let mut std_dev = Self::std_dev(window, mid);
            // Rounding noise on a flat window counts as zero width
            if std_dev <= mid.abs() * 1e-12 {
                std_dev = 0.0;
            }

            let up = mid + self.std_dev_multiplier * std_dev;
            let low = mid - self.std_dev_multiplier * std_dev;
            upper[i] = Some(up);
            lower[i] = Some(low);

            let band_width = up - low;
            if band_width > 0.0 {
                position[i] = Some((closes[i] - low) / band_width);
            }
        }

        BollingerSeries {
            middle,
            upper,
            lower,
            position,
        }
    }
}
