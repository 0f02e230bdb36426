//! Volume spike detector.

use super::sma::sma_series;
use super::Indicator;
use crate::types::Candle;

/// Flags candles whose volume exceeds a multiple of the recent average.
///
/// The average covers the `period` candles before the current one; the
/// current candle's own volume is not part of its baseline.
pub struct VolumeSpike {
    period: usize,
    multiplier: f64,
}

impl Default for VolumeSpike {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
        }
    }
}

impl VolumeSpike {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self { period, multiplier }
    }
}

impl Indicator for VolumeSpike {
    type Output = Vec<Option<bool>>;

    fn id(&self) -> &str {
        "vol_spike"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Self::Output {
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let averages = sma_series(&volumes, self.period);

        let mut results = vec![None; candles.len()];
        for i in 1..candles.len() {
            // Average ending at the previous candle
            if let Some(avg) = averages[i - 1] {
                results[i] = Some(volumes[i] > self.multiplier * avg);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn with_volumes(volumes: &[f64]) -> Vec<Candle> {
        let closes = vec![100.0; volumes.len()];
        candles_from_closes(&closes)
            .into_iter()
            .zip(volumes)
            .map(|(mut c, v)| {
                c.volume = *v;
                c
            })
            .collect()
    }

    #[test]
    fn test_volume_spike_insufficient_data() {
        let results = VolumeSpike::default().calculate(&with_volumes(&[100.0; 20]));
        assert!(results.iter().all(Option::is_none));
    }

    #[test]
    fn test_volume_spike_detected() {
        let mut volumes = vec![100.0; 20];
        volumes.push(201.0);
        let results = VolumeSpike::default().calculate(&with_volumes(&volumes));
        assert_eq!(results[20], Some(true));
    }

    #[test]
    fn test_volume_spike_threshold_is_strict() {
        let mut volumes = vec![100.0; 20];
        volumes.push(200.0);
        let results = VolumeSpike::default().calculate(&with_volumes(&volumes));
        assert_eq!(results[20], Some(false));
    }

    #[test]
    fn test_volume_spike_excludes_current_candle() {
        // A baseline including the current candle would be 105.25 (threshold 210.5);
        // the previous 20 candles alone give exactly 100 (threshold 200).
        let mut volumes = vec![100.0; 20];
        volumes.push(205.0);
        let results = VolumeSpike::default().calculate(&with_volumes(&volumes));
        assert_eq!(results[20], Some(true));

        // Candle 21's baseline now contains the 205 candle: 105.25, threshold 210.5
        volumes.push(208.0);
        let results = VolumeSpike::default().calculate(&with_volumes(&volumes));
        assert_eq!(results[21], Some(false));
    }

    #[test]
    fn test_volume_spike_normal_volume() {
        let results = VolumeSpike::default().calculate(&with_volumes(&[500.0; 30]));
        assert_eq!(results[29], Some(false));
    }
}
