//! Indicator pipeline: candle series in, time-aligned indicator frame out.

use super::indicators::{
    finite, Adx, Atr, BollingerBands, Ema, Indicator, Macd, Rsi, Stochastic, VolumeSpike,
};
use crate::types::{CandleSeries, IndicatorSet};
use chrono::{DateTime, Utc};

/// Indicator values for one candle of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    /// Bollinger middle band (SMA20).
    pub bb_middle: Option<f64>,
    pub indicators: IndicatorSet,
}

/// All indicator rows of a series, oldest first.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for the last candle, the one scoring consumes.
    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }
}

/// Fixed battery of indicators computed for every series.
pub struct IndicatorPipeline {
    ema20: Ema,
    ema50: Ema,
    ema200: Ema,
    rsi: Rsi,
    macd: Macd,
    adx: Adx,
    stochastic: Stochastic,
    bollinger: BollingerBands,
    atr: Atr,
    volume: VolumeSpike,
}

impl Default for IndicatorPipeline {
    fn default() -> Self {
        Self {
            ema20: Ema::new(20),
            ema50: Ema::new(50),
            ema200: Ema::new(200),
            rsi: Rsi::default(),
            macd: Macd::default(),
            adx: Adx::default(),
            stochastic: Stochastic::default(),
            bollinger: BollingerBands::default(),
            atr: Atr::default(),
            volume: VolumeSpike::default(),
        }
    }
}

impl IndicatorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candles needed before every indicator is defined.
    pub fn min_periods(&self) -> usize {
        [
            self.ema20.min_periods(),
            self.ema50.min_periods(),
            self.ema200.min_periods(),
            self.rsi.min_periods(),
            self.macd.min_periods(),
            self.adx.min_periods(),
            self.stochastic.min_periods(),
            self.bollinger.min_periods(),
            self.atr.min_periods(),
            self.volume.min_periods(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Compute every indicator for every candle.
    ///
    /// Short series degrade to `None` values; non-finite results are dropped.
    pub fn compute(&self, series: &CandleSeries) -> IndicatorFrame {
        let candles = series.candles();

        let ema20 = self.ema20.calculate(candles);
        let ema50 = self.ema50.calculate(candles);
        let ema200 = self.ema200.calculate(candles);
        let rsi = self.rsi.calculate(candles);
        let macd = self.macd.calculate(candles);
        let adx = self.adx.calculate(candles);
        let stoch = self.stochastic.calculate(candles);
        let bands = self.bollinger.calculate(candles);
        let atr = self.atr.calculate(candles);
        let vol_spike = self.volume.calculate(candles);

        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| IndicatorRow {
                timestamp: candle.timestamp,
                close: candle.close,
                bb_middle: finite(bands.middle[i]),
                indicators: IndicatorSet {
                    ema20: finite(ema20[i]),
                    ema50: finite(ema50[i]),
                    ema200: finite(ema200[i]),
                    rsi: finite(rsi[i]),
                    macd: finite(macd.macd[i]),
                    macd_signal: finite(macd.signal[i]),
                    adx: finite(adx[i]),
                    stoch_k: finite(stoch.k[i]),
                    stoch_d: finite(stoch.d[i]),
                    bb_upper: finite(bands.upper[i]),
                    bb_lower: finite(bands.lower[i]),
                    bb_pos: finite(bands.position[i]),
                    atr: finite(atr[i]),
                    vol_spike: vol_spike[i],
                },
            })
            .collect();

        IndicatorFrame { rows }
    }

    /// Indicator set of the last candle, empty for an empty series.
    pub fn compute_latest(&self, series: &CandleSeries) -> IndicatorSet {
        self.compute(series)
            .latest()
            .map(|row| row.indicators)
            .unwrap_or_default()
    }
}
