use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Candle timeframe supported by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    /// All supported timeframes, shortest first.
    pub const ALL: [Timeframe; 4] = [
        Timeframe::FifteenMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::OneDay,
    ];

    /// Parse a timeframe label. Accepts both `1h` style and minute counts (`60`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "15m" | "15" => Some(Timeframe::FifteenMinutes),
            "1h" | "60" => Some(Timeframe::OneHour),
            "4h" | "240" => Some(Timeframe::FourHours),
            "1d" | "1440" | "d" => Some(Timeframe::OneDay),
            _ => None,
        }
    }

    /// Canonical label, also used in snapshot keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
        }
    }

    /// Length of one candle in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::FifteenMinutes => 15,
            Timeframe::OneHour => 60,
            Timeframe::FourHours => 240,
            Timeframe::OneDay => 1440,
        }
    }

    /// ATR multipliers as (stop-loss, take-profit 1, take-profit 2).
    pub fn atr_multipliers(&self) -> (f64, f64, f64) {
        match self {
            // Scalping
            Timeframe::FifteenMinutes => (1.0, 1.0, 2.0),
            // Intraday
            Timeframe::OneHour => (1.2, 1.2, 2.4),
            // Swing
            Timeframe::FourHours => (1.5, 1.5, 3.0),
            // Macro
            Timeframe::OneDay => (2.0, 2.0, 4.0),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time of the bucket.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Prices must be finite and positive, volume finite and non-negative.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}

/// Ordered candles for one (symbol, timeframe) pair.
///
/// Timestamps are strictly increasing. Use [`CandleSeries::from_unordered`] to build
/// a series from raw exchange output.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series from candles in any order.
    ///
    /// Invalid candles are dropped and duplicate timestamps collapse to the
    /// last occurrence in the input.
    pub fn from_unordered(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Self {
        let symbol = symbol.into();
        let total = candles.len();

        // Stable sort keeps input order among equal timestamps, so the
        // later duplicate ends up last and wins the dedup below.
        let mut valid: Vec<Candle> = candles.into_iter().filter(Candle::is_valid).collect();
        let invalid = total - valid.len();
        valid.sort_by_key(|c| c.timestamp);

        let mut deduped: Vec<Candle> = Vec::with_capacity(valid.len());
        for candle in valid {
            match deduped.last_mut() {
                Some(last) if last.timestamp == candle.timestamp => *last = candle,
                _ => deduped.push(candle),
            }
        }

        if invalid > 0 || deduped.len() + invalid != total {
            debug!(
                "{} {}: kept {} of {} candles ({} invalid)",
                symbol,
                timeframe,
                deduped.len(),
                total,
                invalid
            );
        }

        Self {
            symbol,
            timeframe,
            candles: deduped,
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}
