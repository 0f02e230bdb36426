use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional classification of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl Signal {
    /// Score thresholds: `>= 3` buys, `<= -3` sells.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 3 => Signal::Buy,
            s if s <= -3 => Signal::Sell,
            _ => Signal::Neutral,
        }
    }

    /// Parse a logged label, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Some(Signal::Buy),
            "SELL" => Some(Signal::Sell),
            "NEUTRAL" => Some(Signal::Neutral),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordering of the 20/50/200 EMAs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmaTrend {
    Bull,
    Bear,
    Mix,
    Unknown,
}

impl EmaTrend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bull" => Some(EmaTrend::Bull),
            "bear" => Some(EmaTrend::Bear),
            "mix" => Some(EmaTrend::Mix),
            "unknown" => Some(EmaTrend::Unknown),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmaTrend::Bull => "bull",
            EmaTrend::Bear => "bear",
            EmaTrend::Mix => "mix",
            EmaTrend::Unknown => "unknown",
        }
    }
}

/// Close position relative to the Bollinger bands, serialized as -1, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum BbBreakout {
    Below,
    #[default]
    Inside,
    Above,
}

impl From<BbBreakout> for i8 {
    fn from(value: BbBreakout) -> Self {
        match value {
            BbBreakout::Below => -1,
            BbBreakout::Inside => 0,
            BbBreakout::Above => 1,
        }
    }
}

impl TryFrom<i8> for BbBreakout {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(BbBreakout::Below),
            0 => Ok(BbBreakout::Inside),
            1 => Ok(BbBreakout::Above),
            other => Err(format!("invalid bb_breakout value {}", other)),
        }
    }
}

/// Output of the scoring engine for one indicator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Sum of rule contributions, always within -7..=7.
    pub score: i32,
    pub signal: Signal,
    pub ema_trend: EmaTrend,
    pub bb_breakout: BbBreakout,
}
