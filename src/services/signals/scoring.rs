//! Rule-based scoring of an indicator set.
//!
//! Each rule adds a fixed integer to the score and is skipped when any of its
//! inputs is missing:
//!
//! | rule            | condition                          | points |
//! |-----------------|------------------------------------|--------|
//! | trend bias      | ema20 > ema50 > ema200             | +2     |
//! |                 | ema20 < ema50 < ema200             | -2     |
//! | MACD cross      | macd > signal, otherwise           | +1/-1  |
//! | RSI zones       | rsi < 30 / rsi > 70                | +1/-1  |
//! | trend strength  | adx > 25, sign of ema20 vs ema50   | +1/-1  |
//! | BB breakout     | close > upper / close < lower      | +1/-1  |
//! | volume spike    | spike                              | +1     |
//!
//! A score of 3 or more is a BUY, -3 or less a SELL.

use crate::types::{BbBreakout, EmaTrend, IndicatorSet, ScoreResult, Signal};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const ADX_TRENDING: f64 = 25.0;

/// Score the latest indicator set against the current close.
pub fn score(close: Option<f64>, ind: &IndicatorSet) -> ScoreResult {
    let mut score = 0;

    let ema_trend = ema_trend(ind);
    match ema_trend {
        EmaTrend::Bull => score += 2,
        EmaTrend::Bear => score -= 2,
        EmaTrend::Mix | EmaTrend::Unknown => {}
    }

    if let (Some(macd), Some(signal)) = (ind.macd, ind.macd_signal) {
        score += if macd > signal { 1 } else { -1 };
    }

    if let Some(rsi) = ind.rsi {
        if rsi < RSI_OVERSOLD {
            score += 1;
        }
        if rsi > RSI_OVERBOUGHT {
            score -= 1;
        }
    }

    if let (Some(adx), Some(ema20), Some(ema50)) = (ind.adx, ind.ema20, ind.ema50) {
        if adx > ADX_TRENDING {
            score += if ema20 > ema50 { 1 } else { -1 };
        }
    }

    let mut bb_breakout = BbBreakout::Inside;
    if let Some(close) = close {
        if let Some(upper) = ind.bb_upper {
            if close > upper {
                score += 1;
                bb_breakout = BbBreakout::Above;
            }
        }
        // Evaluated after the upper check; overwrites on the (degenerate) double hit
        if let Some(lower) = ind.bb_lower {
            if close < lower {
                score -= 1;
                bb_breakout = BbBreakout::Below;
            }
        }
    }

    if ind.vol_spike == Some(true) {
        score += 1;
    }

    ScoreResult {
        score,
        signal: Signal::from_score(score),
        ema_trend,
        bb_breakout,
    }
}

/// Ordering of the three EMAs, `Unknown` when any is missing.
pub fn ema_trend(ind: &IndicatorSet) -> EmaTrend {
    match (ind.ema20, ind.ema50, ind.ema200) {
        (Some(e20), Some(e50), Some(e200)) => {
            if e20 > e50 && e50 > e200 {
                EmaTrend::Bull
            } else if e20 < e50 && e50 < e200 {
                EmaTrend::Bear
            } else {
                EmaTrend::Mix
            }
        }
        _ => EmaTrend::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bull_set() -> IndicatorSet {
        IndicatorSet {
            ema20: Some(110.0),
            ema50: Some(105.0),
            ema200: Some(100.0),
            rsi: Some(50.0),
            macd: Some(1.5),
            macd_signal: Some(1.0),
            adx: Some(30.0),
            stoch_k: Some(60.0),
            stoch_d: Some(55.0),
            bb_upper: Some(120.0),
            bb_lower: Some(100.0),
            bb_pos: Some(0.5),
            atr: Some(2.0),
            vol_spike: Some(false),
        }
    }

    // =========================================================================
    // Individual rules
    // =========================================================================

    #[test]
    fn test_empty_set_scores_zero() {
        let result = score(None, &IndicatorSet::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.signal, Signal::Neutral);
        assert_eq!(result.ema_trend, EmaTrend::Unknown);
        assert_eq!(result.bb_breakout, BbBreakout::Inside);
    }

    #[test]
    fn test_trend_bias() {
        let bull = IndicatorSet {
            ema20: Some(3.0),
            ema50: Some(2.0),
            ema200: Some(1.0),
            ..Default::default()
        };
        assert_eq!(score(None, &bull).score, 2);

        let bear = IndicatorSet {
            ema20: Some(1.0),
            ema50: Some(2.0),
            ema200: Some(3.0),
            ..Default::default()
        };
        assert_eq!(score(None, &bear).score, -2);

        let mix = IndicatorSet {
            ema20: Some(3.0),
            ema50: Some(1.0),
            ema200: Some(2.0),
            ..Default::default()
        };
        let result = score(None, &mix);
        assert_eq!(result.score, 0);
        assert_eq!(result.ema_trend, EmaTrend::Mix);
    }

    #[test]
    fn test_trend_equal_emas_is_mix() {
        let set = IndicatorSet {
            ema20: Some(2.0),
            ema50: Some(2.0),
            ema200: Some(1.0),
            ..Default::default()
        };
        assert_eq!(ema_trend(&set), EmaTrend::Mix);
    }

    #[test]
    fn test_macd_cross_has_no_neutral_branch() {
        let equal = IndicatorSet {
            macd: Some(1.0),
            macd_signal: Some(1.0),
            ..Default::default()
        };
        assert_eq!(score(None, &equal).score, -1);

        let above = IndicatorSet {
            macd: Some(1.1),
            macd_signal: Some(1.0),
            ..Default::default()
        };
        assert_eq!(score(None, &above).score, 1);

        let missing_signal = IndicatorSet {
            macd: Some(1.1),
            ..Default::default()
        };
        assert_eq!(score(None, &missing_signal).score, 0);
    }

    #[test]
    fn test_rsi_zones() {
        let rsi = |v: f64| IndicatorSet {
            rsi: Some(v),
            ..Default::default()
        };
        assert_eq!(score(None, &rsi(29.9)).score, 1);
        assert_eq!(score(None, &rsi(30.0)).score, 0);
        assert_eq!(score(None, &rsi(70.0)).score, 0);
        assert_eq!(score(None, &rsi(70.1)).score, -1);
    }

    #[test]
    fn test_trend_strength_gate() {
        let set = |adx: f64, ema20: f64, ema50: f64| IndicatorSet {
            adx: Some(adx),
            ema20: Some(ema20),
            ema50: Some(ema50),
            ..Default::default()
        };
        assert_eq!(score(None, &set(30.0, 2.0, 1.0)).score, 1);
        assert_eq!(score(None, &set(30.0, 1.0, 2.0)).score, -1);
        assert_eq!(score(None, &set(30.0, 1.0, 1.0)).score, -1);
        assert_eq!(score(None, &set(25.0, 2.0, 1.0)).score, 0);

        let no_ema = IndicatorSet {
            adx: Some(40.0),
            ..Default::default()
        };
        assert_eq!(score(None, &no_ema).score, 0);
    }

    #[test]
    fn test_bollinger_breakout() {
        let bands = IndicatorSet {
            bb_upper: Some(110.0),
            bb_lower: Some(90.0),
            ..Default::default()
        };

        let above = score(Some(111.0), &bands);
        assert_eq!(above.score, 1);
        assert_eq!(above.bb_breakout, BbBreakout::Above);

        let below = score(Some(89.0), &bands);
        assert_eq!(below.score, -1);
        assert_eq!(below.bb_breakout, BbBreakout::Below);

        let inside = score(Some(110.0), &bands);
        assert_eq!(inside.score, 0);
        assert_eq!(inside.bb_breakout, BbBreakout::Inside);

        let no_close = score(None, &bands);
        assert_eq!(no_close.bb_breakout, BbBreakout::Inside);
    }

    #[test]
    fn test_bollinger_inverted_bands_lower_wins() {
        // Not reachable from the pipeline, but the check order is fixed
        let inverted = IndicatorSet {
            bb_upper: Some(90.0),
            bb_lower: Some(110.0),
            ..Default::default()
        };
        let result = score(Some(100.0), &inverted);
        assert_eq!(result.score, 0);
        assert_eq!(result.bb_breakout, BbBreakout::Below);
    }

    #[test]
    fn test_volume_spike() {
        let spike = IndicatorSet {
            vol_spike: Some(true),
            ..Default::default()
        };
        assert_eq!(score(None, &spike).score, 1);

        let quiet = IndicatorSet {
            vol_spike: Some(false),
            ..Default::default()
        };
        assert_eq!(score(None, &quiet).score, 0);
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_clear_uptrend_scores_four() {
        // 2 (trend) + 1 (macd) + 0 (rsi) + 1 (adx) + 0 (bands) + 0 (volume)
        let result = score(Some(110.0), &bull_set());
        assert_eq!(result.score, 4);
        assert_eq!(result.signal, Signal::Buy);
        assert_eq!(result.ema_trend, EmaTrend::Bull);
    }

    #[test]
    fn test_boundary_scores() {
        // trend +2 alone
        let two = IndicatorSet {
            ema20: Some(3.0),
            ema50: Some(2.0),
            ema200: Some(1.0),
            ..Default::default()
        };
        assert_eq!(score(None, &two).signal, Signal::Neutral);

        let three = IndicatorSet {
            vol_spike: Some(true),
            ..two
        };
        let result = score(None, &three);
        assert_eq!(result.score, 3);
        assert_eq!(result.signal, Signal::Buy);

        let minus_two = IndicatorSet {
            ema20: Some(1.0),
            ema50: Some(2.0),
            ema200: Some(3.0),
            ..Default::default()
        };
        let result = score(None, &minus_two);
        assert_eq!(result.score, -2);
        assert_eq!(result.signal, Signal::Neutral);

        let minus_three = IndicatorSet {
            macd: Some(0.0),
            macd_signal: Some(1.0),
            ..minus_two
        };
        let result = score(None, &minus_three);
        assert_eq!(result.score, -3);
        assert_eq!(result.signal, Signal::Sell);
    }

    #[test]
    fn test_maximum_score() {
        let set = IndicatorSet {
            rsi: Some(20.0),
            vol_spike: Some(true),
            ..bull_set()
        };
        assert_eq!(score(Some(130.0), &set).score, 7);
    }

    #[test]
    fn test_minimum_score() {
        let set = IndicatorSet {
            ema20: Some(90.0),
            ema50: Some(95.0),
            ema200: Some(100.0),
            macd: Some(-1.0),
            macd_signal: Some(0.0),
            rsi: Some(80.0),
            adx: Some(40.0),
            bb_upper: Some(100.0),
            bb_lower: Some(95.0),
            vol_spike: Some(false),
            ..Default::default()
        };
        assert_eq!(score(Some(80.0), &set).score, -6);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let set = bull_set();
        let first = score(Some(110.0), &set);
        for _ in 0..5 {
            assert_eq!(score(Some(110.0), &set), first);
        }
    }
}
