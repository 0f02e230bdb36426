//! End-to-end indicator pipeline and scoring tests on synthetic series.

use chrono::{TimeZone, Utc};
use signal_watch::services::signals::{score, IndicatorPipeline};
use signal_watch::{evaluate_series, Candle, CandleSeries, EmaTrend, Signal, Timeframe};

/// Zig-zag trend: +2 on odd candles, -1 on even ones, 1.0 bar range.
fn zigzag(count: usize, rising: bool) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let step = 0.5 * i as f64 + 1.5 * (i % 2) as f64;
            let close = if rising { 100.0 + step } else { 300.0 - step };
            Candle {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3600, 0).unwrap(),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

fn series(candles: Vec<Candle>) -> CandleSeries {
    CandleSeries::from_unordered("BTCUSDT", Timeframe::OneHour, candles)
}

// =============================================================================
// Uptrend
// =============================================================================

#[test]
fn test_uptrend_scores_buy() {
    let s = series(zigzag(300, true));
    let set = IndicatorPipeline::new().compute_latest(&s);

    // Smoothed TR 2.0, +DM 1.0, -DM 0.5 => DX 33.3
    let adx = set.adx.unwrap();
    assert!((adx - 100.0 / 3.0).abs() < 0.5, "adx = {}", adx);
    // Wilder averages settle at gain 28/27 and loss 13/27 after an up-step
    let rsi = set.rsi.unwrap();
    assert!((rsi - 68.29).abs() < 0.1, "rsi = {}", rsi);
    assert!(set.macd.unwrap() > set.macd_signal.unwrap());
    assert!(251.0 < set.bb_upper.unwrap());
    assert_eq!(set.vol_spike, Some(false));

    let result = score(Some(251.0), &set);
    assert_eq!(result.score, 4);
    assert_eq!(result.signal, Signal::Buy);
    assert_eq!(result.ema_trend, EmaTrend::Bull);
}

#[test]
fn test_uptrend_item() {
    let s = series(zigzag(300, true));
    let item = evaluate_series("BTCUSDT", "BTCUSDT", "csv", &s).unwrap();

    assert_eq!(item.key(), "BTCUSDT|1h");
    assert_eq!(item.close, Some(251.0));
    assert_eq!(item.result.signal, Signal::Buy);

    // True ranges alternate 2.5 and 1.5
    let atr = item.indicators.atr.unwrap();
    assert!((atr - 2.0).abs() < 0.05, "atr = {}", atr);
    let sl = item.targets.sl.unwrap();
    let tp2 = item.targets.tp2.unwrap();
    assert!(sl < 251.0 && tp2 > item.targets.tp1.unwrap());
    assert!(item.targets.pct_from_ema200.unwrap() > 0.0);
}

// =============================================================================
// Downtrend
// =============================================================================

#[test]
fn test_downtrend_scores_sell() {
    let s = series(zigzag(300, false));
    let set = IndicatorPipeline::new().compute_latest(&s);

    let rsi = set.rsi.unwrap();
    assert!(rsi > 30.0 && rsi < 35.0, "rsi = {}", rsi);

    let result = score(Some(149.0), &set);
    assert_eq!(result.score, -4);
    assert_eq!(result.signal, Signal::Sell);
    assert_eq!(result.ema_trend, EmaTrend::Bear);
}

// =============================================================================
// Short and degenerate series
// =============================================================================

#[test]
fn test_short_series_yields_nulls_not_errors() {
    let s = series(zigzag(30, true));
    let item = evaluate_series("BTCUSDT", "BTCUSDT", "csv", &s).unwrap();

    assert!(item.indicators.ema200.is_none());
    assert!(item.indicators.ema50.is_none());
    assert!(item.indicators.ema20.is_some());
    assert_eq!(item.result.ema_trend, EmaTrend::Unknown);
    assert!(item.targets.pct_from_ema200.is_none());
    assert!(item.targets.sl.is_some());
}

#[test]
fn test_unordered_input_matches_ordered() {
    let ordered = series(zigzag(250, true));
    let mut shuffled = zigzag(250, true);
    shuffled.reverse();
    shuffled.push(shuffled[10]);
    let unordered = series(shuffled);

    let pipeline = IndicatorPipeline::new();
    assert_eq!(unordered.len(), 250);
    assert_eq!(
        pipeline.compute_latest(&ordered),
        pipeline.compute_latest(&unordered)
    );
}

#[test]
fn test_flat_series_is_neutral() {
    let flat: Vec<Candle> = (0..250)
        .map(|i| Candle {
            timestamp: Utc.timestamp_opt(1_700_000_000 + i * 900, 0).unwrap(),
            open: 2.0,
            high: 2.0,
            low: 2.0,
            close: 2.0,
            volume: 10.0,
        })
        .collect();
    let s = CandleSeries::from_unordered("FLATUSDT", Timeframe::FifteenMinutes, flat);
    let item = evaluate_series("FLATUSDT", "FLATUSDT", "csv", &s).unwrap();

    assert_eq!(item.indicators.bb_pos, None);
    assert_eq!(item.indicators.stoch_k, None);
    assert_eq!(item.indicators.adx, Some(0.0));
    assert_eq!(item.result.ema_trend, EmaTrend::Mix);
    // RSI pinned at 100 and MACD level with its signal: -1 each
    assert_eq!(item.result.score, -2);
    assert_eq!(item.result.signal, Signal::Neutral);
}
