//! ATR-based stop-loss and take-profit levels.

use crate::types::{clean_float, Targets, Timeframe};

const PRICE_DIGITS: i32 = 6;
const PCT_DIGITS: i32 = 3;

/// Compute targets for a close/ATR pair.
///
/// Only the exact labels `15m`, `1h`, `4h` and `1d` select their own row;
/// anything else, minute forms like `60` included, uses the 15m multipliers.
/// Every output is rounded and non-finite values come back as `None`.
pub fn targets(
    close: Option<f64>,
    atr: Option<f64>,
    ema200: Option<f64>,
    timeframe: &str,
) -> Targets {
    let (k_sl, k_tp1, k_tp2) = Timeframe::ALL
        .into_iter()
        .find(|tf| tf.as_str() == timeframe)
        .unwrap_or(Timeframe::FifteenMinutes)
        .atr_multipliers();

    let (sl, tp1, tp2) = match (close, atr) {
        (Some(close), Some(atr)) => (
            clean_float(Some(close - k_sl * atr), PRICE_DIGITS),
            clean_float(Some(close + k_tp1 * atr), PRICE_DIGITS),
            clean_float(Some(close + k_tp2 * atr), PRICE_DIGITS),
        ),
        _ => (None, None, None),
    };

    Targets {
        sl,
        tp1,
        tp2,
        pct_from_ema200: pct_from_ema200(close, ema200),
    }
}

/// Distance of the close from the 200 EMA in percent.
pub fn pct_from_ema200(close: Option<f64>, ema200: Option<f64>) -> Option<f64> {
    match (close, ema200) {
        (Some(close), Some(ema)) if ema != 0.0 => {
            clean_float(Some((close / ema - 1.0) * 100.0), PCT_DIGITS)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_one_hour() {
        let t = targets(Some(100.0), Some(2.0), None, "1h");
        assert_eq!(t.sl, Some(97.6));
        assert_eq!(t.tp1, Some(102.4));
        assert_eq!(t.tp2, Some(104.8));
        assert_eq!(t.pct_from_ema200, None);
    }

    #[test]
    fn test_targets_per_timeframe() {
        let t = targets(Some(100.0), Some(2.0), None, "15m");
        assert_eq!((t.sl, t.tp1, t.tp2), (Some(98.0), Some(102.0), Some(104.0)));

        let t = targets(Some(100.0), Some(2.0), None, "4h");
        assert_eq!((t.sl, t.tp1, t.tp2), (Some(97.0), Some(103.0), Some(106.0)));

        let t = targets(Some(100.0), Some(2.0), None, "1d");
        assert_eq!((t.sl, t.tp1, t.tp2), (Some(96.0), Some(104.0), Some(108.0)));
    }

    #[test]
    fn test_unknown_timeframe_uses_fifteen_minute_row() {
        let t = targets(Some(100.0), Some(2.0), None, "3w");
        assert_eq!((t.sl, t.tp1, t.tp2), (Some(98.0), Some(102.0), Some(104.0)));
    }

    #[test]
    fn test_minute_labels_use_fifteen_minute_row() {
        for label in ["60", "240", "1440", "d", "1H"] {
            let t = targets(Some(100.0), Some(2.0), None, label);
            assert_eq!(
                (t.sl, t.tp1, t.tp2),
                (Some(98.0), Some(102.0), Some(104.0)),
                "label {}",
                label
            );
        }
    }

    #[test]
    fn test_missing_inputs_null_all_levels() {
        let t = targets(None, Some(2.0), Some(90.0), "1h");
        assert_eq!((t.sl, t.tp1, t.tp2), (None, None, None));
        assert_eq!(t.pct_from_ema200, None);

        let t = targets(Some(100.0), None, Some(90.0), "1h");
        assert_eq!((t.sl, t.tp1, t.tp2), (None, None, None));
        assert!(t.pct_from_ema200.is_some());
    }

    #[test]
    fn test_non_finite_levels_become_none() {
        let t = targets(Some(100.0), Some(f64::INFINITY), None, "1h");
        assert_eq!((t.sl, t.tp1, t.tp2), (None, None, None));
    }

    #[test]
    fn test_levels_rounded_to_six_digits() {
        let t = targets(Some(1.0), Some(0.123_456_789), None, "15m");
        assert_eq!(t.sl, Some(0.876543));
        assert_eq!(t.tp1, Some(1.123457));
    }

    #[test]
    fn test_pct_from_ema200() {
        assert_eq!(pct_from_ema200(Some(110.0), Some(100.0)), Some(10.0));
        assert_eq!(pct_from_ema200(Some(99.0), Some(100.0)), Some(-1.0));
        assert_eq!(pct_from_ema200(Some(100.0), Some(300.0)), Some(-66.667));
        assert_eq!(pct_from_ema200(Some(100.0), Some(0.0)), None);
        assert_eq!(pct_from_ema200(Some(100.0), None), None);
    }
}
