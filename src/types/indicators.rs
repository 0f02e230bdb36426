use serde::{Deserialize, Serialize};

/// Indicator values for a single candle.
///
/// Every value is nullable: `None` means the lookback window had too little
/// history or the value was numerically undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    // Trend
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    // Momentum
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub adx: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    // Volatility
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_pos: Option<f64>,
    pub atr: Option<f64>,
    // Volume
    pub vol_spike: Option<bool>,
}

impl IndicatorSet {
    /// Round every float to `ndigits` and replace non-finite values with `None`.
    pub fn rounded(&self, ndigits: i32) -> Self {
        let r = |v: Option<f64>| clean_float(v, ndigits);
        Self {
            ema20: r(self.ema20),
            ema50: r(self.ema50),
            ema200: r(self.ema200),
            rsi: r(self.rsi),
            macd: r(self.macd),
            macd_signal: r(self.macd_signal),
            adx: r(self.adx),
            stoch_k: r(self.stoch_k),
            stoch_d: r(self.stoch_d),
            bb_upper: r(self.bb_upper),
            bb_lower: r(self.bb_lower),
            bb_pos: r(self.bb_pos),
            atr: r(self.atr),
            vol_spike: self.vol_spike,
        }
    }
}

/// Round to `ndigits` decimals, mapping NaN and infinities to `None`.
///
/// Rounds the exact binary value once, so `5.0000015` (stored just below the
/// midpoint) becomes `5.000001` at six digits.
pub fn clean_float(value: Option<f64>, ndigits: i32) -> Option<f64> {
    let v = value?;
    if !v.is_finite() {
        return None;
    }
    let digits = usize::try_from(ndigits).unwrap_or(0);
    format!("{:.*}", digits, v)
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_float_rounds() {
        assert_eq!(clean_float(Some(1.23456789), 6), Some(1.234568));
        assert_eq!(clean_float(Some(10.000000000000009), 3), Some(10.0));
    }

    #[test]
    fn test_clean_float_single_rounding() {
        assert_eq!(clean_float(Some(5.0000015), 6), Some(5.000001));
        assert_eq!(clean_float(Some(0.1234565), 6), Some(0.123456));
        assert_eq!(clean_float(Some(1.0005), 3), Some(1.0));
        assert_eq!(clean_float(Some(-66.66666666), 3), Some(-66.667));
    }

    #[test]
    fn test_clean_float_non_finite() {
        assert_eq!(clean_float(Some(f64::NAN), 6), None);
        assert_eq!(clean_float(Some(f64::INFINITY), 6), None);
        assert_eq!(clean_float(Some(f64::NEG_INFINITY), 6), None);
        assert_eq!(clean_float(None, 6), None);
    }

    #[test]
    fn test_rounded_keeps_nulls_and_flag() {
        let set = IndicatorSet {
            rsi: Some(55.1234567),
            atr: Some(f64::NAN),
            vol_spike: Some(true),
            ..Default::default()
        };
        let rounded = set.rounded(6);
        assert_eq!(rounded.rsi, Some(55.123457));
        assert_eq!(rounded.atr, None);
        assert_eq!(rounded.ema20, None);
        assert_eq!(rounded.vol_spike, Some(true));
    }

    #[test]
    fn test_serializes_nulls_explicitly() {
        let json = serde_json::to_value(IndicatorSet::default()).unwrap();
        assert!(json.get("ema200").unwrap().is_null());
        assert!(json.get("vol_spike").unwrap().is_null());
    }
}
