use crate::error::{AppError, Result};
use crate::sources::SourceKind;
use crate::types::Timeframe;
use std::env;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Requested symbols, e.g. `BTCUSDT`.
    pub symbols: Vec<String>,
    /// Requested timeframes as written (`15m`, `1h`, ...).
    pub timeframes: Vec<String>,
    /// Candles requested per pair.
    pub candles: usize,
    /// Candle sources in priority order.
    pub sources: Vec<String>,
    /// Directory read by the `csv` candle source.
    pub candle_csv_dir: PathBuf,
    /// Attempts per source per pair.
    pub fetch_retries: u32,
    /// Base backoff between attempts (ms), multiplied by the attempt number.
    pub fetch_backoff_ms: u64,
    /// Per-call timeout for candle fetches (seconds).
    pub fetch_timeout_secs: u64,
    /// Pairs evaluated concurrently.
    pub max_concurrent_pairs: usize,
    /// Directory for `snapshot.json` and `changes.json`.
    pub out_dir: PathBuf,
    /// Append-only signal log.
    pub signal_log_path: PathBuf,
    /// Optional append-only status log.
    pub status_log_path: Option<PathBuf>,
    /// Period of the watch loop (seconds).
    pub run_interval_secs: u64,
    /// Binance API key (optional, public endpoints work without).
    pub binance_api_key: Option<String>,
    /// Bybit API key (optional).
    pub bybit_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let list = |key: &str, default: &str| -> Vec<String> {
            lookup(key)
                .unwrap_or_else(|| default.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            symbols: list("SYMBOLS", "BTCUSDT,ETHUSDT")
                .into_iter()
                .map(|s| s.to_uppercase())
                .collect(),
            timeframes: list("TIMEFRAMES", "15m,1h,4h,1d"),
            candles: lookup("CANDLES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            sources: list("CANDLE_SOURCES", "binance,bybit,kraken")
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
            candle_csv_dir: lookup("CANDLE_CSV_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/candles")),
            fetch_retries: lookup("FETCH_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            fetch_backoff_ms: lookup("FETCH_BACKOFF_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(750),
            fetch_timeout_secs: lookup("FETCH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            max_concurrent_pairs: lookup("MAX_CONCURRENT_PAIRS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            out_dir: lookup("OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("docs")),
            signal_log_path: lookup("SIGNAL_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/signals.csv")),
            status_log_path: optional("STATUS_LOG_PATH").map(PathBuf::from),
            run_interval_secs: lookup("RUN_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            binance_api_key: optional("BINANCE_API_KEY"),
            bybit_api_key: optional("BYBIT_API_KEY"),
        }
    }

    /// Reject a configuration the scanner cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(AppError::Config("SYMBOLS is empty".to_string()));
        }
        if self.timeframes.is_empty() {
            return Err(AppError::Config("TIMEFRAMES is empty".to_string()));
        }
        if let Some(bad) = self.timeframes.iter().find(|t| Timeframe::parse(t).is_none()) {
            return Err(AppError::Config(format!("unknown timeframe '{}'", bad)));
        }
        if self.sources.is_empty() {
            return Err(AppError::Config("CANDLE_SOURCES is empty".to_string()));
        }
        if let Some(bad) = self.sources.iter().find(|s| SourceKind::parse(s).is_none()) {
            return Err(AppError::Config(format!("unknown candle source '{}'", bad)));
        }
        if self.candles == 0 {
            return Err(AppError::Config("CANDLES must be at least 1".to_string()));
        }
        if self.fetch_retries == 0 {
            return Err(AppError::Config("FETCH_RETRIES must be at least 1".to_string()));
        }
        if self.max_concurrent_pairs == 0 {
            return Err(AppError::Config(
                "MAX_CONCURRENT_PAIRS must be at least 1".to_string(),
            ));
        }
        if self.signal_log_path.as_os_str().is_empty() {
            return Err(AppError::Config("SIGNAL_LOG_PATH is empty".to_string()));
        }
        Ok(())
    }

    /// Configured timeframes that parse, in configured order.
    pub fn parsed_timeframes(&self) -> Vec<Timeframe> {
        self.timeframes
            .iter()
            .filter_map(|t| Timeframe::parse(t))
            .collect()
    }

    /// Configured sources that parse, in priority order.
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources
            .iter()
            .filter_map(|s| SourceKind::parse(s))
            .collect()
    }
}
