//! Offline candle source backed by `{SYMBOL}_{timeframe}.csv` files.

use super::CandleSource;
use crate::error::{AppError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvCandle {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Reads candles from `timestamp,open,high,low,close,volume` files.
pub struct CsvCandleSource {
    dir: PathBuf,
}

impl CsvCandleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", symbol, timeframe.as_str()))
    }

    fn parse(&self, content: &str, limit: usize) -> Result<Vec<Candle>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut candles = Vec::new();
        for record in reader.deserialize::<CsvCandle>() {
            let row = record?;
            let Some(timestamp) = parse_timestamp(&row.timestamp) else {
                debug!("Skipping CSV candle with timestamp '{}'", row.timestamp);
                continue;
            };
            candles.push(Candle {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }
}

/// RFC 3339 or epoch milliseconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let ms: i64 = raw.parse().ok()?;
    Utc.timestamp_millis_opt(ms).single()
}

#[async_trait]
impl CandleSource for CsvCandleSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let path = self.path_for(symbol, timeframe);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::symbol_not_found(self.name(), symbol));
            }
            Err(e) => {
                return Err(AppError::source_unavailable(
                    self.name(),
                    format!("{}: {}", path.display(), e),
                ));
            }
        };
        self.parse(&content, limit)
    }
}
