use super::{describe_failure, http_client, parse_ohlcv_row, CandleSource};
use crate::error::{AppError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const KRAKEN_API_URL: &str = "https://api.kraken.com/0/public";

/// Kraken OHLC response.
#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    result: Option<HashMap<String, Value>>,
}

/// Kraken spot OHLC client.
#[derive(Clone)]
pub struct KrakenClient {
    client: Client,
    base_url: String,
}

impl KrakenClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: KRAKEN_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn interval(timeframe: Timeframe) -> u32 {
        timeframe.minutes()
    }

    /// Rows are `[time(s), open, high, low, close, vwap, volume, count]`,
    /// oldest first, keyed by Kraken's own pair name next to a `last` cursor.
    fn parse_response(
        &self,
        symbol: &str,
        response: KrakenResponse,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        if !response.error.is_empty() {
            if response.error.iter().any(|e| e.contains("Unknown asset pair")) {
                return Err(AppError::symbol_not_found(self.name(), symbol));
            }
            return Err(AppError::source_unavailable(
                self.name(),
                response.error.join("; "),
            ));
        }

        let Some(result) = response.result else {
            return Ok(Vec::new());
        };
        let rows = result
            .iter()
            .find(|(key, _)| key.as_str() != "last")
            .and_then(|(_, rows)| rows.as_array());
        let Some(rows) = rows else {
            warn!("Kraken OHLC result for {} has no pair entry", symbol);
            return Ok(Vec::new());
        };

        let mut candles: Vec<Candle> = rows
            .iter()
            .filter_map(|row| parse_ohlcv_row(row, parse_seconds, 6))
            .collect();
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }
}

fn parse_seconds(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    Utc.timestamp_opt(secs, 0).single()
}

#[async_trait]
impl CandleSource for KrakenClient {
    fn name(&self) -> &str {
        "kraken"
    }

    /// Kraken quotes in USD and calls bitcoin XBT: `BTCUSDT` becomes `XBTUSD`.
    fn resolve_symbol(&self, symbol: &str) -> String {
        let upper = symbol.to_uppercase();
        let quoted = match upper.strip_suffix("USDT") {
            Some(base) => format!("{}USD", base),
            None => upper,
        };
        match quoted.strip_prefix("BTC") {
            Some(rest) => format!("XBT{}", rest),
            None => quoted,
        }
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/OHLC", self.base_url);
        let interval = Self::interval(timeframe).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("pair", symbol), ("interval", interval.as_str())])
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(self.name(), e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::source_unavailable(
                self.name(),
                describe_failure(response).await,
            ));
        }

        let body: KrakenResponse = response
            .json()
            .await
            .map_err(|e| AppError::source_unavailable(self.name(), e.to_string()))?;
        let candles = self.parse_response(symbol, body, limit)?;

        debug!("Kraken {} {}: {} candles", symbol, timeframe, candles.len());
        Ok(candles)
    }
}
