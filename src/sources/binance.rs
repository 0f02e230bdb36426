use super::{http_client, parse_millis, parse_ohlcv_row, CandleSource};
use crate::error::{AppError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
const MAX_LIMIT: usize = 1000;
/// Binance error code for an unknown trading pair.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Binance spot klines client.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BinanceClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: BINANCE_API_URL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
        }
    }
}

/// Parse a klines array. Rows that fail to parse are skipped.
fn parse_klines(body: &Value) -> Option<Vec<Candle>> {
    let rows = body.as_array()?;
    Some(
        rows.iter()
            .filter_map(|row| parse_ohlcv_row(row, parse_millis, 5))
            .collect(),
    )
}

#[async_trait]
impl CandleSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/klines", self.base_url);
        let limit = limit.clamp(1, MAX_LIMIT).to_string();

        let mut request = self.client.get(&url).query(&[
            ("symbol", symbol),
            ("interval", Self::interval(timeframe)),
            ("limit", limit.as_str()),
        ]);
        if let Some(ref key) = self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(self.name(), e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("code").and_then(Value::as_i64));
            if code == Some(INVALID_SYMBOL_CODE) {
                return Err(AppError::symbol_not_found(self.name(), symbol));
            }
            return Err(AppError::source_unavailable(
                self.name(),
                format!("HTTP {}: {}", status, text.chars().take(200).collect::<String>()),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::source_unavailable(self.name(), e.to_string()))?;
        let candles = parse_klines(&body)
            .ok_or_else(|| AppError::source_unavailable(self.name(), "unexpected klines payload"))?;

        debug!("Binance {} {}: {} candles", symbol, timeframe, candles.len());
        Ok(candles)
    }
}
