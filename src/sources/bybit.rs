use super::{describe_failure, http_client, parse_millis, parse_ohlcv_row, CandleSource};
use crate::error::{AppError, Result};
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const BYBIT_API_URL: &str = "https://api.bybit.com/v5";
const MAX_LIMIT: usize = 1000;

/// Bybit v5 envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitResponse {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: Option<BybitKlineResult>,
}

#[derive(Debug, Deserialize)]
struct BybitKlineResult {
    #[serde(default)]
    list: Vec<Value>,
}

/// Bybit linear perpetual klines client.
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BybitClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: BYBIT_API_URL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::FifteenMinutes => "15",
            Timeframe::OneHour => "60",
            Timeframe::FourHours => "240",
            Timeframe::OneDay => "D",
        }
    }

    /// Rows come newest first as `[start, open, high, low, close, volume, turnover]`.
    fn parse_response(&self, symbol: &str, response: BybitResponse) -> Result<Vec<Candle>> {
        if response.ret_code != 0 {
            if response.ret_msg.to_lowercase().contains("symbol") {
                return Err(AppError::symbol_not_found(self.name(), symbol));
            }
            return Err(AppError::source_unavailable(
                self.name(),
                format!("retCode {}: {}", response.ret_code, response.ret_msg),
            ));
        }

        let rows = response.result.map(|r| r.list).unwrap_or_default();
        Ok(rows
            .iter()
            .filter_map(|row| parse_ohlcv_row(row, parse_millis, 5))
            .collect())
    }
}

#[async_trait]
impl CandleSource for BybitClient {
    fn name(&self) -> &str {
        "bybit"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/market/kline", self.base_url);
        let limit = limit.clamp(1, MAX_LIMIT).to_string();

        let mut request = self.client.get(&url).query(&[
            ("category", "linear"),
            ("symbol", symbol),
            ("interval", Self::interval(timeframe)),
            ("limit", limit.as_str()),
        ]);
        if let Some(ref key) = self.api_key {
            request = request.header("X-BAPI-API-KEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(self.name(), e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::source_unavailable(
                self.name(),
                describe_failure(response).await,
            ));
        }

        let body: BybitResponse = response
            .json()
            .await
            .map_err(|e| AppError::source_unavailable(self.name(), e.to_string()))?;
        let candles = self.parse_response(symbol, body)?;

        debug!("Bybit {} {}: {} candles", symbol, timeframe, candles.len());
        Ok(candles)
    }
}
