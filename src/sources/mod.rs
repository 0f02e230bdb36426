//! Candle sources: public exchange kline endpoints and local CSV files.

pub mod binance;
pub mod bybit;
pub mod csv_file;
pub mod kraken;

pub use binance::BinanceClient;
pub use bybit::BybitClient;
pub use csv_file::CsvCandleSource;
pub use kraken::KrakenClient;

use crate::config::Config;
use crate::error::Result;
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const USER_AGENT: &str = "signal-watch/0.1";

/// A provider of OHLCV candles.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Short lowercase name, also used as the item's `exchange`.
    fn name(&self) -> &str;

    /// Symbol as this source lists it.
    fn resolve_symbol(&self, symbol: &str) -> String {
        symbol.to_uppercase()
    }

    /// Fetch up to `limit` recent candles for an already resolved symbol.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}

/// Known candle source implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Binance,
    Bybit,
    Kraken,
    Csv,
}

impl SourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Some(SourceKind::Binance),
            "bybit" => Some(SourceKind::Bybit),
            "kraken" => Some(SourceKind::Kraken),
            "csv" => Some(SourceKind::Csv),
            _ => None,
        }
    }
}

/// Instantiate the configured sources in priority order.
pub fn build_sources(config: &Config) -> Vec<Arc<dyn CandleSource>> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    config
        .source_kinds()
        .into_iter()
        .map(|kind| -> Arc<dyn CandleSource> {
            match kind {
                SourceKind::Binance => {
                    Arc::new(BinanceClient::new(config.binance_api_key.clone(), timeout))
                }
                SourceKind::Bybit => {
                    Arc::new(BybitClient::new(config.bybit_api_key.clone(), timeout))
                }
                SourceKind::Kraken => Arc::new(KrakenClient::new(timeout)),
                SourceKind::Csv => Arc::new(CsvCandleSource::new(config.candle_csv_dir.clone())),
            }
        })
        .collect()
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client, using defaults: {}", e);
            Client::new()
        })
}

/// Status line plus the start of the body, for error messages.
pub(crate) async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    format!("HTTP {}: {}", status, text.chars().take(200).collect::<String>())
}

/// Exchanges send prices either as JSON numbers or as decimal strings.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_millis(value: &Value) -> Option<DateTime<Utc>> {
    let ms = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    Utc.timestamp_millis_opt(ms).single()
}

/// Read `[time, open, high, low, close, ...]` with `volume` at `volume_idx`.
pub(crate) fn parse_ohlcv_row(
    row: &Value,
    time: impl Fn(&Value) -> Option<DateTime<Utc>>,
    volume_idx: usize,
) -> Option<Candle> {
    let fields = row.as_array()?;
    Some(Candle {
        timestamp: time(fields.first()?)?,
        open: parse_number(fields.get(1)?)?,
        high: parse_number(fields.get(2)?)?,
        low: parse_number(fields.get(3)?)?,
        close: parse_number(fields.get(4)?)?,
        volume: parse_number(fields.get(volume_idx)?)?,
    })
}

/// One-shot local HTTP endpoint for exercising the clients end to end.
#[cfg(test)]
pub(crate) mod test_server {
    use reqwest::Client;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Client that never routes through an environment proxy.
    pub fn direct_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Answer a single request with `status` and a JSON `body`.
    ///
    /// Returns the base URL and a handle resolving to the received request head.
    pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&head).into_owned()
        });

        (format!("http://{}", addr), handle)
    }
}
