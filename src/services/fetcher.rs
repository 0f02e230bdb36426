//! Candle fetching with retries and fallback across ranked sources.

use crate::error::{AppError, Result};
use crate::services::sinks::StatusLog;
use crate::sources::CandleSource;
use crate::types::{CandleSeries, Timeframe};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const STATUS_COMPONENT: &str = "fetch";

/// Retry policy applied to every source.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Attempts per source, at least 1.
    pub retries: u32,
    /// Sleep before attempt `n + 1` is `n * backoff`.
    pub backoff: Duration,
    /// Upper bound on a single fetch call.
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_millis(750),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Candles for one pair plus where they came from.
#[derive(Debug, Clone)]
pub struct FetchedSeries {
    /// Name of the source that answered.
    pub source: String,
    /// Symbol as that source lists it.
    pub symbol_used: String,
    pub series: CandleSeries,
}

/// Per-source outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub successes: u64,
    pub failures: u64,
}

/// Tries each source in priority order until one returns usable candles.
pub struct CandleFetcher {
    sources: Vec<Arc<dyn CandleSource>>,
    policy: FetchPolicy,
    status: Arc<StatusLog>,
    stats: DashMap<String, SourceStats>,
}

impl CandleFetcher {
    pub fn new(
        sources: Vec<Arc<dyn CandleSource>>,
        policy: FetchPolicy,
        status: Arc<StatusLog>,
    ) -> Self {
        Self {
            sources,
            policy: FetchPolicy {
                retries: policy.retries.max(1),
                ..policy
            },
            status,
            stats: DashMap::new(),
        }
    }

    /// Fetch a series for `symbol`, or `None` once every source has failed.
    pub async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Option<FetchedSeries> {
        for source in &self.sources {
            let resolved = source.resolve_symbol(symbol);

            match self.fetch_from(source.as_ref(), &resolved, timeframe, limit).await {
                Ok(series) => {
                    self.record(source.name(), true);
                    return Some(FetchedSeries {
                        source: source.name().to_string(),
                        symbol_used: resolved,
                        series,
                    });
                }
                Err(e) => {
                    self.record(source.name(), false);
                    self.status.record(
                        STATUS_COMPONENT,
                        &format!("{} {}: {}, trying next source", symbol, timeframe, e),
                    );
                }
            }
        }

        self.status.record(
            STATUS_COMPONENT,
            &format!("{} {}: all sources failed, skipping", symbol, timeframe),
        );
        None
    }

    /// All attempts against one source. Returns the last error on failure.
    async fn fetch_from(
        &self,
        source: &dyn CandleSource,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries> {
        let mut last_error = AppError::source_unavailable(source.name(), "no attempt made");

        for attempt in 1..=self.policy.retries {
            if attempt > 1 {
                tokio::time::sleep(self.policy.backoff * (attempt - 1)).await;
            }

            let outcome =
                tokio::time::timeout(self.policy.timeout, source.fetch_candles(symbol, timeframe, limit))
                    .await
                    .unwrap_or_else(|_| {
                        Err(AppError::Timeout {
                            source_name: source.name().to_string(),
                            secs: self.policy.timeout.as_secs(),
                        })
                    });

            match outcome {
                Ok(candles) => {
                    let series = CandleSeries::from_unordered(symbol, timeframe, candles);
                    if !series.is_empty() {
                        debug!(
                            "{} {} {}: {} candles on attempt {}",
                            source.name(),
                            symbol,
                            timeframe,
                            series.len(),
                            attempt
                        );
                        return Ok(series);
                    }
                    last_error = AppError::EmptyFetch {
                        source_name: source.name().to_string(),
                        symbol: symbol.to_string(),
                    };
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => last_error = e,
            }
            debug!(
                "{} {} {}: attempt {}/{} failed: {}",
                source.name(),
                symbol,
                timeframe,
                attempt,
                self.policy.retries,
                last_error
            );
        }

        Err(last_error)
    }

    fn record(&self, source: &str, success: bool) {
        let mut entry = self.stats.entry(source.to_string()).or_default();
        if success {
            entry.successes += 1;
        } else {
            entry.failures += 1;
        }
    }

    /// Counters for one source.
    pub fn stats(&self, source: &str) -> SourceStats {
        self.stats.get(source).map(|s| *s).unwrap_or_default()
    }

    pub fn log_stats(&self) {
        for source in &self.sources {
            let stats = self.stats(source.name());
            info!(
                "Source {}: {} ok, {} failed",
                source.name(),
                stats.successes,
                stats.failures
            );
        }
    }
}
