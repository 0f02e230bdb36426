//! One scanner run: fetch, evaluate, log, diff and commit.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::fetcher::{CandleFetcher, FetchPolicy};
use crate::services::signals::{score, targets, IndicatorPipeline};
use crate::services::sinks::{CsvRowSink, RowSink, StatusLog};
use crate::services::snapshot::SnapshotStore;
use crate::sources::{build_sources, CandleSource};
use crate::types::{
    clean_float, CandleSeries, ChangeEvent, ChangeType, RunReport, SignalScore, SnapshotItem,
    Timeframe,
};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Decimal places kept for prices and indicator values.
pub const VALUE_DIGITS: i32 = 6;
/// Change events echoed to the log after a run.
const LOGGED_CHANGES: usize = 12;
const LIVE_SOURCE: &str = "live";

/// Assemble a snapshot item from the latest candle of a series.
pub fn evaluate_series(
    symbol_requested: &str,
    symbol_used: &str,
    exchange: &str,
    series: &CandleSeries,
) -> Option<SnapshotItem> {
    let frame = IndicatorPipeline::new().compute(series);
    let latest = frame.latest()?;
    let ind = latest.indicators;
    let close = Some(latest.close);
    let timeframe = series.timeframe.as_str();

    Some(SnapshotItem {
        timestamp: latest.timestamp,
        exchange: exchange.to_string(),
        symbol_requested: symbol_requested.to_string(),
        symbol_used: symbol_used.to_string(),
        timeframe: timeframe.to_string(),
        close: clean_float(close, VALUE_DIGITS),
        indicators: ind.rounded(VALUE_DIGITS),
        result: score(close, &ind),
        targets: targets(close, ind.atr, ind.ema200, timeframe),
    })
}

/// Log the first change events as `key: type from -> to`.
pub fn log_changes(changes: &[ChangeEvent]) {
    fn describe(state: &SignalScore) -> String {
        let signal = state.signal.map(|s| s.label()).unwrap_or("-");
        match state.score {
            Some(score) => format!("{}({})", signal, score),
            None => signal.to_string(),
        }
    }

    for change in changes.iter().take(LOGGED_CHANGES) {
        let from = change
            .from
            .as_ref()
            .map(describe)
            .unwrap_or_else(|| "-".to_string());
        let kind = match change.change_type {
            ChangeType::New => "new",
            ChangeType::Update => "update",
        };
        info!(
            "{}: {} {} -> {}",
            change.key,
            kind,
            from,
            describe(&change.to)
        );
    }
    if changes.len() > LOGGED_CHANGES {
        info!("... and {} more changes", changes.len() - LOGGED_CHANGES);
    }
}

/// Drives scanner runs over every configured (symbol, timeframe) pair.
pub struct SignalRunner {
    config: Config,
    fetcher: CandleFetcher,
    sink: Arc<dyn RowSink>,
    store: SnapshotStore,
}

impl SignalRunner {
    /// Build the runner from configuration, with the configured sources and sinks.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let sources = build_sources(&config);
        let sink: Arc<dyn RowSink> = Arc::new(CsvRowSink::new(config.signal_log_path.clone()));
        let status = Arc::new(StatusLog::new(config.status_log_path.clone()));
        let store = SnapshotStore::new(config.out_dir.clone());
        Self::with_parts(config, sources, sink, store, status)
    }

    /// Build the runner around explicit collaborators.
    pub fn with_parts(
        config: Config,
        sources: Vec<Arc<dyn CandleSource>>,
        sink: Arc<dyn RowSink>,
        store: SnapshotStore,
        status: Arc<StatusLog>,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(AppError::Startup("no candle sources configured".to_string()));
        }
        sink.check().map_err(|e| {
            AppError::Startup(format!("signal log sink '{}' unavailable: {}", sink.name(), e))
        })?;

        let policy = FetchPolicy {
            retries: config.fetch_retries,
            backoff: Duration::from_millis(config.fetch_backoff_ms),
            timeout: Duration::from_secs(config.fetch_timeout_secs),
        };

        Ok(Self {
            fetcher: CandleFetcher::new(sources, policy, status),
            config,
            sink,
            store,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn fetcher(&self) -> &CandleFetcher {
        &self.fetcher
    }

    /// Evaluate every pair once and persist the results.
    pub async fn run_once(&self) -> Result<RunReport> {
        let previous = self.store.load_previous();
        let pairs: Vec<(String, Timeframe)> = self
            .config
            .symbols
            .iter()
            .flat_map(|symbol| {
                self.config
                    .parsed_timeframes()
                    .into_iter()
                    .map(move |tf| (symbol.clone(), tf))
            })
            .collect();
        info!(
            "Scanning {} pairs ({} previous keys)",
            pairs.len(),
            previous.len()
        );

        let limit = self.config.candles;
        let fetcher = &self.fetcher;
        let results: Vec<_> = stream::iter(pairs)
            .map(|(symbol, timeframe)| async move {
                let fetched = fetcher.fetch(&symbol, timeframe, limit).await;
                (symbol, timeframe, fetched)
            })
            .buffer_unordered(self.config.max_concurrent_pairs.max(1))
            .collect()
            .await;

        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for (symbol, timeframe, fetched) in results {
            let item = fetched.and_then(|f| {
                evaluate_series(&symbol, &f.symbol_used, &f.source, &f.series)
            });
            match item {
                Some(item) => {
                    debug!(
                        "{}: {} score {} via {}",
                        item.key(),
                        item.result.signal,
                        item.result.score,
                        item.exchange
                    );
                    items.push(item);
                }
                None => {
                    warn!("Skipping {} {}: no candles", symbol, timeframe);
                    skipped.push((symbol, timeframe.as_str().to_string()));
                }
            }
        }
        items.sort_by_key(|item| item.key());
        skipped.sort();

        self.sink.append(&items)?;
        let (snapshot, change_log) = self.store.commit(items, &previous, LIVE_SOURCE)?;

        log_changes(&change_log.changes);
        self.fetcher.log_stats();
        info!(
            "Run complete: {} items, {} changes, {} skipped",
            snapshot.meta.rows,
            change_log.meta.count,
            skipped.len()
        );

        Ok(RunReport {
            items: snapshot.meta.rows,
            changes: change_log.changes,
            skipped,
        })
    }

    /// Run forever, one run per interval. Failed runs are logged.
    pub async fn watch(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Run failed: {}", e);
            }
        }
    }
}
