//! Rebuild the snapshot from the append-only signal log.
//!
//! Takes the newest logged row of every (symbol, timeframe), recomputes the
//! targets from its stored close/ATR/EMA200 and commits the result exactly
//! like a live run.

use crate::error::Result;
use crate::services::runner::{log_changes, VALUE_DIGITS};
use crate::services::signals::targets;
use crate::services::snapshot::SnapshotStore;
use crate::types::{
    clean_float, snapshot_key, BbBreakout, EmaTrend, IndicatorSet, RunReport, ScoreResult, Signal,
    SnapshotItem,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const LOG_SOURCE: &str = "signal-log-csv";

/// A signal log row as written, every column optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogRow {
    timestamp_utc: Option<String>,
    exchange: Option<String>,
    #[serde(alias = "symbol")]
    symbol_requested: Option<String>,
    symbol_used: Option<String>,
    timeframe: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    ema20: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    ema50: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    ema200: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    rsi: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    stoch_k: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    stoch_d: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    macd: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    macd_signal: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    adx: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    atr: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    bb_pos: Option<f64>,
    #[serde(deserialize_with = "lenient_bool")]
    vol_spike: bool,
    ema_trend: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    bb_breakout: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    score: Option<f64>,
    signal: Option<String>,
}

/// TRUE/1/T/Y/YES in any case is true; anything else is false.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(matches!(
        raw.trim().to_uppercase().as_str(),
        "TRUE" | "1" | "T" | "Y" | "YES"
    ))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A row that passed normalization.
struct LogEntry {
    timestamp: DateTime<Utc>,
    symbol_key: String,
    timeframe: String,
    row: RawLogRow,
}

fn normalize(mut row: RawLogRow) -> Option<LogEntry> {
    let timestamp = parse_timestamp(row.timestamp_utc.as_deref()?)?;
    let timeframe = non_empty(row.timeframe.take())?;
    row.symbol_used = non_empty(row.symbol_used.take());
    row.symbol_requested = non_empty(row.symbol_requested.take());
    let symbol_key = row
        .symbol_used
        .clone()
        .or_else(|| row.symbol_requested.clone())?;
    Some(LogEntry {
        timestamp,
        symbol_key,
        timeframe,
        row,
    })
}

fn to_item(entry: LogEntry) -> Option<SnapshotItem> {
    let LogEntry {
        timestamp,
        symbol_key,
        timeframe,
        row,
    } = entry;

    let score = row
        .score
        .filter(|s| s.is_finite())
        .and_then(|s| i32::try_from(s.round() as i64).ok())?;
    let signal = row.signal.as_deref().and_then(Signal::parse)?;

    let r = |v: Option<f64>| clean_float(v, VALUE_DIGITS);
    let close = r(row.close);
    let indicators = IndicatorSet {
        ema20: r(row.ema20),
        ema50: r(row.ema50),
        ema200: r(row.ema200),
        rsi: r(row.rsi),
        macd: r(row.macd),
        macd_signal: r(row.macd_signal),
        adx: r(row.adx),
        stoch_k: r(row.stoch_k),
        stoch_d: r(row.stoch_d),
        bb_upper: None,
        bb_lower: None,
        bb_pos: r(row.bb_pos),
        atr: r(row.atr),
        vol_spike: Some(row.vol_spike),
    };
    let bb_breakout = row
        .bb_breakout
        .filter(|b| b.is_finite())
        .and_then(|b| BbBreakout::try_from(b.round() as i8).ok())
        .unwrap_or_default();
    let ema_trend = row
        .ema_trend
        .as_deref()
        .and_then(EmaTrend::parse)
        .unwrap_or(EmaTrend::Unknown);

    Some(SnapshotItem {
        timestamp,
        exchange: row.exchange.unwrap_or_default(),
        symbol_requested: row.symbol_requested.unwrap_or_else(|| symbol_key.clone()),
        targets: targets(close, indicators.atr, indicators.ema200, &timeframe),
        symbol_used: symbol_key,
        timeframe,
        close,
        indicators,
        result: ScoreResult {
            score,
            signal,
            ema_trend,
            bb_breakout,
        },
    })
}

/// Latest item per key from a signal log.
pub fn items_from_log<R: Read>(reader: R) -> Result<Vec<SnapshotItem>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    let mut dropped = 0usize;
    for record in csv_reader.deserialize::<RawLogRow>() {
        match record.ok().and_then(normalize) {
            Some(entry) => entries.push(entry),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("Dropped {} unusable log rows", dropped);
    }

    // Stable: equal timestamps keep log order, so the later row wins
    entries.sort_by_key(|e| e.timestamp);
    let mut latest: HashMap<String, LogEntry> = HashMap::new();
    for entry in entries {
        latest.insert(snapshot_key(&entry.symbol_key, &entry.timeframe), entry);
    }

    let mut items: Vec<SnapshotItem> = latest.into_values().filter_map(to_item).collect();
    items.sort_by_key(|item| item.key());
    Ok(items)
}

/// Rebuild and commit the snapshot from the signal log at `log_path`.
pub fn rebuild_from_log(log_path: &Path, store: &SnapshotStore) -> Result<RunReport> {
    let items = items_from_log(File::open(log_path)?)?;
    let previous = store.load_previous();
    let (snapshot, change_log) = store.commit(items, &previous, LOG_SOURCE)?;

    log_changes(&change_log.changes);
    info!(
        "Rebuilt snapshot from {}: {} items, {} changes",
        log_path.display(),
        snapshot.meta.rows,
        change_log.meta.count
    );

    Ok(RunReport {
        items: snapshot.meta.rows,
        changes: change_log.changes,
        skipped: Vec::new(),
    })
}
