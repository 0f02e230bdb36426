//! Append-only tabular sinks: the signal log and the status log.

use crate::error::Result;
use crate::types::SnapshotItem;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// One row of the signal log. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub timestamp_utc: String,
    pub timestamp_local: String,
    pub exchange: String,
    pub symbol_requested: String,
    pub symbol_used: String,
    pub timeframe: String,
    pub close: Option<f64>,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub adx: Option<f64>,
    pub atr: Option<f64>,
    pub bb_pos: Option<f64>,
    pub vol_spike: Option<bool>,
    pub ema_trend: String,
    pub bb_breakout: i8,
    pub score: i32,
    pub signal: String,
}

impl LogRow {
    pub fn from_item(item: &SnapshotItem) -> Self {
        let ind = &item.indicators;
        Self {
            timestamp_utc: format_utc(&item.timestamp),
            timestamp_local: item
                .timestamp
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            exchange: item.exchange.clone(),
            symbol_requested: item.symbol_requested.clone(),
            symbol_used: item.symbol_used.clone(),
            timeframe: item.timeframe.clone(),
            close: item.close,
            ema20: ind.ema20,
            ema50: ind.ema50,
            ema200: ind.ema200,
            rsi: ind.rsi,
            stoch_k: ind.stoch_k,
            stoch_d: ind.stoch_d,
            macd: ind.macd,
            macd_signal: ind.macd_signal,
            adx: ind.adx,
            atr: ind.atr,
            bb_pos: ind.bb_pos,
            vol_spike: ind.vol_spike,
            ema_trend: item.result.ema_trend.label().to_string(),
            bb_breakout: item.result.bb_breakout.into(),
            score: item.result.score,
            signal: item.result.signal.label().to_string(),
        }
    }
}

pub fn format_utc(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Destination for per-run signal rows.
pub trait RowSink: Send + Sync {
    fn name(&self) -> &str;

    /// Fail early when the sink cannot be written.
    fn check(&self) -> Result<()> {
        Ok(())
    }

    fn append(&self, items: &[SnapshotItem]) -> Result<usize>;
}

/// Signal log as an append-only CSV file.
pub struct CsvRowSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvRowSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvRowSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn check(&self) -> Result<()> {
        open_append(&self.path).map(|_| ())
    }

    fn append(&self, items: &[SnapshotItem]) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let file = open_append(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        for item in items {
            writer.serialize(LogRow::from_item(item))?;
        }
        writer.flush()?;

        debug!("Appended {} rows to {}", items.len(), self.path.display());
        Ok(items.len())
    }
}

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    timestamp: String,
    component: &'a str,
    message: &'a str,
}

/// Non-fatal warnings, logged and optionally appended to a CSV file.
pub struct StatusLog {
    path: Option<PathBuf>,
    lock: Mutex<()>,
}

impl StatusLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Log-only status sink.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn record(&self, component: &str, message: &str) {
        warn!(component, "{}", message);

        let Some(path) = &self.path else { return };
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = Self::write_row(path, component, message) {
            warn!("Failed to write status log {}: {}", path.display(), e);
        }
    }

    fn write_row(path: &Path, component: &str, message: &str) -> Result<()> {
        let file = open_append(path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(StatusRow {
            timestamp: format_utc(&Utc::now()),
            component,
            message,
        })?;
        writer.flush()?;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
