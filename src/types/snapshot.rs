use crate::types::{IndicatorSet, ScoreResult, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ATR-based risk levels and distance from the long trend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Targets {
    pub sl: Option<f64>,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub pct_from_ema200: Option<f64>,
}

/// Latest evaluated state of one (symbol, timeframe) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    #[serde(rename = "timestamp_utc")]
    pub timestamp: DateTime<Utc>,
    pub exchange: String,
    pub symbol_requested: String,
    pub symbol_used: String,
    pub timeframe: String,
    pub close: Option<f64>,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
    #[serde(flatten)]
    pub result: ScoreResult,
    #[serde(flatten)]
    pub targets: Targets,
}

impl SnapshotItem {
    /// Store key, `symbol_used|timeframe`.
    pub fn key(&self) -> String {
        snapshot_key(&self.symbol_used, &self.timeframe)
    }

    pub fn signal_score(&self) -> SignalScore {
        SignalScore {
            signal: Some(self.result.signal),
            score: Some(self.result.score),
        }
    }
}

pub fn snapshot_key(symbol_used: &str, timeframe: &str) -> String {
    format!("{}|{}", symbol_used, timeframe)
}

/// The part of an item that change detection compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalScore {
    pub signal: Option<Signal>,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    New,
    Update,
}

/// A signal or score change between two runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub key: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Absent for `new` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<SignalScore>,
    pub to: SignalScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub generated_at_utc: DateTime<Utc>,
    pub source: String,
    pub rows: usize,
}

/// Full current-state document, `snapshot.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(rename = "_meta")]
    pub meta: SnapshotMeta,
    pub items: BTreeMap<String, SnapshotItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesMeta {
    pub generated_at_utc: DateTime<Utc>,
    pub count: usize,
}

/// Change log of one run, `changes.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesDocument {
    #[serde(rename = "_meta")]
    pub meta: ChangesMeta,
    pub changes: Vec<ChangeEvent>,
}

/// Summary of one scanner run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub items: usize,
    pub changes: Vec<ChangeEvent>,
    /// Pairs for which no source returned usable candles, as (symbol, timeframe).
    pub skipped: Vec<(String, String)>,
}
