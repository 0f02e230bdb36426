//! Snapshot store and change detection.
//!
//! Keeps the last evaluated state of every (symbol, timeframe) pair on disk
//! as `snapshot.json`, and the transitions found by the latest run as
//! `changes.json`. Both files are replaced whole on every commit.

use crate::error::Result;
use crate::types::{
    ChangeEvent, ChangeType, ChangesDocument, ChangesMeta, Signal, SignalScore, SnapshotDocument,
    SnapshotItem, SnapshotMeta,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SNAPSHOT_FILE: &str = "snapshot.json";
const CHANGES_FILE: &str = "changes.json";
const NOJEKYLL_FILE: &str = ".nojekyll";

/// Signal/score of every key in the previous snapshot.
pub type PreviousSnapshot = HashMap<String, SignalScore>;

/// Compare the previous run against the current items.
///
/// Keys only present in `previous` produce no event; they simply drop out of
/// the next snapshot.
pub fn diff(previous: &PreviousSnapshot, current: &BTreeMap<String, SnapshotItem>) -> Vec<ChangeEvent> {
    current
        .iter()
        .filter_map(|(key, item)| {
            let to = item.signal_score();
            match previous.get(key) {
                None => Some(ChangeEvent {
                    key: key.clone(),
                    change_type: ChangeType::New,
                    from: None,
                    to,
                }),
                Some(from) if *from != to => Some(ChangeEvent {
                    key: key.clone(),
                    change_type: ChangeType::Update,
                    from: Some(*from),
                    to,
                }),
                Some(_) => None,
            }
        })
        .collect()
}

/// Extract the signal/score map from an arbitrary JSON value.
///
/// Anything that is not `{"items": {key: {...}}}` yields an empty map.
/// Non-object and empty items are skipped, so their keys diff as `new`.
/// Unparseable fields become `None`.
pub fn parse_previous(value: &Value) -> PreviousSnapshot {
    let Some(items) = value.get("items").and_then(Value::as_object) else {
        return PreviousSnapshot::new();
    };

    items
        .iter()
        .filter_map(|(key, item)| {
            let item = item.as_object().filter(|item| !item.is_empty())?;
            let signal = item
                .get("signal")
                .and_then(Value::as_str)
                .and_then(Signal::parse);
            let score = item.get("score").and_then(|v| match v {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
                    .and_then(|i| i32::try_from(i).ok()),
                Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
                _ => None,
            });
            Some((key.clone(), SignalScore { signal, score }))
        })
        .collect()
}

/// Persistent store for the snapshot and change-log documents.
pub struct SnapshotStore {
    out_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.out_dir.join(SNAPSHOT_FILE)
    }

    pub fn changes_path(&self) -> PathBuf {
        self.out_dir.join(CHANGES_FILE)
    }

    /// Load the previous snapshot, treating any failure as "no snapshot".
    pub fn load_previous(&self) -> PreviousSnapshot {
        let path = self.snapshot_path();

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                debug!("No previous snapshot at {}: {}", path.display(), e);
                return PreviousSnapshot::new();
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring corrupt snapshot {}: {}", path.display(), e);
                return PreviousSnapshot::new();
            }
        };

        if value.get("items").and_then(Value::as_object).is_none() {
            warn!("Ignoring snapshot {} without an items map", path.display());
        }
        parse_previous(&value)
    }

    /// Diff `items` against `previous` and replace both documents.
    pub fn commit(
        &self,
        items: Vec<SnapshotItem>,
        previous: &PreviousSnapshot,
        source: &str,
    ) -> Result<(SnapshotDocument, ChangesDocument)> {
        let items: BTreeMap<String, SnapshotItem> =
            items.into_iter().map(|item| (item.key(), item)).collect();
        let changes = diff(previous, &items);
        let now = Utc::now();

        let snapshot = SnapshotDocument {
            meta: SnapshotMeta {
                generated_at_utc: now,
                source: source.to_string(),
                rows: items.len(),
            },
            items,
        };
        let change_log = ChangesDocument {
            meta: ChangesMeta {
                generated_at_utc: now,
                count: changes.len(),
            },
            changes,
        };

        fs::create_dir_all(&self.out_dir)?;
        self.touch_nojekyll();
        write_atomic(&self.snapshot_path(), &snapshot)?;
        write_atomic(&self.changes_path(), &change_log)?;
        debug!(
            "Committed {} items and {} changes to {}",
            snapshot.meta.rows,
            change_log.meta.count,
            self.out_dir.display()
        );

        Ok((snapshot, change_log))
    }

    /// Marker that lets the output directory be served as a static site as-is.
    fn touch_nojekyll(&self) {
        let marker = self.out_dir.join(NOJEKYLL_FILE);
        if marker.exists() {
            return;
        }
        if let Err(e) = fs::write(&marker, b"") {
            debug!("Could not create {}: {}", marker.display(), e);
        }
    }
}

/// Write pretty JSON to a sibling temp file, then rename over `path`.
fn write_atomic<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(data)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
