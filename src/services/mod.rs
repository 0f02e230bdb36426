pub mod fetcher;
pub mod rebuild;
pub mod runner;
pub mod signals;
pub mod sinks;
pub mod snapshot;

pub use fetcher::{CandleFetcher, FetchPolicy, FetchedSeries, SourceStats};
pub use rebuild::{items_from_log, rebuild_from_log};
pub use runner::{evaluate_series, log_changes, SignalRunner};
pub use signals::{score, targets, IndicatorFrame, IndicatorPipeline};
pub use sinks::{CsvRowSink, LogRow, RowSink, StatusLog};
pub use snapshot::{diff, PreviousSnapshot, SnapshotStore};
