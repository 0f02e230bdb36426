//! signal-watch - technical-indicator signal scanner

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use services::{evaluate_series, SignalRunner, SnapshotStore};
pub use types::*;
