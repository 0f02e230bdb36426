//! Signal computation: indicators, scoring and price targets.

pub mod indicators;
pub mod pipeline;
pub mod scoring;
pub mod targets;

pub use pipeline::{IndicatorFrame, IndicatorPipeline, IndicatorRow};
pub use scoring::{ema_trend, score};
pub use targets::{pct_from_ema200, targets};
