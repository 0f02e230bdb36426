use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    /// A candle source could not serve the request. Retryable.
    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// The source does not list the instrument. Not retried on that source.
    #[error("{symbol} not found on {source_name}")]
    SymbolNotFound { source_name: String, symbol: String },

    #[error("{source_name} returned no usable candles for {symbol}")]
    EmptyFetch { source_name: String, symbol: String },

    #[error("{source_name} timed out after {secs}s")]
    Timeout { source_name: String, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Nothing to read from or write to. The run cannot start.
    #[error("Startup error: {0}")]
    Startup(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl AppError {
    /// Whether another attempt against the same source may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::SymbolNotFound { .. } | AppError::Config(_) | AppError::Startup(_)
        )
    }

    pub fn source_unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        AppError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn symbol_not_found(source_name: &str, symbol: &str) -> Self {
        AppError::SymbolNotFound {
            source_name: source_name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
