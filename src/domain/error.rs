//! Domain error types.
//!
//! Only conditions that stop an operation outright live here. Signal filters,
//! exposure limits and blacklist checks report typed rejections from their own
//! modules instead.

/// Top-level error type for tradecore.
#[derive(Debug, thiserror::Error)]
pub enum TradecoreError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("market data error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("candles for {symbol} out of order at index {index}")]
    UnorderedCandles { symbol: String, index: usize },

    #[error("invalid symbol list: {reason}")]
    Universe { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradecoreError> for std::process::ExitCode {
    fn from(err: &TradecoreError) -> Self {
        let code: u8 = match err {
            TradecoreError::Io(_) | TradecoreError::Csv(_) => 1,
            TradecoreError::ConfigParse { .. }
            | TradecoreError::ConfigInvalid { .. }
            | TradecoreError::Universe { .. } => 2,
            TradecoreError::Provider { .. } => 3,
            TradecoreError::UnorderedCandles { .. } => 4,
            TradecoreError::NoData { .. } | TradecoreError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
