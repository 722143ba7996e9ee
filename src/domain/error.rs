//! Domain error types.

/// Top-level error type for signalbench.
#[derive(Debug, thiserror::Error)]
pub enum SignalbenchError {
    #[error("data length mismatch: candles={candles}, signals={signals}")]
    LengthMismatch { candles: usize, signals: usize },

    #[error(
        "invalid signal values found: {{{}}}; valid values are: {{BUY, SELL, HOLD}}",
        .invalid.join(", ")
    )]
    InvalidSignal { invalid: Vec<String> },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("strategy {name} produced {got} signals for {expected} candles")]
    SignalShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("no data for {symbol} at {timeframe}")]
    NoData { symbol: String, timeframe: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("http error fetching {symbol}: {reason}")]
    Http { symbol: String, reason: String },

    #[error("cache error: {reason}")]
    Cache { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignalbenchError> for std::process::ExitCode {
    fn from(err: &SignalbenchError) -> Self {
        let code: u8 = match err {
            SignalbenchError::Io(_) => 1,
            SignalbenchError::ConfigParse { .. }
            | SignalbenchError::ConfigInvalid { .. } => 2,
            SignalbenchError::Http { .. } | SignalbenchError::Cache { .. } => 3,
            SignalbenchError::LengthMismatch { .. }
            | SignalbenchError::InvalidSignal { .. }
            | SignalbenchError::SignalShapeMismatch { .. }
            | SignalbenchError::UnknownStrategy { .. } => 4,
            SignalbenchError::NoData { .. } | SignalbenchError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
