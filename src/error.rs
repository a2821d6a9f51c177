use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaError {
    #[error("Missing klines data")]
    MissingKlines,

    #[error("Failed to process data: {0}")]
    InvalidData(String),

    #[error("Indicator error: {0}")]
    IndicatorError(String),

    #[error("Backtest error: {0}")]
    BacktestError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),
}

impl GaError {
    /// HTTP-style status code for reporting the error back to a caller.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingKlines | Self::InvalidData(_) | Self::Serde(_) => 400,
            Self::UnknownOperation(_) => 404,
            _ => 500,
        }
    }

    /// True for errors caused by the caller's request.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

pub type Result<T> = std::result::Result<T, GaError>;
