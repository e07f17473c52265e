use thiserror::Error;

/// Conditions surfaced by the forecasting operations.
///
/// Per-commodity failures inside aggregate operations are not represented here; those are
/// carried as [`crate::domain::forecast::SkippedCommodity`] entries next to the successes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("commodity '{name}' not found")]
    NotFound { name: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not generate forecast for '{name}'")]
    Unavailable { name: String },

    #[error("no commodity could be forecast ({attempted} attempted)")]
    NoForecasts { attempted: usize },
}

impl ForecastError {
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::NotFound { .. } => "not_found",
            ForecastError::InvalidInput(_) => "invalid_input",
            ForecastError::Unavailable { .. } => "unavailable",
            ForecastError::NoForecasts { .. } => "no_forecasts",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("line {line}: {message}")]
    InvalidRow { line: usize, message: String },

    #[error("invalid series: {0}")]
    Validation(String),
}
