use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors surfaced by a hedging simulation run.
///
/// Every variant is fatal for the run that produced it. Progress-sink
/// failures are not represented here; they never abort a run.
#[derive(Debug, Error)]
pub enum HedgingError {
    #[error("insufficient price history: need at least {required} observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("volatility model fit failed: {0}")]
    ModelFit(String),

    #[error("notional must be positive and finite, got {0}")]
    InvalidNotional(f64),

    #[error("invalid simulation request: {0}")]
    InvalidExposure(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type HedgingResult<T> = Result<T, HedgingError>;

impl HedgingError {
    pub fn model_fit(msg: impl Into<String>) -> Self {
        Self::ModelFit(msg.into())
    }

    pub fn invalid_exposure(msg: impl Into<String>) -> Self {
        Self::InvalidExposure(msg.into())
    }

    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Machine-readable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::ModelFit(_) => ErrorKind::ModelFit,
            Self::InvalidNotional(_) => ErrorKind::InvalidNotional,
            Self::InvalidExposure(_) => ErrorKind::InvalidExposure,
            Self::DataSource(_) => ErrorKind::DataSource,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Whether the error was caused by caller input rather than data or numerics.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidNotional(_) | Self::InvalidExposure(_) | Self::InvalidConfig(_)
        )
    }
}

impl From<std::io::Error> for HedgingError {
    fn from(e: std::io::Error) -> Self {
        Self::DataSource(format!("io: {}", e))
    }
}

impl From<csv::Error> for HedgingError {
    fn from(e: csv::Error) -> Self {
        Self::DataSource(format!("csv: {}", e))
    }
}

/// Category of a [`HedgingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    ModelFit,
    InvalidNotional,
    InvalidExposure,
    DataSource,
    InvalidConfig,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientData => "insufficient_data",
            Self::ModelFit => "model_fit",
            Self::InvalidNotional => "invalid_notional",
            Self::InvalidExposure => "invalid_exposure",
            Self::DataSource => "data_source",
            Self::InvalidConfig => "invalid_config",
        };
        f.write_str(s)
    }
}

/// Structured failure handed back to callers (CLI, services).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&HedgingError> for FailureReport {
    fn from(e: &HedgingError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
