use thiserror::Error;

use crate::types::InvalidTicker;

/// Why a ticker produced no usable data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoDataReason {
    #[error("unknown or delisted ticker")]
    UnknownTicker,

    #[error("price history is empty")]
    EmptyHistory,

    #[error("{bars} price bars available, at least {required} required")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("{rows} training rows available, at least {required} required")]
    InsufficientRows { rows: usize, required: usize },
}

/// Failures of the volatility forecast, classified for the caller.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    InvalidTicker(#[from] InvalidTicker),

    #[error("no usable data for {ticker}: {reason}")]
    NoData { ticker: String, reason: NoDataReason },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ForecastError {
    pub fn no_data(ticker: impl Into<String>, reason: NoDataReason) -> Self {
        ForecastError::NoData {
            ticker: ticker.into(),
            reason,
        }
    }

    /// Caller-visible problems with the request, as opposed to server faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ForecastError::InvalidTicker(_) | ForecastError::NoData { .. })
    }
}
