use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::error::ForecastError;
use crate::types::Ticker;

/// Errors surfaced to HTTP clients as `{"error": msg, "status": code}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Rate limit exceeded: {0} per 1 minute")]
    RateLimited(u32),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client problems keep their message; server faults are logged and hidden.
    pub fn from_forecast(ticker: &Ticker, err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidTicker(e) => ApiError::BadRequest(e.to_string()),
            ForecastError::NoData { ref reason, .. } => {
                warn!("Invalid ticker requested: {} ({})", ticker, reason);
                ApiError::BadRequest(format!("Invalid ticker: {}. No data found for this symbol.", ticker))
            }
            ForecastError::Unexpected(e) => {
                error!("Unexpected error processing {}: {:#}", ticker, e);
                ApiError::Internal(format!(
                    "Internal server error while processing {}. Please try again later.",
                    ticker
                ))
            }
        }
    }
}

impl From<crate::types::InvalidTicker> for ApiError {
    fn from(err: crate::types::InvalidTicker) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = axum::Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
