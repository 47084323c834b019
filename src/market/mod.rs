pub mod news;
pub mod yahoo;

pub use news::{GoogleNewsClient, GOOGLE_NEWS_RSS};
pub use yahoo::{YahooFinanceClient, YAHOO_CHART_API};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Headline, PriceBar, Ticker};

#[derive(Debug, Error)]
pub enum PriceHistoryError {
    #[error("unknown or delisted ticker: {0}")]
    UnknownTicker(String),

    #[error("price history request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed price history response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("news feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("news feed could not be parsed: {0}")]
    Parse(#[from] rss::Error),
}

/// Daily adjusted OHLC history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Bars in `[start, end]`, ascending by date.
    async fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceHistoryError>;
}

/// Recent headlines mentioning a ticker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Headlines published within the last `window_hours`, newest first.
    async fn fetch(&self, ticker: &Ticker, window_hours: f64) -> Result<Vec<Headline>, NewsError>;
}
