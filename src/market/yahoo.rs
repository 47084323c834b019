use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::{PriceHistoryError, PriceHistorySource};
use crate::types::{PriceBar, Ticker};

pub const YAHOO_CHART_API: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn with_base_url(base_url: &str, timeout: std::time::Duration) -> Result<Self, PriceHistoryError> {
        let client = Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceHistorySource for YahooFinanceClient {
    async fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceHistoryError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let period1 = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        // end is inclusive
        let period2 = (end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc().timestamp())
            .unwrap_or(period1);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PriceHistoryError::UnknownTicker(ticker.to_string()));
        }
        let body: ChartResponse = response.error_for_status()?.json().await?;
        let bars = parse_chart(ticker.as_str(), body)?;

        debug!("Fetched {} daily bars for {} ({} to {})", bars.len(), ticker, start, end);
        Ok(bars)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// Converts a chart payload into adjusted bars, dropping incomplete rows.
///
/// Open, high and low are scaled by adjclose/close and close is replaced by
/// adjclose. Rows sharing a trading date keep the last one.
pub fn parse_chart(ticker: &str, body: ChartResponse) -> Result<Vec<PriceBar>, PriceHistoryError> {
    if let Some(err) = body.chart.error {
        debug!("Chart error for {}: {} {:?}", ticker, err.code, err.description);
        return Err(PriceHistoryError::UnknownTicker(ticker.to_string()));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| PriceHistoryError::UnknownTicker(ticker.to_string()))?;

    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut by_date = BTreeMap::new();
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| PriceHistoryError::Malformed(format!("bad timestamp {}", ts)))?
            .date_naive();

        let (Some(open), Some(high), Some(low), Some(close)) =
            (at(&quote.open, i), at(&quote.high, i), at(&quote.low, i), at(&quote.close, i))
        else {
            continue;
        };

        let adjusted = at(&adjclose, i).unwrap_or(close);
        let ratio = if close != 0.0 { adjusted / close } else { 1.0 };
        let bar = PriceBar::new(date, open * ratio, high * ratio, low * ratio, adjusted);
        if bar.is_finite() {
            by_date.insert(date, bar);
        }
    }

    Ok(by_date.into_values().collect())
}
