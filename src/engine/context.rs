use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{SentimentPipeline, VolatilityPipeline};
use crate::config::{AppConfig, StoreBackend};
use crate::error::ForecastError;
use crate::market::{GoogleNewsClient, NewsSource, PriceHistorySource, YahooFinanceClient};
use crate::ml::{JsonFileStore, ParameterStore, SledStore};
use crate::sentiment::{LexiconOracle, SentimentOracle};
use crate::types::{SentimentReport, Ticker, VolatilityContext};

/// Combined answer for one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub volatility: VolatilityContext,
    pub sentiment: SentimentReport,
}

/// Process-wide wiring: collaborators, the oracle and the parameter store are
/// built once here and shared by every request.
#[derive(Clone)]
pub struct ServiceContext {
    pub volatility: VolatilityPipeline,
    pub sentiment: SentimentPipeline,
    store: Arc<dyn ParameterStore>,
}

impl ServiceContext {
    pub fn new(volatility: VolatilityPipeline, sentiment: SentimentPipeline) -> Self {
        let store = Arc::clone(volatility.store());
        Self {
            volatility,
            sentiment,
            store,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.market.timeout_secs);

        let store: Arc<dyn ParameterStore> = match config.store.backend {
            StoreBackend::Json => Arc::new(
                JsonFileStore::new(&config.store.path).with_max_age_days(config.store.max_age_days),
            ),
            StoreBackend::Sled => Arc::new(
                SledStore::open(&config.store.path)
                    .with_context(|| format!("opening parameter database at {}", config.store.path))?
                    .with_max_age_days(config.store.max_age_days),
            ),
        };

        let prices: Arc<dyn PriceHistorySource> = Arc::new(
            YahooFinanceClient::with_base_url(&config.market.price_api_url, timeout)
                .context("building price history client")?,
        );
        let news: Arc<dyn NewsSource> = Arc::new(
            GoogleNewsClient::with_feed_url(&config.market.news_feed_url, timeout)
                .context("building news client")?,
        );
        let oracle: Arc<dyn SentimentOracle> = Arc::new(LexiconOracle::new());

        info!(
            "Service context ready: store={}, oracle={}",
            store.describe(),
            oracle.name()
        );

        Ok(Self::new(
            VolatilityPipeline::new(prices, store, config.volatility.clone()),
            SentimentPipeline::new(news, oracle, config.sentiment.clone()),
        ))
    }

    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    /// Runs both pipelines concurrently. Only volatility failures are fatal.
    pub async fn predict(&self, ticker: &Ticker) -> Result<Prediction, ForecastError> {
        let (volatility, sentiment) = tokio::join!(self.volatility.run(ticker), self.sentiment.run(ticker));
        let volatility = volatility?;

        Ok(Prediction {
            ticker: ticker.to_string(),
            timestamp: Utc::now(),
            volatility: volatility.context,
            sentiment,
        })
    }
}
