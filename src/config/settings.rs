use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::engine::{SentimentSettings, VolatilitySettings};
use crate::market::{GOOGLE_NEWS_RSS, YAHOO_CHART_API};

pub const ENV_PREFIX: &str = "TICKERCAST";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub volatility: VolatilitySettings,
    pub sentiment: SentimentSettings,
    pub store: StoreSettings,
    pub market: MarketSettings,
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then `TICKERCAST__SECTION__KEY`
    /// variables. `FRONTEND_URL` overrides the CORS origin last.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("reading configuration from {}", path.as_ref().display()))?;

        let mut config: AppConfig = settings.try_deserialize().context("invalid configuration")?;

        if let Ok(url) = std::env::var("FRONTEND_URL") {
            config.server.frontend_url = url;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Server
        if self.server.rate_limit_per_minute == 0 {
            errors.push("server.rate_limit_per_minute must be > 0".to_string());
        }
        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs must be > 0".to_string());
        }
        if self.server.frontend_url.parse::<axum::http::HeaderValue>().is_err() {
            errors.push(format!("server.frontend_url is not a valid origin: {}", self.server.frontend_url));
        }

        // Volatility
        let search = &self.volatility.search;
        if self.volatility.lookback_years == 0 {
            errors.push("volatility.lookback_years must be > 0".to_string());
        }
        if search.iterations == 0 {
            errors.push("volatility.search.iterations must be > 0".to_string());
        }
        if search.folds < 2 {
            errors.push("volatility.search.folds must be >= 2".to_string());
        }
        if search.space.size() == 0 {
            errors.push("volatility.search.space must contain at least one candidate".to_string());
        }
        if search.space.tree_counts.contains(&0) {
            errors.push("volatility.search.space.tree_counts must be > 0".to_string());
        }
        if search.space.min_samples_splits.iter().any(|&s| s < 2) {
            errors.push("volatility.search.space.min_samples_splits must be >= 2".to_string());
        }
        if search.space.min_samples_leafs.contains(&0) {
            errors.push("volatility.search.space.min_samples_leafs must be >= 1".to_string());
        }

        // Sentiment
        if self.sentiment.time_window_hours <= 0.0 {
            errors.push("sentiment.time_window_hours must be > 0".to_string());
        }
        if self.sentiment.decay_hours <= 0.0 {
            errors.push("sentiment.decay_hours must be > 0".to_string());
        }
        if self.sentiment.max_articles == 0 {
            errors.push("sentiment.max_articles must be > 0".to_string());
        }

        // Store
        if self.store.max_age_days < 0 {
            errors.push("store.max_age_days must be >= 0".to_string());
        }
        if self.store.path.trim().is_empty() {
            errors.push("store.path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            frontend_url: "http://localhost:3000".to_string(),
            rate_limit_per_minute: 10,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Json,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Directory for the JSON backend, database path for sled.
    pub path: String,
    pub max_age_days: i64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            path: "models/volatility".to_string(),
            max_age_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub price_api_url: String,
    pub news_feed_url: String,
    pub timeout_secs: u64,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            price_api_url: YAHOO_CHART_API.to_string(),
            news_feed_url: GOOGLE_NEWS_RSS.to_string(),
            timeout_secs: 10,
        }
    }
}
