use anyhow::{anyhow, Context};
use chrono::{DateTime, Months, Utc};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ForecastError, NoDataReason};
use crate::market::{PriceHistoryError, PriceHistorySource};
use crate::ml::{
    compute_features, Dataset, Feature, FeatureError, ModelMetadata, ModelTrainer, ParameterStore,
    RandomForest, SearchSettings, TrainError,
};
use crate::types::{PriceBar, Ticker, VolatilityContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilitySettings {
    pub lookback_years: u32,
    pub search: SearchSettings,
    /// Reported when a cached record predates stored metrics.
    pub fallback_r2: f64,
    pub fallback_mae: f64,
}

impl Default for VolatilitySettings {
    fn default() -> Self {
        Self {
            lookback_years: 2,
            search: SearchSettings::default(),
            fallback_r2: 0.5,
            fallback_mae: 0.01,
        }
    }
}

/// Result of one forecast: the metadata it ran under and the forecast itself.
#[derive(Debug, Clone)]
pub struct VolatilityRun {
    pub metadata: ModelMetadata,
    pub retrained: bool,
    pub context: VolatilityContext,
}

/// Fetch, featurize, retrain or reuse, predict and contextualize.
#[derive(Clone)]
pub struct VolatilityPipeline {
    prices: Arc<dyn PriceHistorySource>,
    store: Arc<dyn ParameterStore>,
    trainer: ModelTrainer,
    settings: VolatilitySettings,
}

impl VolatilityPipeline {
    pub fn new(
        prices: Arc<dyn PriceHistorySource>,
        store: Arc<dyn ParameterStore>,
        settings: VolatilitySettings,
    ) -> Self {
        Self {
            prices,
            store,
            trainer: ModelTrainer::new(settings.search.clone()),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    pub async fn run(&self, ticker: &Ticker) -> Result<VolatilityRun, ForecastError> {
        let now = Utc::now();
        let end = now.date_naive();
        let start = end
            .checked_sub_months(Months::new(12 * self.settings.lookback_years))
            .unwrap_or(end);

        let bars = self
            .prices
            .fetch(ticker, start, end)
            .await
            .map_err(|e| match e {
                PriceHistoryError::UnknownTicker(_) => {
                    ForecastError::no_data(ticker.as_str(), NoDataReason::UnknownTicker)
                }
                other => ForecastError::Unexpected(
                    anyhow::Error::new(other).context(format!("fetching price history for {}", ticker)),
                ),
            })?;

        debug!("{}: {} bars from {} to {}", ticker, bars.len(), start, end);

        let pipeline = self.clone();
        let ticker = ticker.clone();
        tokio::task::spawn_blocking(move || pipeline.forecast(&ticker, &bars, now))
            .await
            .map_err(|e| anyhow!("volatility task failed: {}", e))?
    }

    /// Synchronous core: everything after the price fetch.
    pub fn forecast(
        &self,
        ticker: &Ticker,
        bars: &[PriceBar],
        now: DateTime<Utc>,
    ) -> Result<VolatilityRun, ForecastError> {
        let features = compute_features(bars).map_err(|e| match e {
            FeatureError::EmptyHistory => ForecastError::no_data(ticker.as_str(), NoDataReason::EmptyHistory),
            FeatureError::InsufficientHistory { bars, required } => ForecastError::no_data(
                ticker.as_str(),
                NoDataReason::InsufficientHistory { bars, required },
            ),
            FeatureError::Unordered => ForecastError::Unexpected(anyhow!(e)),
        })?;

        let (training, latest) = features
            .split()
            .ok_or_else(|| ForecastError::no_data(ticker.as_str(), NoDataReason::EmptyHistory))?;
        debug!(
            "{}: {} feature rows ({} trainable), predicting for {}",
            ticker,
            features.len(),
            training.n_samples(),
            latest.date
        );

        let cached = self
            .store
            .load(ticker.as_str())
            .with_context(|| format!("loading cached parameters for {}", ticker))?;

        let stale = cached.as_ref().map(|m| self.store.is_stale(m, now));
        let (model, metadata, retrained) = match (cached, stale) {
            (Some(metadata), Some(false)) => {
                let model = self.refit(ticker, &metadata, &training)?;
                (model, metadata, false)
            }
            (cached, _) => {
                match cached {
                    Some(old) => info!("{}: cached parameters from {:?} are stale, retraining", ticker, old.trained_on),
                    None => info!("{}: no cached parameters, running hyperparameter search", ticker),
                }
                let (model, metadata) = self.retrain(ticker, &training, now)?;
                (model, metadata, true)
            }
        };

        let predicted = model.predict_row(ArrayView1::from(&latest.values[..]));
        let current = latest.value(Feature::RollingVolatility);
        let r2 = metadata.cross_validated_r2.unwrap_or(self.settings.fallback_r2);
        let mae = metadata.cross_validated_mae.unwrap_or(self.settings.fallback_mae);
        let context = VolatilityContext::new(predicted, current, r2, mae);

        info!(
            "{}: predicted={:.6} current={:.6} change={}% confidence={} ({})",
            ticker,
            context.predicted,
            context.current,
            context.change_pct,
            context.confidence_tier,
            if retrained { "retrained" } else { "cached" }
        );

        Ok(VolatilityRun {
            metadata,
            retrained,
            context,
        })
    }

    fn retrain(
        &self,
        ticker: &Ticker,
        training: &Dataset,
        now: DateTime<Utc>,
    ) -> Result<(RandomForest, ModelMetadata), ForecastError> {
        let outcome = self.trainer.train(training).map_err(|e| match e {
            TrainError::InsufficientData { rows, required } => ForecastError::no_data(
                ticker.as_str(),
                NoDataReason::InsufficientRows { rows, required },
            ),
            TrainError::EmptySearchSpace => ForecastError::Unexpected(anyhow!(e)),
        })?;

        let metadata = ModelMetadata::new(
            ticker.as_str(),
            outcome.hyperparameters,
            Feature::names(),
            outcome.r2,
            outcome.mae,
            now,
        );
        self.store
            .save(&metadata)
            .with_context(|| format!("saving tuned parameters for {}", ticker))?;

        Ok((outcome.model, metadata))
    }

    /// Fits a fresh forest with the cached hyperparameters on today's data.
    fn refit(
        &self,
        ticker: &Ticker,
        metadata: &ModelMetadata,
        training: &Dataset,
    ) -> Result<RandomForest, ForecastError> {
        if training.is_empty() {
            return Err(ForecastError::no_data(
                ticker.as_str(),
                NoDataReason::InsufficientRows { rows: 0, required: 1 },
            ));
        }
        debug!("{}: reusing {:?}", ticker, metadata.best_hyperparameters);
        Ok(self.trainer.fit(metadata.best_hyperparameters, training))
    }
}
