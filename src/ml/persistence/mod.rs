pub mod json_store;
pub mod sled_store;

pub use json_store::JsonFileStore;
pub use sled_store::SledStore;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::forest::HyperParameters;

pub const SCHEMA_VERSION: &str = "v1.0";
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parameter store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid parameter record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedded database error: {0}")]
    Database(#[from] sled::Error),
}

/// Tuned hyperparameters and their cross-validated scores for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub ticker: String,
    #[serde(default, deserialize_with = "deserialize_trained_on")]
    pub trained_on: Option<DateTime<Utc>>,
    #[serde(rename = "features", default)]
    pub feature_list: Vec<String>,
    #[serde(rename = "model_version", default = "default_schema_version")]
    pub schema_version: String,
    #[serde(rename = "best_params")]
    pub best_hyperparameters: HyperParameters,
    #[serde(rename = "r2_score", default)]
    pub cross_validated_r2: Option<f64>,
    #[serde(rename = "mae", default)]
    pub cross_validated_mae: Option<f64>,
}

impl ModelMetadata {
    pub fn new(
        ticker: impl Into<String>,
        best_hyperparameters: HyperParameters,
        feature_list: Vec<String>,
        r2: f64,
        mae: f64,
        trained_on: DateTime<Utc>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            trained_on: Some(trained_on),
            feature_list,
            schema_version: SCHEMA_VERSION.to_string(),
            best_hyperparameters,
            cross_validated_r2: Some(r2),
            cross_validated_mae: Some(mae),
        }
    }
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 ones (read as UTC).
fn deserialize_trained_on<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

/// Stale when never stamped, or when more than `max_age_days` calendar days old.
pub fn is_stale(metadata: &ModelMetadata, now: DateTime<Utc>, max_age_days: i64) -> bool {
    match metadata.trained_on {
        Some(trained_on) => (now.date_naive() - trained_on.date_naive()).num_days() > max_age_days,
        None => true,
    }
}

/// Durable home of per-ticker tuned parameters.
pub trait ParameterStore: Send + Sync {
    fn load(&self, ticker: &str) -> Result<Option<ModelMetadata>, StoreError>;

    /// Overwrites any prior record for the same ticker.
    fn save(&self, metadata: &ModelMetadata) -> Result<(), StoreError>;

    fn max_age_days(&self) -> i64 {
        DEFAULT_MAX_AGE_DAYS
    }

    fn is_stale(&self, metadata: &ModelMetadata, now: DateTime<Utc>) -> bool {
        is_stale(metadata, now, self.max_age_days())
    }

    fn cached_tickers(&self) -> Result<Vec<String>, StoreError>;

    fn describe(&self) -> String;
}
