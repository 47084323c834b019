use std::path::PathBuf;

use tracing::{debug, info};

use super::{ModelMetadata, ParameterStore, StoreError, DEFAULT_MAX_AGE_DAYS};

const PARAMS_FILE: &str = "params.json";

/// One pretty-printed JSON file per ticker at `<root>/<TICKER>/params.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    max_age_days: i64,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }

    pub fn with_max_age_days(mut self, days: i64) -> Self {
        self.max_age_days = days;
        self
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.root.join(ticker).join(PARAMS_FILE)
    }
}

impl ParameterStore for JsonFileStore {
    fn load(&self, ticker: &str) -> Result<Option<ModelMetadata>, StoreError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            debug!("No cached parameters at {}", path.display());
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path)?;
        let metadata = serde_json::from_str(&raw)?;
        Ok(Some(metadata))
    }

    fn save(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        let path = self.path_for(&metadata.ticker);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&path, json)?;
        info!("Saved parameters for {} to {}", metadata.ticker, path.display());
        Ok(())
    }

    fn max_age_days(&self) -> i64 {
        self.max_age_days
    }

    fn cached_tickers(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut tickers = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join(PARAMS_FILE).is_file() {
                tickers.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        tickers.sort();
        Ok(tickers)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forest::HyperParameters;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn sample(ticker: &str, r2: f64) -> ModelMetadata {
        ModelMetadata::new(
            ticker,
            HyperParameters {
                tree_count: 200,
                max_depth: Some(10),
                min_samples_split: 5,
                min_samples_leaf: 2,
            },
            vec!["RollingVolatility".into(), "ATR".into()],
            r2,
            0.0012,
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 12, 44).unwrap(),
        )
    }

    #[test]
    fn test_round_trip_creates_directories() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("models").join("volatility"));

        assert!(store.load("AAPL").unwrap().is_none());

        let meta = sample("AAPL", 0.41);
        store.save(&meta).unwrap();

        assert!(store.path_for("AAPL").is_file());
        assert_eq!(store.load("AAPL").unwrap(), Some(meta));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save(&sample("MSFT", 0.1)).unwrap();
        store.save(&sample("MSFT", 0.9)).unwrap();

        let loaded = store.load("MSFT").unwrap().unwrap();
        assert_eq!(loaded.cross_validated_r2, Some(0.9));
    }

    #[test]
    fn test_cached_tickers() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.cached_tickers().unwrap().is_empty());

        store.save(&sample("TSLA", 0.2)).unwrap();
        store.save(&sample("AAPL", 0.2)).unwrap();
        std::fs::create_dir_all(dir.path().join("EMPTY")).unwrap();

        assert_eq!(store.cached_tickers().unwrap(), vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_corrupt_record_is_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("BAD")).unwrap();
        std::fs::write(store.path_for("BAD"), "{not json").unwrap();

        assert!(matches!(store.load("BAD"), Err(StoreError::Serialization(_))));
    }
}
