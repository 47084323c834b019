use std::path::Path;

use tracing::info;

use super::{ModelMetadata, ParameterStore, StoreError, DEFAULT_MAX_AGE_DAYS};

const TREE_NAME: &str = "volatility_params";

/// Embedded key-value backend: one sled tree keyed by ticker, JSON values.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    max_age_days: i64,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree(TREE_NAME)?;
        info!("Opened parameter database at {}", path.as_ref().display());
        Ok(Self {
            db,
            tree,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        })
    }

    pub fn with_max_age_days(mut self, days: i64) -> Self {
        self.max_age_days = days;
        self
    }
}

impl ParameterStore for SledStore {
    fn load(&self, ticker: &str) -> Result<Option<ModelMetadata>, StoreError> {
        match self.tree.get(ticker.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(metadata)?;
        self.tree.insert(metadata.ticker.as_bytes(), bytes)?;
        self.tree.flush()?;
        info!("Saved parameters for {} to embedded store", metadata.ticker);
        Ok(())
    }

    fn max_age_days(&self) -> i64 {
        self.max_age_days
    }

    fn cached_tickers(&self) -> Result<Vec<String>, StoreError> {
        let mut tickers = Vec::new();
        for key in self.tree.iter().keys() {
            let key = key?;
            tickers.push(String::from_utf8_lossy(&key).to_string());
        }
        Ok(tickers)
    }

    fn describe(&self) -> String {
        format!("sled:{} records", self.tree.len())
    }
}

impl Drop for SledStore {
    fn drop(&mut self) {
        let _ = self.db.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::forest::HyperParameters;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_and_listing() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path().join("params.db")).unwrap();

        assert!(store.load("NVDA").unwrap().is_none());

        let meta = ModelMetadata::new(
            "NVDA",
            HyperParameters::default(),
            vec!["HV_10".into()],
            0.75,
            0.002,
            Utc::now(),
        );
        store.save(&meta).unwrap();
        store.save(&ModelMetadata { ticker: "AMD".into(), ..meta.clone() }).unwrap();

        assert_eq!(store.load("NVDA").unwrap(), Some(meta));
        assert_eq!(store.cached_tickers().unwrap(), vec!["AMD", "NVDA"]);
    }

    #[test]
    fn test_custom_max_age() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap().with_max_age_days(1);
        let now = Utc::now();
        let meta = ModelMetadata::new("IBM", HyperParameters::default(), vec![], 0.1, 0.1, now - Duration::days(2));
        assert!(store.is_stale(&meta, now));
    }
}
