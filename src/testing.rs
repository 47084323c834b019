//! Deterministic fixtures and hand-written collaborators shared by unit tests.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::market::{NewsError, NewsSource, PriceHistoryError, PriceHistorySource};
use crate::ml::{ModelMetadata, ParameterStore, SearchSettings, SearchSpace, StoreError};
use crate::sentiment::{Classification, SentimentOracle};
use crate::types::{Headline, PriceBar, SentimentLabel, Ticker};

/// Random-walk daily bars with regime-switching volatility, one per calendar
/// day starting 2024-01-01.
pub fn synthetic_bars(n: usize, seed: u64) -> Vec<PriceBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let mut close = 100.0;
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let regime = if (i / 40) % 2 == 0 { 0.01 } else { 0.03 };
        let shock: f64 = rng.random_range(-1.0..1.0);
        let open = close;
        close = (close * (1.0 + regime * shock)).max(1.0);

        let wiggle: f64 = rng.random_range(0.0..1.0);
        let high = open.max(close) * (1.0 + regime * wiggle);
        let low = open.min(close) * (1.0 - regime * wiggle);

        bars.push(PriceBar::new(start + Duration::days(i as i64), open, high, low, close));
    }
    bars
}

/// Search settings small enough for unit tests.
pub fn quick_search() -> SearchSettings {
    SearchSettings {
        space: SearchSpace {
            tree_counts: vec![5, 10],
            max_depths: vec![None, Some(4)],
            min_samples_splits: vec![2, 5],
            min_samples_leafs: vec![1, 2],
        },
        iterations: 3,
        folds: 3,
        seed: 123,
    }
}

/// Serves the same bars for every ticker, or none for tickers marked unknown.
pub struct StaticPrices {
    pub bars: Vec<PriceBar>,
    pub unknown: Vec<String>,
}

impl StaticPrices {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars, unknown: Vec::new() }
    }
}

#[async_trait]
impl PriceHistorySource for StaticPrices {
    async fn fetch(
        &self,
        ticker: &Ticker,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PriceBar>, PriceHistoryError> {
        if self.unknown.iter().any(|t| t == ticker.as_str()) {
            return Err(PriceHistoryError::UnknownTicker(ticker.to_string()));
        }
        Ok(self.bars.clone())
    }
}

pub struct StaticNews(pub Vec<Headline>);

#[async_trait]
impl NewsSource for StaticNews {
    async fn fetch(&self, _ticker: &Ticker, _window_hours: f64) -> Result<Vec<Headline>, NewsError> {
        Ok(self.0.clone())
    }
}

/// Classifies by exact title, defaulting to neutral with confidence 0.5.
#[derive(Default)]
pub struct ScriptedOracle {
    pub answers: HashMap<String, Classification>,
}

impl ScriptedOracle {
    pub fn with(mut self, title: &str, label: SentimentLabel, confidence: f64) -> Self {
        self.answers.insert(title.to_string(), Classification::new(label, confidence));
        self
    }
}

impl SentimentOracle for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn classify(&self, text: &str) -> Classification {
        self.answers
            .get(text)
            .copied()
            .unwrap_or(Classification::new(SentimentLabel::Neutral, 0.5))
    }
}

/// In-memory parameter store that counts writes.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ModelMetadata>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_record(metadata: ModelMetadata) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(metadata.ticker.clone(), metadata);
        store
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl ParameterStore for MemoryStore {
    fn load(&self, ticker: &str) -> Result<Option<ModelMetadata>, StoreError> {
        Ok(self.records.lock().unwrap().get(ticker).cloned())
    }

    fn save(&self, metadata: &ModelMetadata) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap()
            .insert(metadata.ticker.clone(), metadata.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn cached_tickers(&self) -> Result<Vec<String>, StoreError> {
        let mut tickers: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
