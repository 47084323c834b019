use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Dataset;
use crate::indicators::{Atr, BollingerBands, Macd, RollingWindow, Rsi};
use crate::types::{is_ascending, PriceBar};

/// Rows before this index always lack at least one feature (HV_30 needs 30 returns).
pub const WARMUP_ROWS: usize = 30;

/// Smallest series that yields at least one complete feature row.
pub const MIN_BARS: usize = WARMUP_ROWS + 1;

const RETURN_LAGS: [usize; 4] = [1, 2, 3, 5];

/// Model inputs, in the column order used for training and prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    RollingVolatility,
    Atr,
    RollingMean,
    Return,
    Rsi,
    Macd,
    MacdSignal,
    BbWidth,
    ReturnLag1,
    ReturnLag2,
    ReturnLag3,
    ReturnLag5,
    Hv10,
    Hv20,
    Hv30,
}

impl Feature {
    pub const COUNT: usize = 15;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::RollingVolatility,
        Feature::Atr,
        Feature::RollingMean,
        Feature::Return,
        Feature::Rsi,
        Feature::Macd,
        Feature::MacdSignal,
        Feature::BbWidth,
        Feature::ReturnLag1,
        Feature::ReturnLag2,
        Feature::ReturnLag3,
        Feature::ReturnLag5,
        Feature::Hv10,
        Feature::Hv20,
        Feature::Hv30,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::RollingVolatility => "RollingVolatility",
            Feature::Atr => "ATR",
            Feature::RollingMean => "RollingMean",
            Feature::Return => "Return",
            Feature::Rsi => "RSI",
            Feature::Macd => "MACD",
            Feature::MacdSignal => "MACD_Signal",
            Feature::BbWidth => "BB_Width",
            Feature::ReturnLag1 => "Return_Lag_1",
            Feature::ReturnLag2 => "Return_Lag_2",
            Feature::ReturnLag3 => "Return_Lag_3",
            Feature::ReturnLag5 => "Return_Lag_5",
            Feature::Hv10 => "HV_10",
            Feature::Hv20 => "HV_20",
            Feature::Hv30 => "HV_30",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.name().to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("price history is empty")]
    EmptyHistory,

    #[error("price bars must be strictly ascending by date")]
    Unordered,

    #[error("{bars} price bars cannot produce a complete feature row, at least {required} required")]
    InsufficientHistory { bars: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub values: [f64; Feature::COUNT],
    /// Next day's rolling volatility; `None` on the live prediction row.
    pub target: Option<f64>,
}

impl FeatureRow {
    pub fn value(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }
}

#[derive(Debug, Clone)]
pub struct FeatureSet {
    rows: Vec<FeatureRow>,
}

impl FeatureSet {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn latest(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    /// Rows with a defined target, ready for training.
    pub fn trainable(&self) -> Dataset {
        let rows: Vec<(Vec<f64>, f64)> = self
            .rows
            .iter()
            .filter_map(|row| row.target.map(|t| (row.values.to_vec(), t)))
            .collect();
        Dataset::from_rows(&rows, Feature::COUNT)
    }

    /// Training data plus the latest row used as the live prediction input.
    pub fn split(&self) -> Option<(Dataset, &FeatureRow)> {
        let latest = self.latest()?;
        Some((self.trainable(), latest))
    }
}

/// Builds the technical-indicator feature matrix from ascending daily bars.
pub fn compute_features(bars: &[PriceBar]) -> Result<FeatureSet, FeatureError> {
    if bars.is_empty() {
        return Err(FeatureError::EmptyHistory);
    }
    if !is_ascending(bars) {
        return Err(FeatureError::Unordered);
    }

    let mut rsi = Rsi::new(14);
    let mut macd = Macd::default_params();
    let mut bollinger = BollingerBands::default_params();
    let mut atr = Atr::new(14);
    let mut vol_20 = RollingWindow::new(20);
    let mut hv_10 = RollingWindow::new(10);
    let mut hv_30 = RollingWindow::new(30);
    let mut mean_10 = RollingWindow::new(10);

    let mut returns: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut raw: Vec<(NaiveDate, [Option<f64>; Feature::COUNT])> = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        let ret = prev_close
            .map(|prev| bar.close / prev - 1.0)
            .filter(|r| r.is_finite());
        returns.push(ret);
        prev_close = Some(bar.close);

        vol_20.push(ret);
        hv_10.push(ret);
        hv_30.push(ret);
        mean_10.push(ret);

        let macd_out = macd.update(bar.close);
        let lag = |k: usize| if i >= k { returns[i - k] } else { None };

        let mut values = [None; Feature::COUNT];
        values[Feature::RollingVolatility.index()] = vol_20.std();
        values[Feature::Atr.index()] = Some(atr.update(bar.high, bar.low, bar.close));
        values[Feature::RollingMean.index()] = mean_10.mean();
        values[Feature::Return.index()] = ret;
        values[Feature::Rsi.index()] = Some(rsi.update(bar.close));
        values[Feature::Macd.index()] = Some(macd_out.macd_line);
        values[Feature::MacdSignal.index()] = Some(macd_out.signal_line);
        values[Feature::BbWidth.index()] = bollinger.update(bar.close).map(|b| b.width());
        for (feature, k) in [
            Feature::ReturnLag1,
            Feature::ReturnLag2,
            Feature::ReturnLag3,
            Feature::ReturnLag5,
        ]
        .into_iter()
        .zip(RETURN_LAGS)
        {
            values[feature.index()] = lag(k);
        }
        values[Feature::Hv10.index()] = hv_10.std();
        values[Feature::Hv20.index()] = vol_20.std();
        values[Feature::Hv30.index()] = hv_30.std();

        raw.push((bar.date, values));
    }

    let volatility: Vec<Option<f64>> = raw
        .iter()
        .map(|(_, v)| v[Feature::RollingVolatility.index()])
        .collect();

    let rows: Vec<FeatureRow> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, (date, values))| {
            let mut complete = [0.0; Feature::COUNT];
            for (slot, value) in complete.iter_mut().zip(values.iter()) {
                *slot = value.filter(|v| v.is_finite())?;
            }
            let target = volatility.get(i + 1).copied().flatten();
            Some(FeatureRow {
                date,
                values: complete,
                target,
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(FeatureError::InsufficientHistory {
            bars: bars.len(),
            required: MIN_BARS,
        });
    }

    Ok(FeatureSet { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_bars;

    #[test]
    fn test_feature_names_order() {
        let names = Feature::names();
        assert_eq!(names.len(), 15);
        assert_eq!(names[0], "RollingVolatility");
        assert_eq!(names[7], "BB_Width");
        assert_eq!(names[14], "HV_30");
    }

    #[test]
    fn test_only_last_row_lacks_target() {
        let bars = synthetic_bars(200, 7);
        let set = compute_features(&bars).unwrap();

        assert_eq!(set.len(), 200 - WARMUP_ROWS);
        let undefined: Vec<usize> = set
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.target.is_none())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(undefined, vec![set.len() - 1]);
        assert_eq!(set.latest().unwrap().date, bars.last().unwrap().date);

        for row in set.rows() {
            assert!(row.values.iter().all(|v| v.is_finite()));
            let rsi = row.value(Feature::Rsi);
            assert!((0.0..=100.0).contains(&rsi));
        }
    }

    #[test]
    fn test_target_is_next_day_volatility() {
        let bars = synthetic_bars(120, 3);
        let set = compute_features(&bars).unwrap();
        let rows = set.rows();
        for pair in rows.windows(2) {
            assert_eq!(pair[0].target, Some(pair[1].value(Feature::RollingVolatility)));
        }
    }

    #[test]
    fn test_hv20_matches_rolling_volatility() {
        let set = compute_features(&synthetic_bars(80, 11)).unwrap();
        for row in set.rows() {
            assert_eq!(row.value(Feature::Hv20), row.value(Feature::RollingVolatility));
        }
    }

    #[test]
    fn test_first_complete_row_is_after_warmup() {
        let bars = synthetic_bars(MIN_BARS, 1);
        let set = compute_features(&bars).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.rows()[0].target.is_none());

        let short = synthetic_bars(MIN_BARS - 1, 1);
        assert_eq!(
            compute_features(&short).unwrap_err(),
            FeatureError::InsufficientHistory {
                bars: MIN_BARS - 1,
                required: MIN_BARS
            }
        );
    }

    #[test]
    fn test_split_excludes_latest_from_training() {
        let set = compute_features(&synthetic_bars(100, 5)).unwrap();
        let (train, latest) = set.split().unwrap();
        assert_eq!(train.n_samples(), set.len() - 1);
        assert!(latest.target.is_none());
    }

    #[test]
    fn test_rejects_empty_and_unordered() {
        assert_eq!(compute_features(&[]).unwrap_err(), FeatureError::EmptyHistory);

        let mut bars = synthetic_bars(40, 2);
        bars.swap(3, 4);
        assert_eq!(compute_features(&bars).unwrap_err(), FeatureError::Unordered);
    }

    #[test]
    fn test_return_is_pct_change() {
        let set = compute_features(&synthetic_bars(60, 9)).unwrap();
        let bars = synthetic_bars(60, 9);
        let row = set.latest().unwrap();
        let n = bars.len();
        let expected = bars[n - 1].close / bars[n - 2].close - 1.0;
        assert!((row.value(Feature::Return) - expected).abs() < 1e-15);
        let lag5 = bars[n - 6].close / bars[n - 7].close - 1.0;
        assert!((row.value(Feature::ReturnLag5) - lag5).abs() < 1e-15);
    }
}
