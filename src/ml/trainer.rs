use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::forest::{HyperParameters, RandomForest};
use super::validation::{mean_absolute_error, r2_score, Fold, TimeSeriesSplit};
use super::Dataset;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainError {
    #[error("{rows} training rows available, at least {required} required for cross validation")]
    InsufficientData { rows: usize, required: usize },

    #[error("hyperparameter search space is empty")]
    EmptySearchSpace,
}

/// Candidate values for each hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub tree_counts: Vec<usize>,
    pub max_depths: Vec<Option<usize>>,
    pub min_samples_splits: Vec<usize>,
    pub min_samples_leafs: Vec<usize>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            tree_counts: vec![100, 200, 300],
            max_depths: vec![None, Some(5), Some(10), Some(20)],
            min_samples_splits: vec![2, 5, 10],
            min_samples_leafs: vec![1, 2, 4],
        }
    }
}

impl SearchSpace {
    /// Every combination, ordered by max_depth, min_samples_leaf,
    /// min_samples_split, then tree count.
    pub fn grid(&self) -> Vec<HyperParameters> {
        let mut grid = Vec::with_capacity(self.size());
        for &max_depth in &self.max_depths {
            for &min_samples_leaf in &self.min_samples_leafs {
                for &min_samples_split in &self.min_samples_splits {
                    for &tree_count in &self.tree_counts {
                        grid.push(HyperParameters {
                            tree_count,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                        });
                    }
                }
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.tree_counts.len()
            * self.max_depths.len()
            * self.min_samples_splits.len()
            * self.min_samples_leafs.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub space: SearchSpace,
    pub iterations: usize,
    pub folds: usize,
    pub seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            space: SearchSpace::default(),
            iterations: 20,
            folds: 5,
            seed: 123,
        }
    }
}

/// Mean cross-validated scores of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvScore {
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: RandomForest,
    pub hyperparameters: HyperParameters,
    pub mae: f64,
    pub r2: f64,
    pub candidates_evaluated: usize,
}

/// Randomized hyperparameter search with time-ordered cross validation.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    settings: SearchSettings,
}

impl ModelTrainer {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    /// Samples distinct candidates from the grid without replacement.
    pub fn sample_candidates(&self) -> Vec<HyperParameters> {
        let grid = self.settings.space.grid();
        let amount = self.settings.iterations.min(grid.len());
        let mut rng = StdRng::seed_from_u64(self.settings.seed);

        rand::seq::index::sample(&mut rng, grid.len(), amount)
            .into_iter()
            .map(|i| grid[i])
            .collect()
    }

    /// Scores every sampled candidate, keeps the lowest mean MAE and refits
    /// it on the whole dataset.
    pub fn train(&self, data: &Dataset) -> Result<TrainingOutcome, TrainError> {
        let split = TimeSeriesSplit::new(self.settings.folds);
        let folds = split
            .folds(data.n_samples())
            .ok_or(TrainError::InsufficientData {
                rows: data.n_samples(),
                required: split.min_samples(),
            })?;

        let candidates = self.sample_candidates();
        if candidates.is_empty() {
            return Err(TrainError::EmptySearchSpace);
        }

        info!(
            "Hyperparameter search: {} candidates x {} folds on {} rows",
            candidates.len(),
            folds.len(),
            data.n_samples()
        );

        let scores: Vec<CvScore> = candidates
            .par_iter()
            .map(|params| self.cross_validate(params, data, &folds))
            .collect();

        // first candidate wins ties
        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if score.mae < scores[best].mae {
                best = i;
            }
        }

        let hyperparameters = candidates[best];
        let score = scores[best];
        debug!(
            "Best candidate {:?}: cv_mae={:.6} cv_r2={:.3}",
            hyperparameters, score.mae, score.r2
        );

        let model = self.fit(hyperparameters, data);

        Ok(TrainingOutcome {
            model,
            hyperparameters,
            mae: score.mae,
            r2: score.r2,
            candidates_evaluated: candidates.len(),
        })
    }

    /// Fits a forest with fixed hyperparameters and the trainer's seed.
    pub fn fit(&self, params: HyperParameters, data: &Dataset) -> RandomForest {
        RandomForest::fit(params, self.settings.seed, data.features(), data.targets())
    }

    pub fn cross_validate(&self, params: &HyperParameters, data: &Dataset, folds: &[Fold]) -> CvScore {
        let mut mae = 0.0;
        let mut r2 = 0.0;

        for fold in folds {
            let (x_train, y_train) = data.rows(fold.train.start, fold.train.end);
            let (x_test, y_test) = data.rows(fold.test.start, fold.test.end);

            let model = RandomForest::fit(*params, self.settings.seed, x_train, y_train);
            let predicted = model.predict(x_test);

            mae += mean_absolute_error(y_test, predicted.view());
            r2 += r2_score(y_test, predicted.view());
        }

        let n = folds.len().max(1) as f64;
        CvScore {
            mae: mae / n,
            r2: r2 / n,
        }
    }
}
