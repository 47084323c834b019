use ndarray::ArrayView1;
use std::ops::Range;

/// Expanding-window cross validation over time-ordered rows.
///
/// Each fold trains on everything before its test block, so no future row
/// ever leaks into training.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesSplit {
    n_splits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

impl TimeSeriesSplit {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits: n_splits.max(1),
        }
    }

    /// Fewest rows that still give every fold a non-empty test block.
    pub fn min_samples(&self) -> usize {
        self.n_splits + 1
    }

    /// Returns `None` when there are too few rows for the configured fold count.
    pub fn folds(&self, n_samples: usize) -> Option<Vec<Fold>> {
        if n_samples < self.min_samples() {
            return None;
        }

        let test_size = n_samples / (self.n_splits + 1);
        let first_test = n_samples - self.n_splits * test_size;

        let folds = (0..self.n_splits)
            .map(|k| {
                let start = first_test + k * test_size;
                Fold {
                    train: 0..start,
                    test: start..start + test_size,
                }
            })
            .collect();

        Some(folds)
    }
}

pub fn mean_absolute_error(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 only when
/// predicted exactly, otherwise 0.0.
pub fn r2_score(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.sum() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_folds_are_contiguous_and_ordered() {
        let folds = TimeSeriesSplit::new(5).folds(100).unwrap();
        assert_eq!(folds.len(), 5);

        // test_size = 100 / 6 = 16, first test block starts at 100 - 80 = 20
        assert_eq!(folds[0], Fold { train: 0..20, test: 20..36 });
        assert_eq!(folds[4], Fold { train: 0..84, test: 84..100 });

        for pair in folds.windows(2) {
            assert_eq!(pair[0].test.end, pair[1].test.start);
            assert!(pair[0].train.end < pair[1].train.end);
        }
        for fold in &folds {
            assert_eq!(fold.train.end, fold.test.start);
        }
    }

    #[test]
    fn test_too_few_rows() {
        let split = TimeSeriesSplit::new(5);
        assert!(split.folds(5).is_none());
        let folds = split.folds(6).unwrap();
        assert_eq!(folds[0], Fold { train: 0..1, test: 1..2 });
    }

    #[test]
    fn test_metrics() {
        let actual = array![1.0, 2.0, 3.0, 4.0];
        let predicted = array![1.5, 2.0, 2.5, 4.0];
        assert!((mean_absolute_error(actual.view(), predicted.view()) - 0.25).abs() < 1e-12);
        // ss_res = 0.5, ss_tot = 5.0
        assert!((r2_score(actual.view(), predicted.view()) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        let actual = array![2.0, 2.0, 2.0];
        assert_eq!(r2_score(actual.view(), actual.view()), 1.0);
        assert_eq!(r2_score(actual.view(), array![2.0, 2.0, 2.5].view()), 0.0);
    }
}
