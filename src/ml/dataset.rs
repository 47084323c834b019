use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Feature matrix plus aligned regression targets, rows in time order.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    targets: Array1<f64>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, targets: Array1<f64>) -> Self {
        debug_assert_eq!(features.nrows(), targets.len());
        Self { features, targets }
    }

    pub fn from_rows(rows: &[(Vec<f64>, f64)], n_features: usize) -> Self {
        let mut features = Array2::<f64>::zeros((rows.len(), n_features));
        let mut targets = Array1::<f64>::zeros(rows.len());

        for (i, (values, target)) in rows.iter().enumerate() {
            for (j, &value) in values.iter().enumerate().take(n_features) {
                features[[i, j]] = value;
            }
            targets[i] = *target;
        }

        Self::new(features, targets)
    }

    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn targets(&self) -> ArrayView1<'_, f64> {
        self.targets.view()
    }

    /// Contiguous block of rows `[start, end)`.
    pub fn rows(&self, start: usize, end: usize) -> (ArrayView2<'_, f64>, ArrayView1<'_, f64>) {
        (
            self.features.slice(s![start..end, ..]),
            self.targets.slice(s![start..end]),
        )
    }
}
