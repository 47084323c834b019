use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hyperparameters of the random-forest regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HyperParameters {
    #[serde(rename = "n_estimators")]
    pub tree_count: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            tree_count: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Position in the feature-sorted index list where the right side starts.
    cut: usize,
    sse: f64,
}

/// CART regression tree using the squared-error criterion.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    /// Grows a tree on the rows named by `indices` (duplicates allowed for bootstrap samples).
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        indices: Vec<usize>,
        params: &HyperParameters,
        rng: &mut StdRng,
    ) -> Self {
        let root = build_node(x, y, indices, 0, params, rng);
        Self { root }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

fn build_node(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    indices: Vec<usize>,
    depth: usize,
    params: &HyperParameters,
    rng: &mut StdRng,
) -> TreeNode {
    let n = indices.len();
    let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
    let mean = if n > 0 { sum / n as f64 } else { 0.0 };
    let sse = (sum_sq - sum * sum / n.max(1) as f64).max(0.0);

    let depth_reached = params.max_depth.map(|d| depth >= d).unwrap_or(false);
    if depth_reached
        || n < params.min_samples_split
        || n < 2 * params.min_samples_leaf.max(1)
        || sse <= 1e-12 * n as f64
    {
        return TreeNode::Leaf { value: mean };
    }

    let mut features: Vec<usize> = (0..x.ncols()).collect();
    features.shuffle(rng);

    let mut best: Option<(SplitCandidate, Vec<usize>)> = None;
    for &feature in &features {
        let mut order = indices.clone();
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        if let Some(candidate) = best_split_on(x, y, &order, feature, sum, sum_sq, params.min_samples_leaf) {
            let better = best.as_ref().map(|(b, _)| candidate.sse < b.sse).unwrap_or(true);
            if better {
                best = Some((candidate, order));
            }
        }
    }

    match best {
        Some((split, mut order)) if split.sse < sse => {
            let right_indices = order.split_off(split.cut);
            let left = build_node(x, y, order, depth + 1, params, rng);
            let right = build_node(x, y, right_indices, depth + 1, params, rng);
            TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => TreeNode::Leaf { value: mean },
    }
}

/// Sweeps the sorted rows once, scoring every cut between distinct values.
fn best_split_on(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    order: &[usize],
    feature: usize,
    total_sum: f64,
    total_sq: f64,
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = order.len();
    let min_leaf = min_leaf.max(1);
    let mut left_sum = 0.0;
    let mut left_sq = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for pos in 0..n - 1 {
        let yi = y[order[pos]];
        left_sum += yi;
        left_sq += yi * yi;

        let n_left = pos + 1;
        let n_right = n - n_left;
        if n_left < min_leaf || n_right < min_leaf {
            continue;
        }

        let here = x[[order[pos], feature]];
        let next = x[[order[pos + 1], feature]];
        if next <= here {
            continue;
        }

        let right_sum = total_sum - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / n_left as f64)
            + (right_sq - right_sum * right_sum / n_right as f64);

        if best.map(|b| sse < b.sse).unwrap_or(true) {
            let mut threshold = here + (next - here) / 2.0;
            if threshold >= next {
                threshold = here;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                cut: n_left,
                sse,
            });
        }
    }

    best
}

/// Bagged ensemble of regression trees; prediction is the mean over trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fits `params.tree_count` trees in parallel. Tree `i` draws its bootstrap
    /// sample and feature order from `seed + i`, so results are reproducible.
    pub fn fit(
        params: HyperParameters,
        seed: u64,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Self {
        let n = x.nrows();
        let trees: Vec<RegressionTree> = if n == 0 {
            Vec::new()
        } else {
            (0..params.tree_count)
                .into_par_iter()
                .map(|i| {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                    let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                    RegressionTree::fit(x, y, sample, &params, &mut rng)
                })
                .collect()
        };

        Self { trees }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        total / self.trees.len() as f64
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.outer_iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
