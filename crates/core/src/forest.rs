//! Binary random forest over dense `f64` rows.
//!
//! Trees are grown on bootstrap samples with gini impurity, a random subset
//! of `sqrt(n_features)` candidate features per split and balanced class
//! weights. Leaves store the weighted fraction of positive samples, so the
//! forest probability is the mean leaf fraction across trees. Everything is
//! driven by one seed; the same input and seed always grow the same forest.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Nodes are stored flat; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(TreeNode::Leaf { proba }) => return *proba,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    at = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], at: usize) -> usize {
            match nodes.get(at) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub n_features: usize,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fits on rows `x` with labels `y` (0 or 1). An empty input yields a
    /// forest that always answers 0.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: ForestParams) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let mut forest = Self {
            params,
            n_features,
            trees: Vec::new(),
            feature_importances: vec![0.0; n_features],
        };
        if x.is_empty() || n_features == 0 {
            return forest;
        }

        let class_weight = balanced_class_weights(y);
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(forest.params.seed);
        let mut importances = vec![0.0; n_features];

        for _ in 0..forest.params.n_trees {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());
            let mut draws = vec![0usize; x.len()];
            for _ in 0..x.len() {
                draws[tree_rng.gen_range(0..x.len())] += 1;
            }
            let weights: Vec<f64> = draws
                .iter()
                .zip(y)
                .map(|(d, label)| *d as f64 * class_weight[usize::from(*label).min(1)])
                .collect();
            let samples: Vec<usize> = (0..x.len()).filter(|i| draws[*i] > 0).collect();

            let mut builder = TreeBuilder {
                x,
                y,
                weights: &weights,
                max_depth: forest.params.max_depth,
                max_features,
                rng: tree_rng,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
            };
            builder.grow(samples, 0);

            let total: f64 = builder.importances.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(&builder.importances) {
                    *acc += v / total;
                }
            }
            forest.trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        forest.feature_importances = importances;
        forest
    }

    /// Mean positive-class probability across trees.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Label with the larger probability; ties go to 0.
    pub fn predict(&self, row: &[f64]) -> (u8, f64) {
        let proba = self.predict_proba(row);
        (u8::from(proba > 0.5), proba)
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

/// `n / (n_classes * count_c)` over the classes present in `y`.
fn balanced_class_weights(y: &[u8]) -> [f64; 2] {
    let mut counts = [0usize; 2];
    for label in y {
        counts[usize::from(*label).min(1)] += 1;
    }
    let present = counts.iter().filter(|c| **c > 0).count().max(1) as f64;
    let n = y.len() as f64;
    counts.map(|c| if c > 0 { n / (present * c as f64) } else { 0.0 })
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    weights: &'a [f64],
    max_depth: usize,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let (neg, pos) = self.class_totals(&samples);
        let total = neg + pos;
        let proba = if total > 0.0 { pos / total } else { 0.0 };

        let id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { proba });
        if depth >= self.max_depth || samples.len() < 2 || neg == 0.0 || pos == 0.0 {
            return id;
        }
        let Some(split) = self.best_split(&samples, neg, pos) else {
            return id;
        };

        self.importances[split.feature] += split.decrease;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|s| self.x[*s][split.feature] <= split.threshold);
        let left = self.grow(left, depth + 1);
        let right = self.grow(right, depth + 1);
        self.nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn class_totals(&self, samples: &[usize]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(neg, pos), s| {
            if self.y[*s] == 0 {
                (neg + self.weights[*s], pos)
            } else {
                (neg, pos + self.weights[*s])
            }
        })
    }

    fn best_split(&mut self, samples: &[usize], neg: f64, pos: f64) -> Option<Split> {
        let n_features = self.x[samples[0]].len();
        let features = index::sample(&mut self.rng, n_features, self.max_features).into_vec();

        let total = neg + pos;
        let parent = total * gini(neg, pos);
        let mut best: Option<Split> = None;
        let mut order = samples.to_vec();

        for feature in features {
            order.sort_by(|a, b| self.x[*a][feature].total_cmp(&self.x[*b][feature]));
            let (mut left_neg, mut left_pos) = (0.0, 0.0);
            for pair in order.windows(2) {
                let (s, next) = (pair[0], pair[1]);
                if self.y[s] == 0 {
                    left_neg += self.weights[s];
                } else {
                    left_pos += self.weights[s];
                }
                let (value, next_value) = (self.x[s][feature], self.x[next][feature]);
                if value >= next_value {
                    continue;
                }
                let (right_neg, right_pos) = (neg - left_neg, pos - left_pos);
                let left_w = left_neg + left_pos;
                let right_w = right_neg + right_pos;
                let decrease = parent
                    - left_w * gini(left_neg, left_pos)
                    - right_w * gini(right_neg, right_pos);
                if decrease > 1e-12 && best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    best = Some(Split {
                        feature,
                        threshold: value + (next_value - value) / 2.0,
                        decrease,
                    });
                }
            }
        }
        best
    }
}

fn gini(neg: f64, pos: f64) -> f64 {
    let total = neg + pos;
    if total <= 0.0 {
        return 0.0;
    }
    let (p, q) = (neg / total, pos / total);
    1.0 - p * p - q * q
}

/// Per-class shuffled split. Each class contributes `round(count *
/// test_size)` rows to the test set, but always keeps at least one row for
/// training. Both index lists come back sorted.
pub fn stratified_split(y: &[u8], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = (0..y.len()).filter(|i| y[*i] == class).collect();
        if members.is_empty() {
            continue;
        }
        members.shuffle(&mut rng);
        let wanted = (members.len() as f64 * test_size).round() as usize;
        let n_test = wanted.min(members.len() - 1);
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 25,
            max_depth: 6,
            seed: 42,
        }
    }

    /// Two features; only the first separates the classes.
    fn separable(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let label = (i % 2) as u8;
            let signal = if label == 1 { 0.8 } else { 0.1 } + (i % 5) as f64 * 0.01;
            x.push(vec![signal, (i % 7) as f64 / 7.0]);
            y.push(label);
        }
        (x, y)
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = separable(40);
        let forest = RandomForest::fit(&x, &y, params());
        assert_eq!(forest.trees().len(), 25);
        assert!(forest.trees().iter().all(|t| t.depth() <= 6));
        assert_eq!(forest.predict(&[0.85, 0.3]).0, 1);
        assert_eq!(forest.predict(&[0.05, 0.3]).0, 0);
        let importances = forest.feature_importances();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable(30);
        assert_eq!(RandomForest::fit(&x, &y, params()), RandomForest::fit(&x, &y, params()));
    }

    #[test]
    fn single_class_predicts_that_class() {
        let x = vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]];
        let forest = RandomForest::fit(&x, &[1, 1, 1], params());
        assert_eq!(forest.predict(&[0.0, 0.0]), (1, 1.0));
    }

    #[test]
    fn empty_input_answers_zero() {
        let forest = RandomForest::fit(&[], &[], params());
        assert_eq!(forest.predict(&[1.0]), (0, 0.0));
    }

    #[test]
    fn balanced_weights_equalise_classes() {
        let w = balanced_class_weights(&[0, 0, 0, 1]);
        assert!((w[0] * 3.0 - w[1]).abs() < 1e-12);
        assert_eq!(balanced_class_weights(&[1, 1]), [0.0, 1.0]);
    }

    #[test]
    fn split_is_stratified_and_keeps_training_rows() {
        let y: Vec<u8> = (0..20).map(|i| u8::from(i < 5)).collect();
        let (train, test) = stratified_split(&y, 0.2, 42);
        assert_eq!(train.len() + test.len(), 20);
        assert_eq!(test.iter().filter(|i| y[**i] == 1).count(), 1);
        assert_eq!(test.iter().filter(|i| y[**i] == 0).count(), 3);

        let (train, test) = stratified_split(&[1], 0.2, 42);
        assert_eq!((train, test), (vec![0], vec![]));
        assert_eq!(stratified_split(&y, 0.2, 42), stratified_split(&y, 0.2, 42));
    }
}
